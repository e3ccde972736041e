//! Release naming

/// Track whose releases keep the bare application name
pub const STABLE_TRACK: &str = "stable";

/// Track that is deployed without public service and ingress
pub const CANARY_TRACK: &str = "canary";

/// Substring every expiring (TTL) release name must carry
pub const PREVIEW_MARKER: &str = "-pr-";

/// Chart reference that points at the chart bundled with the runner image
pub const BUNDLED_CHART_ALIAS: &str = "app";

/// Location of the bundled chart
pub const BUNDLED_CHART_PATH: &str = "/usr/src/charts/app";

/// Compute the release name for an application on a track
///
/// The stable track keeps the application name; every other track is
/// suffixed with `-<track>`.
pub fn identity(app_name: &str, track: &str) -> String {
    if track == STABLE_TRACK {
        app_name.to_string()
    } else {
        format!("{}-{}", app_name, track)
    }
}

/// Resolve a chart reference, expanding the bundled chart alias
pub fn chart_reference(chart: &str) -> String {
    if chart == BUNDLED_CHART_ALIAS {
        BUNDLED_CHART_PATH.to_string()
    } else {
        chart.to_string()
    }
}

/// Name of the canary release paired with an application
pub fn canary_release(app_name: &str) -> String {
    identity(app_name, CANARY_TRACK)
}
