//! Shipyard Status - deployment status reporting
//!
//! Reports the lifecycle of a run (pending, success, failure, inactive) to the
//! deployment API of the source-control platform.
//!
//! Reporting is strictly observational:
//! - Without a token or a triggering deployment nothing is sent
//! - Failures to reach the API are logged as warnings and never propagate

pub mod error;
pub mod reporter;
pub mod state;

pub use error::{Result, StatusError};
pub use reporter::{DeploymentReporter, RecordingReporter, StatusReporter};
pub use state::{DeploymentState, RepoContext};
