//! Generated files
//!
//! The values file is always written before rendering; the kubeconfig only
//! when inline contents are supplied through the environment.

use std::path::{Path, PathBuf};

use crate::error::Result;

/// File name of the generated values file
pub const VALUES_FILE_NAME: &str = "values.yml";

/// File name of the inline kubeconfig
pub const KUBECONFIG_FILE_NAME: &str = "kubeconfig.yml";

/// Write the generated values file into `dir`
pub async fn write_values_file(dir: &Path, contents: &str) -> Result<PathBuf> {
    let path = dir.join(VALUES_FILE_NAME);
    tokio::fs::write(&path, contents).await?;
    Ok(path)
}

/// Write inline kubeconfig contents into `dir`
pub async fn write_kubeconfig(dir: &Path, contents: &str) -> Result<PathBuf> {
    let path = dir.join(KUBECONFIG_FILE_NAME);
    tokio::fs::write(&path, contents).await?;
    Ok(path)
}
