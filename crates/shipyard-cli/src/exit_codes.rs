//! Exit codes of the `shipyard` binary

/// Configuration error - missing or inconsistent inputs
pub const CONFIG_ERROR: i32 = 2;

/// Template error - a value file failed to render
pub const TEMPLATE_ERROR: i32 = 3;

/// Authentication error - credentials could not be activated
pub const AUTH_ERROR: i32 = 4;

/// Release error - a fatal package-manager step failed
pub const RELEASE_ERROR: i32 = 5;

/// IO error - generated files could not be written
pub const IO_ERROR: i32 = 6;
