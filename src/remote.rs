//! Remote execution of the rescore pipeline over SSH

/// Decide how to authenticate against the workflow host
pub mod credentials;
/// SSH sessions used to upload files and run commands
pub mod session;
/// Start the rescore pipeline on an open session
pub mod rescore;
