//! Run data tells the remote rescore pipeline which files to analyse

pub mod assay;
pub mod build;
