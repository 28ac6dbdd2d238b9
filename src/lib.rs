//! Rebuild a pedigree for a subset of a case's samples and relaunch the rescore pipeline

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod pedigree;
pub mod reanalysis;
pub mod remote;
pub mod rundata;
