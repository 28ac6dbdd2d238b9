//! Pedigree model and construction from case documents

/// A single member of a pedigree, with validated sex and phenotype codes
pub mod individual;
/// Ordered family container and pedigree file serialisation
pub mod family;
/// Derive a corrected pedigree from a case document and a sample subset
pub mod build;
