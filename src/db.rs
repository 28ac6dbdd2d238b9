//! Case documents are read from a SQLite document table

/// Connect to a SQLite database
pub mod open;
/// Case document shape and lookup by case id
pub mod case;
/// Load case documents from JSON files
pub mod ingest;
