//! Core domain types: file handles, snapshots, reports, and the error taxonomy.

pub mod errors;
pub mod language;
pub mod model;
