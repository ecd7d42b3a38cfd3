//! Core: constants, unit conversion and address validation (no I/O)

pub mod address;
pub mod paths;
pub mod units;
