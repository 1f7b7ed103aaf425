//! Optional SQLite ledger of every job handed to SLURM

/// Connect to (or create) a ledger database
pub mod open;
/// Record submissions and read them back
pub mod record;
