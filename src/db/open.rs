use std::path::Path;

use log::info;
use rusqlite::Connection;

use crate::error::Result;

/// Submission ledger backed by a SQLite database
///
/// Everything written through a ledger sits inside a `dry_run` save point until [`Ledger::finish`]
/// releases it, or rolls it back for a dry run.
pub struct Ledger {
    pub(crate) conn: Connection,
    dry_run: bool,
}

impl Ledger {
    pub fn open(path: &Path, dry_run: bool) -> Result<Ledger> {
        if !path.exists() { info!("Creating new ledger database {}", path.display()) }
        let conn = Connection::open(path)?;
        Ledger::init(conn, dry_run)
    }

    /// Ledger that only lives as long as the process
    pub fn in_memory() -> Result<Ledger> {
        Ledger::init(Connection::open_in_memory()?, false)
    }

    fn init(conn: Connection, dry_run: bool) -> Result<Ledger> {
        static SCHEMA: &str =
            include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/db/schema.sql"));
        conn.execute(SCHEMA, [])?;

        info!("Creating dry run save point");
        conn.execute("SAVEPOINT dry_run", [])?;

        Ok(Ledger { conn, dry_run })
    }

    /// Keep what was recorded, or throw it away if this was a dry run
    pub fn finish(self) -> Result<()> {
        match self.dry_run {
            true => {
                info!("--dry-run set, rolling back ledger state");
                self.conn.execute("ROLLBACK TO dry_run", [])?;
                self.conn.execute("RELEASE dry_run", [])?;
            }
            false => {
                info!("--dry-run not set, releasing dry run save point");
                self.conn.execute("RELEASE dry_run", [])?;
            }
        }
        Ok(())
    }
}
