use diesel::{Connection, PgConnection};

use super::error::DeskError;

/// Runs a closure as one unit of work: every write inside `f` is committed
/// together, or none is when `f` returns an error.
pub trait Transactional {
    fn in_transaction<T, F>(&mut self, f: F) -> Result<T, DeskError>
    where
        F: FnOnce(&mut Self) -> Result<T, DeskError>;
}

impl Transactional for PgConnection {
    fn in_transaction<T, F>(&mut self, f: F) -> Result<T, DeskError>
    where
        F: FnOnce(&mut Self) -> Result<T, DeskError>,
    {
        self.transaction(f)
    }
}
