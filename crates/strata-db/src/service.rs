//! Service layer all repositories hang off.
//!
//! `StrataService` wraps `StrataDb`. Repository methods live in
//! `crate::repos::*` as `impl StrataService` blocks so callers only ever
//! hold one handle.

use crate::StrataDb;
use crate::error::DatabaseError;

pub struct StrataService {
    db: StrataDb,
}

impl StrataService {
    /// Open (and migrate) a local database.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn new_local(db_path: &str) -> Result<Self, DatabaseError> {
        let db = StrataDb::open_local(db_path).await?;
        Ok(Self { db })
    }

    /// Create from an existing `StrataDb`.
    #[must_use]
    pub const fn from_db(db: StrataDb) -> Self {
        Self { db }
    }

    /// Access the underlying database handle.
    #[must_use]
    pub const fn db(&self) -> &StrataDb {
        &self.db
    }
}
