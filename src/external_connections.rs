use sqlx::PgConnection;

/// A handle which can lend out a live database connection
pub trait ConnectionHandle {
    fn borrow_connection(&mut self) -> &mut PgConnection;
}

/// Represents the set of external systems (currently just the database) that driven adapters
/// reach out to. Business logic only ever sees this trait, so tests can substitute a fake.
pub trait ExternalConnectivity: Sync {
    type DbHandle<'cxn_borrow>: ConnectionHandle + Send
    where
        Self: 'cxn_borrow;

    async fn database_cxn(&mut self) -> Result<Self::DbHandle<'_>, anyhow::Error>;
}
