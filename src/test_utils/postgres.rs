use postgresql_embedded::PostgreSQL;

use super::SHARED_RUNTIME;
use crate::connection::{ConnectionCredentials, DbConnection};

/// A running embedded `PostgreSQL` instance.
pub struct EmbeddedPostgres {
    pub postgresql: PostgreSQL,
    pub port: u16,
    /// Key/value connection string for the test database
    pub connection_string: String,
}

impl EmbeddedPostgres {
    /// Credentials for [`crate::run_on_credentials`] and friends.
    #[must_use]
    pub fn credentials(&self) -> ConnectionCredentials {
        ConnectionCredentials::new("postgres", self.connection_string.clone())
    }
}

/// Start an embedded `PostgreSQL` server and create `db_name` on it.
///
/// # Errors
/// Returns an error if the server cannot be set up or started, the database cannot
/// be created, or the post-start connectivity check fails.
pub fn setup_postgres_embedded(
    db_name: &str,
) -> Result<EmbeddedPostgres, Box<dyn std::error::Error>> {
    SHARED_RUNTIME.block_on(async {
        let mut postgresql = PostgreSQL::default();
        postgresql.setup().await?;
        postgresql.start().await?;
        postgresql.create_database(db_name).await?;

        let settings = postgresql.settings();
        let port = settings.port;
        let connection_string = format!(
            "host={} port={} user={} password={} dbname={db_name}",
            settings.host, port, settings.username, settings.password
        );

        let conn = DbConnection::open(&ConnectionCredentials::new(
            "postgres",
            connection_string.clone(),
        ))
        .await?;
        conn.execute_batch("SELECT 1").await?;
        conn.close().await?;
        tracing::info!(port, "embedded postgres ready");

        Ok(EmbeddedPostgres {
            postgresql,
            port,
            connection_string,
        })
    })
}

/// Stop a previously started embedded `PostgreSQL` instance.
pub fn stop_postgres_embedded(postgres: EmbeddedPostgres) {
    let EmbeddedPostgres { postgresql, .. } = postgres;
    SHARED_RUNTIME.block_on(async move {
        let _ = postgresql.stop().await;
    });
}
