//! PostgreSQL connection and identifier helpers

use regex::Regex;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::fmt;
use std::sync::LazyLock;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::constants::STAGING_SUFFIX;
use crate::{Error, Result};

static IDENTIFIER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
});

/// Open a connection pool for the configured database
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool> {
    let url = config.url.as_deref().filter(|url| !url.is_empty()).ok_or_else(|| {
        Error::configuration(
            "Database URL not set (use --database-url, DOF_DATABASE_URL or DATABASE_URL)",
        )
    })?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(url)
        .await
        .map_err(|e| Error::database("Failed to connect to database", e))?;

    info!("Connected to database (schema: {})", config.schema);
    Ok(pool)
}

/// Check an SQL identifier and return it double-quoted
pub fn quote_identifier(name: &str) -> Result<String> {
    if !IDENTIFIER_PATTERN.is_match(name) {
        return Err(Error::configuration(format!(
            "Invalid SQL identifier '{}'",
            name
        )));
    }
    Ok(format!("\"{}\"", name))
}

/// Schema-qualified table name with validated identifiers
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName {
    schema: String,
    name: String,
}

impl TableName {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Result<Self> {
        let table = Self {
            schema: schema.into(),
            name: name.into(),
        };
        quote_identifier(&table.schema)?;
        quote_identifier(&table.name)?;
        Ok(table)
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Disposable staging table scoped to a load into this table
    pub fn staging(&self) -> Self {
        Self {
            schema: self.schema.clone(),
            name: format!("{}{}", self.name, STAGING_SUFFIX),
        }
    }

    /// Quoted `"schema"."name"` form for SQL text
    pub fn qualified(&self) -> String {
        format!("\"{}\".\"{}\"", self.schema, self.name)
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}
