//! Startup check that the schema the bilingual models rely on is in place

use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, warn};

/// Tables and the per-language columns each must carry
pub const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[
    (
        "posts",
        &["title_en", "title_es", "content_en", "content_es", "slug_en", "slug_es"],
    ),
    (
        "products",
        &[
            "title_en",
            "title_es",
            "description_en",
            "description_es",
            "slug_en",
            "slug_es",
            "price",
            "final_price",
            "is_on_sale",
            "discount_percentage",
            "digital_files",
        ],
    ),
];

#[derive(Debug, Error)]
pub enum DatabaseValidationError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("database not initialized")]
    NotInitialized,
    #[error("schema incomplete: {0}")]
    SchemaIncomplete(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub migrations_applied: usize,
    pub latest_migration: Option<String>,
    /// `table` or `table.column` entries absent from the database
    pub missing: Vec<String>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.missing.is_empty()
    }

    pub fn summary(&self) -> String {
        if self.is_ok() {
            format!("Database OK - {} migrations applied", self.migrations_applied)
        } else {
            format!("Database schema is missing: {}", self.missing.join(", "))
        }
    }
}

pub struct DatabaseValidator {
    pool: SqlitePool,
}

impl DatabaseValidator {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inspect migrations and required columns without failing on gaps
    pub async fn inspect(&self) -> Result<ValidationReport, DatabaseValidationError> {
        let initialized = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations'",
        )
        .fetch_one(&self.pool)
        .await?
            > 0;
        if !initialized {
            warn!("No migrations table found");
            return Err(DatabaseValidationError::NotInitialized);
        }

        let migrations_applied =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
                .fetch_one(&self.pool)
                .await? as usize;
        let latest_migration = sqlx::query_scalar::<_, String>(
            "SELECT description FROM _sqlx_migrations WHERE success = 1 ORDER BY version DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        let mut missing = Vec::new();
        for (table, columns) in REQUIRED_SCHEMA {
            let present = sqlx::query_scalar::<_, String>("SELECT name FROM pragma_table_info(?)")
                .bind(*table)
                .fetch_all(&self.pool)
                .await?;
            if present.is_empty() {
                missing.push(table.to_string());
                continue;
            }
            missing.extend(
                columns
                    .iter()
                    .filter(|c| !present.iter().any(|p| p == *c))
                    .map(|c| format!("{table}.{c}")),
            );
        }

        Ok(ValidationReport {
            migrations_applied,
            latest_migration,
            missing,
        })
    }

    /// Fail unless every required table and column exists
    pub async fn validate(&self) -> Result<ValidationReport, DatabaseValidationError> {
        let report = self.inspect().await?;
        if !report.is_ok() {
            warn!(missing = ?report.missing, "Database schema validation failed");
            return Err(DatabaseValidationError::SchemaIncomplete(report.missing.join(", ")));
        }
        info!(
            migrations_applied = report.migrations_applied,
            latest_migration = ?report.latest_migration,
            "Database validation complete"
        );
        Ok(report)
    }
}
