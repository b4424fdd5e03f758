//! Sequential schema migrations, applied before any route is bound.
//!
//! Steps run strictly in order and each is recorded in
//! `_switchboard_migrations` so restarts skip already applied steps. All
//! pending steps apply in one transaction under an advisory lock, so
//! concurrent processes pointed at the same database cannot interleave.
//! Any failure aborts startup; the process must not serve against a
//! half-built schema.

use crate::error::AppError;
use sqlx::PgPool;

const TRACKING_TABLE_DDL: &str = "CREATE TABLE IF NOT EXISTS _switchboard_migrations (\n  name TEXT PRIMARY KEY,\n  applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()\n)";

/// Advisory lock key serializing migration runners on one database.
/// The bytes spell "switchbd".
const MIGRATION_LOCK_KEY: i64 = 0x7377_6974_6368_6264;

/// One named schema change.
pub struct Migration {
    pub name: &'static str,
    pub sql: &'static str,
}

/// Built-in schema: the relay switch table and the encrypted credential store.
pub const BUILTIN_MIGRATIONS: &[Migration] = &[
    Migration {
        name: "create_relay_switches",
        sql: "CREATE TABLE IF NOT EXISTS relay_switches (\n  id BIGSERIAL PRIMARY KEY,\n  name TEXT NOT NULL,\n  target_type TEXT NOT NULL,\n  target_id TEXT NOT NULL,\n  icon TEXT,\n  enabled BOOLEAN NOT NULL DEFAULT false\n)",
    },
    Migration {
        name: "create_credentials",
        sql: "CREATE TABLE IF NOT EXISTS credentials (\n  id BIGSERIAL PRIMARY KEY,\n  name TEXT NOT NULL,\n  payload TEXT NOT NULL\n)",
    },
];

/// Apply all pending migrations in one transaction. The transaction-scoped
/// advisory lock serializes runners, so the applied check, the DDL, and the
/// tracking rows commit atomically or not at all.
pub async fn apply_migrations(pool: &PgPool, migrations: &[Migration]) -> Result<(), AppError> {
    let step = |name: &str| {
        let step = name.to_string();
        move |e: sqlx::Error| AppError::Migration {
            step: step.clone(),
            source: e,
        }
    };

    let mut tx = pool.begin().await.map_err(step("begin"))?;
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(MIGRATION_LOCK_KEY)
        .execute(&mut *tx)
        .await
        .map_err(step("lock"))?;
    sqlx::query(TRACKING_TABLE_DDL)
        .execute(&mut *tx)
        .await
        .map_err(step("tracking_table"))?;

    for m in migrations {
        let applied: Option<(String,)> =
            sqlx::query_as("SELECT name FROM _switchboard_migrations WHERE name = $1")
                .bind(m.name)
                .fetch_optional(&mut *tx)
                .await
                .map_err(step(m.name))?;
        if applied.is_some() {
            tracing::debug!(step = m.name, "migration already applied");
            continue;
        }

        sqlx::query(m.sql)
            .execute(&mut *tx)
            .await
            .map_err(step(m.name))?;
        sqlx::query("INSERT INTO _switchboard_migrations (name) VALUES ($1)")
            .bind(m.name)
            .execute(&mut *tx)
            .await
            .map_err(step(m.name))?;
        tracing::info!(step = m.name, "migration applied");
    }
    tx.commit().await.map_err(step("commit"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn builtin_step_names_are_unique_and_nonempty() {
        let mut names = HashSet::new();
        for m in BUILTIN_MIGRATIONS {
            assert!(!m.sql.trim().is_empty());
            assert!(names.insert(m.name), "duplicate step {}", m.name);
        }
    }

    #[test]
    fn builtin_schema_matches_registered_tables() {
        let sql: Vec<&str> = BUILTIN_MIGRATIONS.iter().map(|m| m.sql).collect();
        assert!(sql[0].contains("relay_switches"));
        assert!(sql[0].contains("enabled BOOLEAN NOT NULL DEFAULT false"));
        assert!(sql[1].contains("credentials"));
        assert!(sql[1].contains("payload TEXT NOT NULL"));
    }
}
