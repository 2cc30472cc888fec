//! Schema setup and one-time seeding of the built-in templates.
//!
//! Runs on every start. Table creation uses `IF NOT EXISTS`, and columns
//! added after the first release are applied with `ALTER TABLE ... ADD
//! COLUMN`, whose "duplicate column" failure on an up-to-date database is
//! expected and ignored. Each statement is embedded at compile time via
//! `include_str!`.
//!
//! After the schema is in place the built-in templates are seeded, but only
//! when no system template exists yet, so re-running is a no-op.

use chrono::Utc;

use crate::db::{templates, DbError, StoreHandle};
use crate::templates::BUILTIN_TEMPLATES;

struct Migration {
    version: i32,
    sql: &'static str,
    /// Additive column change: failure is logged, never fatal.
    additive: bool,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        sql: include_str!("migrations/001_notes.sql"),
        additive: false,
    },
    Migration {
        version: 2,
        sql: include_str!("migrations/002_templates.sql"),
        additive: false,
    },
    Migration {
        version: 3,
        sql: include_str!("migrations/003_notes_template_id.sql"),
        additive: true,
    },
];

/// What a run of [`run_migrations`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Statements that executed without error.
    pub statements_executed: usize,
    /// Additive statements that failed and were skipped (normally because
    /// the column already exists).
    pub additive_skipped: usize,
    /// Built-in templates inserted by this run.
    pub templates_seeded: usize,
}

/// Ensure the schema exists, then seed built-in templates if none are present.
pub async fn run_migrations(store: &dyn StoreHandle) -> Result<MigrationReport, DbError> {
    let mut report = MigrationReport::default();

    for migration in MIGRATIONS {
        match store.execute(migration.sql, Vec::new()).await {
            Ok(_) => {
                report.statements_executed += 1;
            }
            Err(e) if migration.additive && e.is_duplicate_column() => {
                log::debug!("Migration v{}: column already present", migration.version);
                report.additive_skipped += 1;
            }
            Err(e) if migration.additive => {
                log::warn!("Migration v{} skipped: {}", migration.version, e);
                report.additive_skipped += 1;
            }
            Err(e) => {
                return Err(DbError::Migration(format!(
                    "Migration v{} failed: {}",
                    migration.version, e
                )));
            }
        }
    }

    report.templates_seeded = seed_system_templates(store).await?;
    Ok(report)
}

/// Insert every built-in template unless at least one system template exists.
///
/// Returns the number of templates inserted (0 on an already-seeded store).
pub async fn seed_system_templates(store: &dyn StoreHandle) -> Result<usize, DbError> {
    let rows = store.select(templates::COUNT_SYSTEM, Vec::new()).await?;
    let existing = match rows.first() {
        Some(row) => row.integer("n")?,
        None => 0,
    };
    if existing > 0 {
        return Ok(0);
    }

    // Creation times are staggered so the listing order matches definition order.
    let now = Utc::now().timestamp_millis();
    for (offset, builtin) in (0_i64..).zip(BUILTIN_TEMPLATES) {
        let template = builtin.to_template(now + offset);
        store
            .execute(templates::INSERT, templates::template_params(&template))
            .await
            .map_err(|e| {
                DbError::Migration(format!("Failed to seed template {}: {}", builtin.id, e))
            })?;
    }

    log::info!("Seeded {} built-in templates", BUILTIN_TEMPLATES.len());
    Ok(BUILTIN_TEMPLATES.len())
}
