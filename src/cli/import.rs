use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::batch::{read_batch_file, RawBatch};
use crate::database_ops::db::Db;
use crate::database_ops::loaders::LoadOptions;
use crate::database_ops::memory_store::InMemoryCatalogStore;
use crate::database_ops::pg_store::PgCatalogStore;
use crate::database_ops::report::LoadResult;
use crate::orchestrator::{BatchOrchestrator, ImportMode};
use crate::util::env as env_util;

/// Exit status when `--strict` is set and at least one entry failed.
pub const EXIT_ENTRY_ERRORS: i32 = 2;

#[derive(Debug, Clone, Default)]
pub struct ImportConfig {
    pub file: PathBuf,
    /// Preview only; nothing is written.
    pub dry_run: bool,
    /// List every entry outcome and error in the summary.
    pub verbose: bool,
    /// Existing records are skipped instead of updated.
    pub no_upsert: bool,
    /// Per-entry errors turn into a failing exit status.
    pub strict: bool,
    /// Run against a throwaway in-memory store instead of Postgres.
    pub offline: bool,
    /// Optional override for the Postgres connection string.
    pub database_url: Option<String>,
    /// Optional override for max pool connections.
    pub max_connections: Option<u32>,
}

impl ImportConfig {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            dry_run: self.dry_run,
            upsert: !self.no_upsert,
        }
    }
}

/// Validates the batch file, then runs it through the loaders for `mode`.
///
/// The file is read and checked before any connection is opened. The pool is closed
/// before returning, whatever the outcome of the run.
pub async fn run(mode: ImportMode, cfg: &ImportConfig) -> Result<LoadResult> {
    env_util::init_env();
    let batch = read_batch_file(&cfg.file)
        .with_context(|| format!("loading batch {}", cfg.file.display()))?;
    info!(
        %mode,
        file = %cfg.file.display(),
        bikes = batch.bikes().len(),
        parts = batch.parts().len(),
        "batch validated"
    );

    let result = if cfg.offline {
        warn!("offline run: results are kept in memory only");
        let store = InMemoryCatalogStore::new();
        run_with_store(&BatchOrchestrator::new(&store, cfg.load_options()), mode, &batch).await
    } else {
        let database_url = match cfg.database_url.clone() {
            Some(url) => url,
            None => env_util::db_url()?,
        };
        let max_connections = cfg
            .max_connections
            .unwrap_or_else(|| env_util::env_parse("DB_MAX_CONNECTIONS", 5u32));
        env_util::preflight_check(
            "velo-import",
            &[],
            &["VELO_DATABASE_URL", "DATABASE_URL", "DB_HOST", "DB_MAX_CONNECTIONS", "AUTO_MIGRATE"],
        )?;

        let db = Db::connect(&database_url, max_connections).await?;
        let store = PgCatalogStore::new(db.clone());
        let result =
            run_with_store(&BatchOrchestrator::new(&store, cfg.load_options()), mode, &batch).await;
        db.close().await;
        result
    }?;

    print!("{}", render_summary(mode, cfg, &result));
    Ok(result)
}

async fn run_with_store(
    orchestrator: &BatchOrchestrator<'_>,
    mode: ImportMode,
    batch: &RawBatch,
) -> Result<LoadResult> {
    orchestrator
        .run_batch(mode, batch)
        .await
        .with_context(|| format!("{mode} import"))
}

/// Checks the batch file without touching any store; prints what it contains.
pub fn validate(cfg: &ImportConfig) -> Result<RawBatch> {
    let batch = read_batch_file(&cfg.file)
        .with_context(|| format!("validating batch {}", cfg.file.display()))?;
    println!(
        "{}: valid batch with {} bike(s), {} component(s), {} part(s)",
        cfg.file.display(),
        batch.bikes().len(),
        batch.component_count(),
        batch.parts().len()
    );
    Ok(batch)
}

pub fn exit_code(result: &LoadResult, strict: bool) -> i32 {
    if strict && result.has_errors() {
        EXIT_ENTRY_ERRORS
    } else {
        0
    }
}

pub fn render_summary(mode: ImportMode, cfg: &ImportConfig, result: &LoadResult) -> String {
    let mut out = String::new();
    let tag = if cfg.dry_run { " (dry run)" } else { "" };
    let _ = writeln!(out, "{mode} import{tag}: {}", cfg.file.display());
    let _ = writeln!(
        out,
        "  created: {}  updated: {}  skipped: {}  errors: {}",
        result.created,
        result.updated,
        result.skipped,
        result.errors.len()
    );

    if cfg.verbose {
        for o in &result.outcomes {
            let _ = writeln!(out, "  [{}#{}] {:<8} {}", o.stage, o.index, o.action, o.label);
        }
    }
    if result.has_errors() {
        let _ = writeln!(out, "errors:");
        for e in &result.errors {
            let at = match e.component {
                Some(c) => format!("{}#{}.components[{c}]", e.stage, e.index),
                None => format!("{}#{}", e.stage, e.index),
            };
            let _ = writeln!(out, "  [{at}] {}: {}", e.kind, e.message);
            if cfg.verbose {
                let _ = writeln!(out, "      {}", e.entry);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database_ops::report::{LoadAction, LoadStage};
    use crate::errors::CatalogError;
    use serde_json::json;
    use std::io::Write;

    fn sample_result() -> LoadResult {
        let mut result = LoadResult::default();
        result.record(LoadStage::Parts, 0, "Shimano CN-M8100".into(), LoadAction::Created);
        result.record(LoadStage::Parts, 1, "SRAM XG-1275".into(), LoadAction::Skipped);
        result.record_error(
            LoadStage::Parts,
            2,
            None,
            json!({"brand": "Acme", "category": "qqqq"}),
            &CatalogError::Mapping {
                kind: "part",
                label: "qqqq".into(),
            },
        );
        result
    }

    #[test]
    fn summary_lists_counts_and_errors() {
        let cfg = ImportConfig {
            file: PathBuf::from("parts.json"),
            dry_run: true,
            ..Default::default()
        };
        let text = render_summary(ImportMode::Parts, &cfg, &sample_result());
        assert!(text.starts_with("parts import (dry run): parts.json"));
        assert!(text.contains("created: 1  updated: 0  skipped: 1  errors: 1"));
        assert!(text.contains("[parts#2] mapping: unmapped part category: \"qqqq\""));
        assert!(!text.contains("SRAM XG-1275"));
    }

    #[test]
    fn verbose_summary_shows_outcomes_and_raw_entries() {
        let cfg = ImportConfig {
            file: PathBuf::from("parts.json"),
            verbose: true,
            ..Default::default()
        };
        let text = render_summary(ImportMode::Parts, &cfg, &sample_result());
        assert!(text.contains("skipped  SRAM XG-1275"));
        assert!(text.contains("\"category\":\"qqqq\""));
    }

    #[test]
    fn strict_turns_entry_errors_into_a_failure() {
        let result = sample_result();
        assert_eq!(exit_code(&result, false), 0);
        assert_eq!(exit_code(&result, true), EXIT_ENTRY_ERRORS);
        assert_eq!(exit_code(&LoadResult::default(), true), 0);
    }

    #[tokio::test]
    async fn offline_run_reads_validates_and_loads() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write!(
            file,
            "{}",
            json!({"bikes": [{"brand": "Gazelle", "model": "Ultimate C8", "category": "Stadtrad"}]})
        )
        .expect("write");
        let cfg = ImportConfig {
            file: file.path().to_path_buf(),
            offline: true,
            ..Default::default()
        };
        let result = run(ImportMode::Bikes, &cfg).await.expect("run");
        assert_eq!(result.created, 1);

        assert!(validate(&cfg).is_ok());
        let missing = ImportConfig {
            file: file.path().with_extension("missing"),
            offline: true,
            ..Default::default()
        };
        assert!(run(ImportMode::Bikes, &missing).await.is_err());
    }
}
