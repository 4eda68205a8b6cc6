//! Bulk application of a migration over stored flow versions.
//!
//! The runner pages through a [`FlowVersionSource`] in id order. Each flow
//! version is decoded, migrated, validated and, if it changed, saved. A
//! failure on one flow version is recorded in the [`MigrationReport`] and
//! the run moves on; only a failure to load a page stops the run.

use crate::error::MigrationError;
use crate::migration::Migration;
use crate::validate::validate_tree;
use crate::version::FlowVersion;
use async_trait::async_trait;
use piecework_core::FlowVersionId;
use rootcause::markers::Cloneable;
use rootcause::prelude::{Report, ResultExt};
use serde_json::Value as JsonValue;
use tracing::{info, warn};

/// A flow version as stored, before decoding.
///
/// `contents` is an error when the entry exists but could not be read; the
/// runner records that as a failure of this flow version alone.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredFlowVersion {
    pub id: FlowVersionId,
    pub contents: Result<JsonValue, MigrationError>,
}

impl StoredFlowVersion {
    /// A readable entry.
    #[must_use]
    pub fn new(id: FlowVersionId, raw: JsonValue) -> Self {
        Self {
            id,
            contents: Ok(raw),
        }
    }

    /// An entry whose contents could not be loaded.
    #[must_use]
    pub fn unreadable(id: FlowVersionId, error: MigrationError) -> Self {
        Self {
            id,
            contents: Err(error),
        }
    }
}

/// Paged access to stored flow versions.
#[async_trait]
pub trait FlowVersionSource: Send + Sync {
    /// Returns up to `limit` flow versions with ids greater than `after`,
    /// in ascending id order.
    ///
    /// An entry that cannot be read is returned with
    /// [`StoredFlowVersion::unreadable`]. An error here means the page
    /// itself could not be listed and stops the run.
    async fn fetch_page(
        &self,
        after: Option<FlowVersionId>,
        limit: usize,
    ) -> Result<Vec<StoredFlowVersion>, Report<MigrationError>>;

    /// Persists a migrated flow version.
    async fn save(&self, version: &FlowVersion) -> Result<(), Report<MigrationError>>;
}

/// Knobs for a migration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerOptions {
    /// Flow versions fetched per page.
    pub batch_size: usize,
    /// Log progress every this many flow versions.
    pub progress_every: usize,
    /// Migrate and validate, but never save.
    pub dry_run: bool,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            batch_size: 100,
            progress_every: 1000,
            dry_run: false,
        }
    }
}

/// One flow version the runner could not migrate.
#[derive(Debug, Clone)]
pub struct MigrationFailure {
    pub flow_version_id: FlowVersionId,
    /// The step that caused the failure, when one is known.
    pub step_name: Option<String>,
    /// The innermost migration error, for display.
    pub reason: String,
    /// The full error, rooted at [`MigrationError::FlowVersion`].
    pub report: Report<MigrationError, Cloneable>,
}

impl MigrationFailure {
    fn new(flow_version_id: FlowVersionId, report: Report<MigrationError>) -> Self {
        let report = report.into_cloneable();
        let errors: Vec<&MigrationError> = report
            .iter_reports()
            .filter_map(|node| node.downcast_current_context::<MigrationError>())
            .collect();
        let step_name = errors
            .iter()
            .find_map(|error| error.step_name())
            .map(str::to_string);
        let reason = errors
            .last()
            .map_or_else(|| report.to_string(), ToString::to_string);
        Self {
            flow_version_id,
            step_name,
            reason,
            report,
        }
    }
}

/// Outcome of a migration run.
#[derive(Debug, Clone, Default)]
pub struct MigrationReport {
    pub scanned: usize,
    pub migrated: usize,
    pub unchanged: usize,
    pub failures: Vec<MigrationFailure>,
}

impl MigrationReport {
    /// Returns whether every flow version was processed without error.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Applies one migration across a source of flow versions.
pub struct MigrationRunner<M, S> {
    migration: M,
    source: S,
    options: RunnerOptions,
}

impl<M, S> MigrationRunner<M, S>
where
    M: Migration,
    S: FlowVersionSource,
{
    /// Creates a runner.
    pub fn new(migration: M, source: S, options: RunnerOptions) -> Self {
        Self {
            migration,
            source,
            options,
        }
    }

    /// Runs the migration over every stored flow version.
    ///
    /// # Errors
    ///
    /// Returns an error only if a page cannot be fetched. Per-item failures
    /// are collected in the report.
    pub async fn run(&self) -> Result<MigrationReport, Report<MigrationError>> {
        let mut report = MigrationReport::default();
        let mut after = None;
        let batch_size = self.options.batch_size.max(1);
        let progress_every = self.options.progress_every.max(1);

        info!(
            migration = self.migration.name(),
            batch_size,
            dry_run = self.options.dry_run,
            "starting migration"
        );

        loop {
            let page = self.source.fetch_page(after, batch_size).await?;
            let Some(last) = page.last() else {
                break;
            };
            after = Some(last.id);
            let page_len = page.len();

            for stored in page {
                let id = stored.id;
                report.scanned += 1;
                let outcome = self
                    .migrate_one(stored)
                    .await
                    .context(MigrationError::FlowVersion { flow_version_id: id });
                match outcome {
                    Ok(true) => report.migrated += 1,
                    Ok(false) => report.unchanged += 1,
                    Err(error) => {
                        let failure = MigrationFailure::new(id, error);
                        warn!(
                            flow_version_id = %id,
                            step = failure.step_name.as_deref().unwrap_or("-"),
                            reason = %failure.reason,
                            "flow version migration failed"
                        );
                        report.failures.push(failure);
                    }
                }
                if report.scanned % progress_every == 0 {
                    info!(
                        scanned = report.scanned,
                        migrated = report.migrated,
                        failed = report.failures.len(),
                        "migration progress"
                    );
                }
            }

            if page_len < batch_size {
                break;
            }
        }

        info!(
            migration = self.migration.name(),
            scanned = report.scanned,
            migrated = report.migrated,
            unchanged = report.unchanged,
            failed = report.failures.len(),
            "migration finished"
        );
        Ok(report)
    }

    async fn migrate_one(&self, stored: StoredFlowVersion) -> Result<bool, Report<MigrationError>> {
        let raw = stored.contents?;
        let mut version: FlowVersion =
            serde_json::from_value(raw).map_err(|e| MigrationError::Deserialize {
                reason: e.to_string(),
            })?;
        if version.id != stored.id {
            return Err(MigrationError::IdMismatch {
                stored_as: stored.id,
                found: version.id,
            }
            .into());
        }

        let changed = self.migration.up(&mut version)?;
        if !changed {
            return Ok(false);
        }
        validate_tree(&version.trigger).map_err(MigrationError::from)?;

        if !self.options.dry_run {
            self.source.save(&version).await?;
        }
        Ok(true)
    }
}
