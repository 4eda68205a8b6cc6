//! Bulk structural migration of stored flow versions.
//!
//! Reads every flow version from a directory, rewrites legacy branches as
//! routers and writes back the ones that changed.

pub mod config;
pub mod file_source;

pub use config::MigrateConfig;
pub use file_source::FileFlowVersionSource;

use piecework_flow::{BranchToRouter, MigrationError, MigrationReport, MigrationRunner};
use rootcause::prelude::Report;

/// Runs the branch-to-router migration described by `config`.
///
/// # Errors
///
/// Returns an error if the flow version directory cannot be read. Failures
/// of individual flow versions are listed in the report instead.
pub async fn run(config: &MigrateConfig) -> Result<MigrationReport, Report<MigrationError>> {
    let source = FileFlowVersionSource::new(&config.flow_versions_dir)?;
    MigrationRunner::new(BranchToRouter, source, config.runner_options())
        .run()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use piecework_core::{FlowId, FlowVersionId};
    use piecework_flow::{
        BranchCondition, BranchOperator, BranchSettings, FlowVersion, Step, StepKind,
    };
    use tempfile::TempDir;

    fn legacy_flow() -> FlowVersion {
        let branch = Step::new(
            "step_1",
            "Check total",
            StepKind::Branch {
                settings: BranchSettings {
                    conditions: vec![vec![BranchCondition::binary(
                        "{{trigger.total}}",
                        BranchOperator::NumberIsGreaterThan,
                        "100",
                    )]],
                },
                on_success_action: None,
                on_failure_action: None,
            },
        );
        FlowVersion::new(
            FlowId::new(),
            "Legacy",
            Step::new("trigger", "Trigger", StepKind::Empty).with_next(branch),
        )
    }

    fn config(dir: &TempDir, dry_run: bool) -> MigrateConfig {
        MigrateConfig {
            flow_versions_dir: dir.path().to_path_buf(),
            batch_size: 2,
            progress_every: 1,
            dry_run,
        }
    }

    async fn write(dir: &TempDir, version: &FlowVersion) -> std::path::PathBuf {
        let path = dir.path().join(format!("{}.json", version.id));
        tokio::fs::write(&path, serde_json::to_vec(version).expect("serialize"))
            .await
            .expect("write");
        path
    }

    #[tokio::test]
    async fn migrates_directory_in_place() {
        let dir = TempDir::new().expect("temp dir");
        let legacy = legacy_flow();
        let path = write(&dir, &legacy).await;
        let broken = FlowVersionId::new();
        tokio::fs::write(dir.path().join(format!("{broken}.json")), b"[]")
            .await
            .expect("write");

        let report = run(&config(&dir, false)).await.expect("run");
        assert_eq!(report.scanned, 2);
        assert_eq!(report.migrated, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].flow_version_id, broken);

        let migrated: FlowVersion =
            serde_json::from_slice(&tokio::fs::read(&path).await.expect("read")).expect("decode");
        let step = migrated.get_step("step_1").expect("step_1");
        assert!(matches!(step.kind, StepKind::Router { .. }));

        let again = run(&config(&dir, false)).await.expect("second run");
        assert_eq!(again.migrated, 0);
        assert_eq!(again.unchanged, 1);
    }

    #[tokio::test]
    async fn dry_run_leaves_files_untouched() {
        let dir = TempDir::new().expect("temp dir");
        let path = write(&dir, &legacy_flow()).await;
        let before = tokio::fs::read(&path).await.expect("read");

        let report = run(&config(&dir, true)).await.expect("run");
        assert_eq!(report.migrated, 1);
        assert_eq!(tokio::fs::read(&path).await.expect("read"), before);
    }

    #[tokio::test]
    async fn unreadable_file_is_a_per_item_failure() {
        let dir = TempDir::new().expect("temp dir");
        let legacy = legacy_flow();
        let path = write(&dir, &legacy).await;
        let blocked = FlowVersionId::new();
        tokio::fs::create_dir(dir.path().join(format!("{blocked}.json")))
            .await
            .expect("mkdir");

        let report = run(&config(&dir, false)).await.expect("run");
        assert_eq!(report.scanned, 2);
        assert_eq!(report.migrated, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].flow_version_id, blocked);

        let migrated: FlowVersion =
            serde_json::from_slice(&tokio::fs::read(&path).await.expect("read")).expect("decode");
        let step = migrated.get_step("step_1").expect("step_1");
        assert!(matches!(step.kind, StepKind::Router { .. }));
    }

    #[tokio::test]
    async fn file_named_for_another_flow_version_is_left_alone() {
        let dir = TempDir::new().expect("temp dir");
        let legacy = legacy_flow();
        let stored_as = FlowVersionId::new();
        let path = dir.path().join(format!("{stored_as}.json"));
        tokio::fs::write(&path, serde_json::to_vec(&legacy).expect("serialize"))
            .await
            .expect("write");

        let report = run(&config(&dir, false)).await.expect("run");
        assert_eq!(report.migrated, 0);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].flow_version_id, stored_as);

        assert!(!dir.path().join(format!("{}.json", legacy.id)).exists());
        let untouched: FlowVersion =
            serde_json::from_slice(&tokio::fs::read(&path).await.expect("read")).expect("decode");
        let step = untouched.get_step("step_1").expect("step_1");
        assert!(matches!(step.kind, StepKind::Branch { .. }));
    }
}
