//! Directory-backed flow version source.
//!
//! Layout:
//! ```text
//! {dir}/{flow_version_id}.json
//! ```
//!
//! Files whose stem is not a flow version id are ignored. The directory is
//! listed once, on the first page, and pages are served in id order from
//! that listing, so paging is stable while files are rewritten in place.
//! A listed file that cannot be read or parsed is handed to the runner as
//! an unreadable entry and fails on its own.

use async_trait::async_trait;
use piecework_core::FlowVersionId;
use piecework_flow::{FlowVersion, FlowVersionSource, MigrationError, StoredFlowVersion};
use rootcause::prelude::Report;
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};
use tokio::sync::OnceCell;
use tracing::debug;

/// Flow versions stored as one JSON file each.
#[derive(Debug)]
pub struct FileFlowVersionSource {
    dir: PathBuf,
    ids: OnceCell<Vec<FlowVersionId>>,
}

impl FileFlowVersionSource {
    /// Opens the source rooted at `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError::SourceUnavailable`] if `dir` is not a
    /// directory.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, Report<MigrationError>> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(MigrationError::SourceUnavailable {
                reason: format!("{} is not a directory", dir.display()),
            }
            .into());
        }
        Ok(Self {
            dir,
            ids: OnceCell::new(),
        })
    }

    fn path_for(&self, id: FlowVersionId) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    async fn list_ids(&self) -> Result<Vec<FlowVersionId>, Report<MigrationError>> {
        let unavailable = |e: std::io::Error| MigrationError::SourceUnavailable {
            reason: format!("failed to list {}: {e}", self.dir.display()),
        };
        let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(unavailable)?;
        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(unavailable)? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match path.file_stem().and_then(|s| s.to_str()).map(str::parse) {
                Some(Ok(id)) => ids.push(id),
                _ => debug!(path = %path.display(), "skipping file without a flow version id"),
            }
        }
        ids.sort();
        debug!(dir = %self.dir.display(), count = ids.len(), "listed flow versions");
        Ok(ids)
    }

    async fn load(&self, id: FlowVersionId) -> StoredFlowVersion {
        let path = self.path_for(id);
        let contents = match tokio::fs::read(&path).await {
            Ok(data) => {
                serde_json::from_slice::<JsonValue>(&data).map_err(|e| MigrationError::Deserialize {
                    reason: format!("{} is not valid JSON: {e}", path.display()),
                })
            }
            Err(e) => Err(MigrationError::SourceUnavailable {
                reason: format!("failed to read {}: {e}", path.display()),
            }),
        };
        StoredFlowVersion { id, contents }
    }
}

/// Atomic write: write a temp file, then rename it over the target.
async fn atomic_write(path: &Path, data: &[u8]) -> Result<(), MigrationError> {
    let temp_path = path.with_extension("json.tmp");
    tokio::fs::write(&temp_path, data)
        .await
        .map_err(|e| MigrationError::Persist {
            reason: format!("failed to write temp file: {e}"),
        })?;
    tokio::fs::rename(&temp_path, path)
        .await
        .map_err(|e| MigrationError::Persist {
            reason: format!("failed to rename temp file: {e}"),
        })
}

#[async_trait]
impl FlowVersionSource for FileFlowVersionSource {
    async fn fetch_page(
        &self,
        after: Option<FlowVersionId>,
        limit: usize,
    ) -> Result<Vec<StoredFlowVersion>, Report<MigrationError>> {
        let ids = self.ids.get_or_try_init(|| self.list_ids()).await?;
        let start = after.map_or(0, |after| ids.partition_point(|id| *id <= after));
        let mut page = Vec::with_capacity(limit.min(ids.len() - start));
        for &id in ids[start..].iter().take(limit) {
            page.push(self.load(id).await);
        }
        Ok(page)
    }

    async fn save(&self, version: &FlowVersion) -> Result<(), Report<MigrationError>> {
        let data = serde_json::to_vec_pretty(version).map_err(|e| MigrationError::Persist {
            reason: format!("failed to serialize flow version: {e}"),
        })?;
        atomic_write(&self.path_for(version.id), &data).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use piecework_core::FlowId;
    use piecework_flow::{Step, StepKind};
    use tempfile::TempDir;

    fn version() -> FlowVersion {
        FlowVersion::new(FlowId::new(), "Test", Step::new("trigger", "Trigger", StepKind::Empty))
    }

    async fn write(dir: &Path, version: &FlowVersion) {
        let path = dir.join(format!("{}.json", version.id));
        let data = serde_json::to_vec(version).expect("serialize");
        tokio::fs::write(path, data).await.expect("write");
    }

    #[tokio::test]
    async fn pages_in_id_order() {
        let dir = TempDir::new().expect("temp dir");
        let mut versions: Vec<_> = (0..5).map(|_| version()).collect();
        for v in &versions {
            write(dir.path(), v).await;
        }
        tokio::fs::write(dir.path().join("README.md"), b"notes")
            .await
            .expect("write");
        tokio::fs::write(dir.path().join("not-an-id.json"), b"{}")
            .await
            .expect("write");
        versions.sort_by_key(|v| v.id);

        let source = FileFlowVersionSource::new(dir.path()).expect("open");
        let first = source.fetch_page(None, 3).await.expect("page 1");
        let ids: Vec<_> = first.iter().map(|s| s.id).collect();
        assert_eq!(ids, versions[..3].iter().map(|v| v.id).collect::<Vec<_>>());

        let second = source.fetch_page(Some(ids[2]), 3).await.expect("page 2");
        assert_eq!(second.len(), 2);
        assert_eq!(second[1].id, versions[4].id);

        let third = source.fetch_page(Some(versions[4].id), 3).await.expect("page 3");
        assert!(third.is_empty());
    }

    #[tokio::test]
    async fn save_replaces_file_atomically() {
        let dir = TempDir::new().expect("temp dir");
        let mut v = version();
        write(dir.path(), &v).await;

        let source = FileFlowVersionSource::new(dir.path()).expect("open");
        v.display_name = "Renamed".to_string();
        source.save(&v).await.expect("save");

        let page = source.fetch_page(None, 10).await.expect("page");
        assert_eq!(page.len(), 1);
        let raw = page[0].contents.clone().expect("readable");
        let stored: FlowVersion = serde_json::from_value(raw).expect("decode");
        assert_eq!(stored.display_name, "Renamed");
        assert!(!dir.path().join(format!("{}.json.tmp", v.id)).exists());
    }

    #[tokio::test]
    async fn invalid_json_is_an_unreadable_entry() {
        let dir = TempDir::new().expect("temp dir");
        let id = FlowVersionId::new();
        tokio::fs::write(dir.path().join(format!("{id}.json")), b"{not json")
            .await
            .expect("write");

        let source = FileFlowVersionSource::new(dir.path()).expect("open");
        let page = source.fetch_page(None, 10).await.expect("page");
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, id);
        assert!(matches!(
            page[0].contents,
            Err(MigrationError::Deserialize { .. })
        ));
    }

    #[tokio::test]
    async fn unreadable_file_does_not_fail_the_page() {
        let dir = TempDir::new().expect("temp dir");
        let good = version();
        write(dir.path(), &good).await;
        let blocked = FlowVersionId::new();
        tokio::fs::create_dir(dir.path().join(format!("{blocked}.json")))
            .await
            .expect("mkdir");

        let source = FileFlowVersionSource::new(dir.path()).expect("open");
        let page = source.fetch_page(None, 10).await.expect("page");

        assert_eq!(page.len(), 2);
        let blocked_entry = page.iter().find(|s| s.id == blocked).expect("listed");
        assert!(matches!(
            blocked_entry.contents,
            Err(MigrationError::SourceUnavailable { .. })
        ));
        let good_entry = page.iter().find(|s| s.id == good.id).expect("listed");
        assert!(good_entry.contents.is_ok());
    }

    #[tokio::test]
    async fn directory_is_listed_once() {
        let dir = TempDir::new().expect("temp dir");
        let first = version();
        write(dir.path(), &first).await;

        let source = FileFlowVersionSource::new(dir.path()).expect("open");
        let page = source.fetch_page(None, 10).await.expect("page");
        assert_eq!(page.len(), 1);

        write(dir.path(), &version()).await;
        let page = source.fetch_page(Some(first.id), 10).await.expect("page");
        assert!(page.is_empty());
    }

    #[test]
    fn missing_directory_is_rejected() {
        let dir = TempDir::new().expect("temp dir");
        let report = FileFlowVersionSource::new(dir.path().join("missing")).unwrap_err();
        assert!(matches!(
            report.current_context(),
            MigrationError::SourceUnavailable { .. }
        ));
    }
}
