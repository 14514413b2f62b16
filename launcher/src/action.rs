//! The export menu actions.
//!
//! Each action ensures the cached sidecar is valid and then starts it,
//! passing the selected tag table, if any. Any failure aborts the action
//! before the sidecar starts and is reported under the action's display name.

use log::info;

use crate::cache::ResourceCache;
use crate::error::{ActionError, LauncherError};
use crate::extraction::ArchiveExtractor;
use crate::layout::CacheLayout;
use crate::payload::EmbeddedPayload;
use crate::spawn::{LaunchRequest, LaunchedProcess, ProcessSpawner, launch};

/// Display name of the action exporting every tag table of a device.
pub const EXPORT_DEVICE_ACTION: &str = "Export To Excel";

/// Display name of the action exporting one selected tag table.
pub const EXPORT_TABLE_ACTION: &str = "Export Table To Excel";

/// What the sidecar should export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportTarget {
    /// Every non-default tag table of the device.
    Device,
    /// A single tag table, by name.
    Table(String),
}

impl ExportTarget {
    /// Build a target from an optional table name; blank names select the
    /// whole device.
    #[must_use]
    pub fn from_table(table: Option<String>) -> Self {
        match table.filter(|name| !name.trim().is_empty()) {
            Some(name) => Self::Table(name),
            None => Self::Device,
        }
    }

    /// Display name of the menu action that exports this target.
    #[must_use]
    pub const fn action_name(&self) -> &'static str {
        match self {
            Self::Device => EXPORT_DEVICE_ACTION,
            Self::Table(_) => EXPORT_TABLE_ACTION,
        }
    }

    /// The table name handed to the sidecar, if any.
    #[must_use]
    pub fn table(&self) -> Option<&str> {
        match self {
            Self::Device => None,
            Self::Table(name) => Some(name),
        }
    }
}

/// Collaborators used by an export action.
pub struct ActionContext<'a> {
    /// The payload compiled into the launcher.
    pub payload: EmbeddedPayload<'a>,
    /// Where the sidecar is cached.
    pub layout: &'a CacheLayout,
    /// Extracts the payload archive.
    pub extractor: &'a dyn ArchiveExtractor,
    /// Starts the sidecar process.
    pub spawner: &'a dyn ProcessSpawner,
}

/// Run the export action for `target`.
///
/// # Errors
///
/// Returns an [`ActionError`] naming the action when the cache cannot be
/// prepared or the sidecar cannot be started.
pub fn run_export(
    context: &ActionContext<'_>,
    target: &ExportTarget,
) -> Result<LaunchedProcess, ActionError> {
    let action = target.action_name();
    start_sidecar(context, target).map_err(|source| ActionError {
        action: action.to_owned(),
        source,
    })
}

fn start_sidecar(
    context: &ActionContext<'_>,
    target: &ExportTarget,
) -> Result<LaunchedProcess, LauncherError> {
    let executable = ResourceCache::new(context.extractor).ensure(&context.payload, context.layout)?;
    let request = LaunchRequest::new(executable)
        .with_optional_target(target.table().map(str::to_owned));
    let process = launch(context.spawner, &request)?;
    info!("{} started sidecar process {}", target.action_name(), process.id());
    Ok(process)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::extraction::ZipExtractor;
    use crate::layout::ProductIdentity;
    use crate::test_utils::{CountingExtractor, RecordingSpawner, payload_fixture};
    use camino::Utf8Path;
    use rstest::rstest;
    use std::io;

    fn layout_in(dir: &tempfile::TempDir) -> CacheLayout {
        let root = Utf8Path::from_path(dir.path()).expect("UTF-8 temp dir");
        CacheLayout::new(
            root,
            &ProductIdentity::from_metadata("Acme", "tagsheet"),
            "tagsheet-export.bin",
        )
    }

    #[rstest]
    #[case::device(None, ExportTarget::Device)]
    #[case::blank(Some("   "), ExportTarget::Device)]
    #[case::table(Some("TagsA"), ExportTarget::Table("TagsA".to_owned()))]
    fn target_from_optional_table(#[case] table: Option<&str>, #[case] expected: ExportTarget) {
        assert_eq!(ExportTarget::from_table(table.map(str::to_owned)), expected);
    }

    #[test]
    fn table_export_launches_with_the_table_name() {
        let dir = tempfile::tempdir().expect("temp dir");
        let layout = layout_in(&dir);
        let fixture = payload_fixture(layout.executable_name(), b"sidecar");
        let extractor = CountingExtractor::new(ZipExtractor);
        let spawner = RecordingSpawner::new();
        let context = ActionContext {
            payload: fixture.payload(),
            layout: &layout,
            extractor: &extractor,
            spawner: &spawner,
        };

        run_export(&context, &ExportTarget::Table("TagsA".to_owned())).expect("export");

        let requests = spawner.requests();
        assert_eq!(requests.len(), 1);
        let request = requests.first().expect("one request");
        assert_eq!(request.arguments(), vec!["TagsA"]);
        assert_eq!(request.executable(), layout.executable_path().as_std_path());
        assert_eq!(extractor.calls(), 1);
    }

    #[test]
    fn filesystem_failure_aborts_before_launch() {
        let dir = tempfile::tempdir().expect("temp dir");
        let blocker = dir.path().join("blocked");
        std::fs::write(&blocker, b"file").expect("write blocker");
        let root = Utf8Path::from_path(&blocker).expect("UTF-8 path");
        let layout = CacheLayout::new(
            root,
            &ProductIdentity::from_metadata("Acme", "tagsheet"),
            "tagsheet-export.bin",
        );
        let fixture = payload_fixture(layout.executable_name(), b"sidecar");
        let extractor = CountingExtractor::new(ZipExtractor);
        let spawner = RecordingSpawner::new();
        let context = ActionContext {
            payload: fixture.payload(),
            layout: &layout,
            extractor: &extractor,
            spawner: &spawner,
        };

        let err = run_export(&context, &ExportTarget::Device).expect_err("blocked cache");

        assert_eq!(err.action, EXPORT_DEVICE_ACTION);
        assert_eq!(err.source.kind(), ErrorKind::Filesystem);
        assert!(spawner.requests().is_empty());
    }

    #[test]
    fn spawn_failure_names_the_table_action() {
        let dir = tempfile::tempdir().expect("temp dir");
        let layout = layout_in(&dir);
        let fixture = payload_fixture(layout.executable_name(), b"sidecar");
        let extractor = CountingExtractor::new(ZipExtractor);
        let spawner = RecordingSpawner::failing(io::ErrorKind::PermissionDenied);
        let context = ActionContext {
            payload: fixture.payload(),
            layout: &layout,
            extractor: &extractor,
            spawner: &spawner,
        };

        let err = run_export(&context, &ExportTarget::Table("TagsB".to_owned()))
            .expect_err("spawn refused");

        assert_eq!(err.source.kind(), ErrorKind::Spawn);
        assert!(err.to_string().starts_with("Export Table To Excel failed"));
    }
}
