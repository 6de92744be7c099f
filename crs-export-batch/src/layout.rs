//! Live and archive directory trees of a batch run.

use camino::{Utf8Path, Utf8PathBuf};
use crs_export_core::ExportFormat;
use log::{debug, warn};

use crate::{BatchError, Bucket};

const PROJ_DIR: &str = "Proj";
const LIVE_DIR: &str = "custom_MSK";
const ARCHIVE_DIR: &str = "damp_custom_MSK";

/// Format folders under `<root>/Proj/custom_MSK` and `<root>/Proj/damp_custom_MSK`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchLayout {
    live: Utf8PathBuf,
    archive: Utf8PathBuf,
    extension: &'static str,
}

/// Files moved into the archive tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiveOutcome {
    /// Files copied and then removed from the live tree.
    pub archived: usize,
    /// Files whose copy or removal failed.
    pub failures: usize,
}

impl BatchLayout {
    /// Layout for `format` below `output_root`.
    #[must_use]
    pub fn new(output_root: &Utf8Path, format: ExportFormat) -> Self {
        let proj = output_root.join(PROJ_DIR);
        Self {
            live: proj.join(LIVE_DIR).join(format.folder_name()),
            archive: proj.join(ARCHIVE_DIR).join(format.folder_name()),
            extension: format.extension(),
        }
    }

    /// Format folder of the live tree.
    #[must_use]
    pub fn live_root(&self) -> &Utf8Path {
        &self.live
    }

    /// Format folder of the archive tree.
    #[must_use]
    pub fn archive_root(&self) -> &Utf8Path {
        &self.archive
    }

    /// Target path of `filename` in the live tree.
    #[must_use]
    pub fn live_path(&self, filename: &str) -> Utf8PathBuf {
        self.live
            .join(Bucket::classify(filename).relative_dir())
            .join(filename)
    }

    /// Creates every bucket directory in both trees.
    ///
    /// # Errors
    /// Returns [`BatchError::CreateDirectory`] when a directory cannot be created.
    pub fn create(&self) -> Result<(), BatchError> {
        for root in [&self.live, &self.archive] {
            for bucket in Bucket::ALL {
                let path = root.join(bucket.relative_dir());
                crs_export_fs::ensure_dir(&path)
                    .map_err(|source| BatchError::CreateDirectory { path, source })?;
            }
        }
        Ok(())
    }

    /// Moves existing exports from the live tree into the archive tree.
    ///
    /// Each file is copied first and removed afterwards, so an interrupted
    /// run leaves a complete archive. Per-file failures are logged and
    /// counted.
    ///
    /// # Errors
    /// Returns [`BatchError::ScanTree`] when the live tree cannot be listed.
    pub fn archive_existing(&self) -> Result<ArchiveOutcome, BatchError> {
        let existing = crs_export_fs::list_files(&self.live, Some(self.extension)).map_err(
            |source| BatchError::ScanTree {
                path: self.live.clone(),
                source,
            },
        )?;
        let mut outcome = ArchiveOutcome::default();
        for file in existing {
            let Ok(relative) = file.strip_prefix(&self.live) else {
                continue;
            };
            let target = self.archive.join(relative);
            let moved = crs_export_fs::copy_file(&file, &target)
                .and_then(|_| crs_export_fs::remove_file(&file));
            match moved {
                Ok(()) => {
                    debug!("archived {file} to {target}");
                    outcome.archived += 1;
                }
                Err(err) => {
                    warn!("failed to archive {file}: {err}");
                    outcome.failures += 1;
                }
            }
        }
        Ok(outcome)
    }
}

#[cfg(test)]
#[expect(clippy::expect_used, reason = "tests should fail fast when setup breaks")]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    #[fixture]
    fn root() -> (TempDir, Utf8PathBuf) {
        let dir = TempDir::new().expect("create temp dir");
        let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("UTF-8 temp dir");
        (dir, path)
    }

    #[rstest]
    fn folders_follow_the_format(root: (TempDir, Utf8PathBuf)) {
        let (_guard, base) = root;
        let layout = BatchLayout::new(&base, ExportFormat::PrjV2);
        assert_eq!(layout.live_root(), base.join("Proj/custom_MSK/GMv25"));
        assert_eq!(layout.archive_root(), base.join("Proj/damp_custom_MSK/GMv25"));
        assert_eq!(
            layout.live_path("SK42_zone_7.3.prj"),
            base.join("Proj/custom_MSK/GMv25/SK42/3deg/SK42_zone_7.3.prj")
        );
    }

    #[rstest]
    fn create_builds_every_bucket(root: (TempDir, Utf8PathBuf)) {
        let (_guard, base) = root;
        let layout = BatchLayout::new(&base, ExportFormat::PrjV1);
        layout.create().expect("create layout");
        for bucket in Bucket::ALL {
            assert!(layout.live_root().join(bucket.relative_dir()).is_dir());
            assert!(layout.archive_root().join(bucket.relative_dir()).is_dir());
        }
    }

    #[rstest]
    fn archive_moves_matching_files_only(root: (TempDir, Utf8PathBuf)) {
        let (_guard, base) = root;
        let layout = BatchLayout::new(&base, ExportFormat::PrjV1);
        layout.create().expect("create layout");
        let old = layout.live_path("MSK-50_zone_1.prj");
        let other = layout.live_root().join("notes.txt");
        crs_export_fs::write_file(&old, b"old").expect("write");
        crs_export_fs::write_file(&other, b"keep").expect("write");

        let outcome = layout.archive_existing().expect("archive");

        assert_eq!(outcome, ArchiveOutcome { archived: 1, failures: 0 });
        assert!(!old.exists());
        assert!(other.exists());
        let archived = layout.archive_root().join("MSK/MSK-50_zone_1.prj");
        assert_eq!(std::fs::read(archived).expect("archived copy"), b"old");
    }
}
