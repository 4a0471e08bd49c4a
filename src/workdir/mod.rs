// src/workdir/mod.rs

//! Per-calculation working directories.
//!
//! Each calculation gets `<storage root>/<calculation name>`, populated with
//! symlinks to every file of the shared control/data trees so the legacy
//! tools find their inputs in the current directory.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, error, warn};

use crate::fs::FileSystem;

/// Outcome of [`link_tree`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkReport {
    pub created: usize,
    /// Links that were already present (typical for resumed runs).
    pub existing: usize,
    /// Links that could not be created; skipped.
    pub failed: usize,
}

/// Create `root/name` if needed and return it. Reuses an existing directory.
pub fn ensure_dir(fs: &dyn FileSystem, root: &Path, name: &str) -> Result<PathBuf> {
    let dir = root.join(name);
    if !fs.is_dir(&dir) {
        fs.create_dir_all(&dir)
            .with_context(|| format!("creating working directory {:?}", dir))?;
    }
    Ok(dir)
}

/// Mirror every file found under `sources` into `dest` as a same-named
/// symlink.
///
/// A failure to list a source directory aborts the whole operation; a failure
/// to create an individual link is logged and counted, never propagated.
pub fn link_tree(fs: &dyn FileSystem, sources: &[&Path], dest: &Path) -> Result<LinkReport> {
    let mut report = LinkReport::default();

    for source in sources {
        let mut files = Vec::new();
        collect_files(fs, source, &mut files).map_err(|err| {
            error!(path = %source.display(), error = %err, "error while walking path");
            err
        })?;

        for file in files {
            link_one(fs, &file, dest, &mut report);
        }
    }

    debug!(
        dest = %dest.display(),
        created = report.created,
        existing = report.existing,
        failed = report.failed,
        "symbolic links prepared"
    );
    Ok(report)
}

fn link_one(fs: &dyn FileSystem, file: &Path, dest: &Path, report: &mut LinkReport) {
    let Some(base) = file.file_name() else {
        return;
    };
    let link = dest.join(base);

    match fs.symlink(file, &link) {
        Ok(()) => report.created += 1,
        Err(err) if is_already_exists(&err) => {
            debug!(link = %link.display(), "link already present");
            report.existing += 1;
        }
        Err(err) => {
            warn!(
                target_file = %file.display(),
                link = %link.display(),
                error = %err,
                "could not create symbolic link; skipping"
            );
            report.failed += 1;
        }
    }
}

fn is_already_exists(err: &anyhow::Error) -> bool {
    err.downcast_ref::<io::Error>()
        .is_some_and(|e| e.kind() == io::ErrorKind::AlreadyExists)
}

/// Depth-first, sorted walk collecting every non-directory entry under
/// `root`. `root` itself may be a single file; it must exist.
pub(crate) fn collect_files(fs: &dyn FileSystem, root: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    if !fs.exists(root) {
        anyhow::bail!("path {:?} does not exist", root);
    }
    walk(fs, root, out)
}

fn walk(fs: &dyn FileSystem, path: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    if !fs.is_dir(path) {
        out.push(path.to_path_buf());
        return Ok(());
    }
    for entry in fs.read_dir(path)? {
        walk(fs, &entry, out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    fn shared_trees() -> MockFileSystem {
        let fs = MockFileSystem::new();
        fs.add_file("/shared/control/kurucz.tmpl", "TEFF {{.Teff}}");
        fs.add_file("/shared/control/nested/odf.dat", "odf");
        fs.add_file("/shared/data/lines.bin", "lines");
        fs.add_dir("/nfs");
        fs
    }

    #[test]
    fn ensure_dir_creates_and_reuses() {
        let fs = shared_trees();
        let dir = ensure_dir(&fs, Path::new("/nfs"), "calc-a").unwrap();
        assert_eq!(dir, PathBuf::from("/nfs/calc-a"));
        assert!(fs.is_dir(&dir));

        fs.add_file("/nfs/calc-a/marker", "keep");
        let again = ensure_dir(&fs, Path::new("/nfs"), "calc-a").unwrap();
        assert_eq!(again, dir);
        assert_eq!(fs.contents("/nfs/calc-a/marker").unwrap(), b"keep");
    }

    #[test]
    fn links_every_file_flat_into_destination() {
        let fs = shared_trees();
        let dest = ensure_dir(&fs, Path::new("/nfs"), "calc-a").unwrap();

        let report = link_tree(
            &fs,
            &[Path::new("/shared/control"), Path::new("/shared/data")],
            &dest,
        )
        .unwrap();

        assert_eq!(report, LinkReport { created: 3, existing: 0, failed: 0 });
        assert_eq!(
            fs.link_target("/nfs/calc-a/odf.dat").unwrap(),
            PathBuf::from("/shared/control/nested/odf.dat")
        );
        assert_eq!(
            fs.link_target("/nfs/calc-a/lines.bin").unwrap(),
            PathBuf::from("/shared/data/lines.bin")
        );
        // sources untouched
        assert_eq!(fs.contents("/shared/data/lines.bin").unwrap(), b"lines");
    }

    #[test]
    fn relinking_reports_existing_links() {
        let fs = shared_trees();
        let dest = ensure_dir(&fs, Path::new("/nfs"), "calc-a").unwrap();
        let sources = [Path::new("/shared/data")];

        link_tree(&fs, &sources, &dest).unwrap();
        let report = link_tree(&fs, &sources, &dest).unwrap();
        assert_eq!(report, LinkReport { created: 0, existing: 1, failed: 0 });
    }

    #[test]
    fn individual_link_failures_are_skipped() {
        let fs = shared_trees();
        let dest = ensure_dir(&fs, Path::new("/nfs"), "calc-a").unwrap();
        fs.fail_on("/nfs/calc-a/kurucz.tmpl");

        let report = link_tree(&fs, &[Path::new("/shared/control")], &dest).unwrap();
        assert_eq!(report, LinkReport { created: 1, existing: 0, failed: 1 });
        assert!(fs.link_target("/nfs/calc-a/odf.dat").is_some());
    }

    #[test]
    fn missing_source_tree_is_an_error() {
        let fs = shared_trees();
        let dest = ensure_dir(&fs, Path::new("/nfs"), "calc-a").unwrap();

        let result = link_tree(&fs, &[Path::new("/shared/nope")], &dest);
        assert!(result.is_err());
    }

    #[test]
    fn unreadable_subdirectory_is_an_error() {
        let fs = shared_trees();
        let dest = ensure_dir(&fs, Path::new("/nfs"), "calc-a").unwrap();
        fs.fail_on("/shared/control/nested");

        let result = link_tree(&fs, &[Path::new("/shared/control")], &dest);
        assert!(result.is_err());
    }
}
