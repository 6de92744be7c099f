//! Filesystem helpers for export trees, built on `cap-std` and `camino`.
#![forbid(unsafe_code)]

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use std::io;
use std::path::Component;

/// Resolve an ambient directory for the given path and return the directory with the file name.
pub fn open_dir_and_file(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, String)> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::other("target should include a file name"))?
        .to_owned();
    let dir = fs_utf8::Dir::open_ambient_dir(parent, ambient_authority())?;
    Ok((dir, file_name))
}

/// Ensure the parent directory for `path` exists, handling absolute paths safely for cap-std.
pub fn ensure_parent_dir(path: &Utf8Path) -> io::Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    ensure_dir(parent)
}

/// Create `path` and any missing ancestors.
pub fn ensure_dir(path: &Utf8Path) -> io::Result<()> {
    if path.as_str().is_empty() || path == Utf8Path::new("/") {
        return Ok(());
    }
    let (base_dir, relative) = base_dir_and_relative(path)?;
    if relative.as_str().is_empty() {
        return Ok(());
    }
    base_dir.create_dir_all(&relative)
}

/// Create `path` if needed and return its canonical, absolute form.
///
/// Spellings of one directory such as `out` and `./out` map to the same path.
pub fn canonical_dir(path: &Utf8Path) -> io::Result<Utf8PathBuf> {
    ensure_dir(path)?;
    path.canonicalize_utf8()
}

/// Write `contents` to `path`, creating parent directories and replacing any existing file.
pub fn write_file(path: &Utf8Path, contents: &[u8]) -> io::Result<()> {
    ensure_parent_dir(path)?;
    let (dir, name) = open_dir_and_file(path)?;
    dir.write(name.as_str(), contents)
}

/// Copy the file at `from` to `to`, creating the destination's parent directories.
///
/// Returns the number of bytes copied.
pub fn copy_file(from: &Utf8Path, to: &Utf8Path) -> io::Result<u64> {
    ensure_parent_dir(to)?;
    let (source_dir, source_name) = open_dir_and_file(from)?;
    let (target_dir, target_name) = open_dir_and_file(to)?;
    source_dir.copy(source_name.as_str(), &target_dir, target_name.as_str())
}

/// Remove the file at `path`.
pub fn remove_file(path: &Utf8Path) -> io::Result<()> {
    let (dir, name) = open_dir_and_file(path)?;
    dir.remove_file(name.as_str())
}

/// Return whether a path exists and is a regular file using capability-based IO.
pub fn file_is_file(path: &Utf8Path) -> io::Result<bool> {
    let (dir, name) = open_dir_and_file(path)?;
    match dir.metadata(name.as_str()) {
        Ok(meta) => Ok(meta.is_file()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

/// List regular files below `root`, recursively, sorted by path.
///
/// Only files whose extension equals `extension` (ASCII case-insensitive)
/// are returned when one is given. A missing `root` yields an empty list.
pub fn list_files(root: &Utf8Path, extension: Option<&str>) -> io::Result<Vec<Utf8PathBuf>> {
    let dir = match fs_utf8::Dir::open_ambient_dir(root, ambient_authority()) {
        Ok(dir) => dir,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err),
    };
    let mut found = Vec::new();
    collect_files(&dir, root, extension, &mut found)?;
    found.sort();
    Ok(found)
}

fn collect_files(
    dir: &fs_utf8::Dir,
    prefix: &Utf8Path,
    extension: Option<&str>,
    found: &mut Vec<Utf8PathBuf>,
) -> io::Result<()> {
    for listed in dir.entries()? {
        let entry = listed?;
        let name = entry.file_name()?;
        let path = prefix.join(&name);
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            let child = dir.open_dir(&name)?;
            collect_files(&child, &path, extension, found)?;
        } else if file_type.is_file() && matches_extension(&path, extension) {
            found.push(path);
        }
    }
    Ok(())
}

fn matches_extension(path: &Utf8Path, extension: Option<&str>) -> bool {
    extension.is_none_or(|wanted| {
        path.extension()
            .is_some_and(|actual| actual.eq_ignore_ascii_case(wanted))
    })
}

/// Split an absolute or relative path into an ambient base directory and a relative suffix.
pub fn base_dir_and_relative(parent: &Utf8Path) -> io::Result<(fs_utf8::Dir, Utf8PathBuf)> {
    let std_parent = parent.as_std_path();

    let (base, relative) = match std_parent.components().next() {
        // Windows absolute path with a drive or UNC prefix.
        Some(Component::Prefix(prefix)) => {
            let prefix_str = prefix
                .as_os_str()
                .to_str()
                .ok_or_else(|| io::Error::other("non-UTF-8 path prefix"))?;

            let base = Utf8PathBuf::from(prefix_str).join(std::path::MAIN_SEPARATOR.to_string());
            let relative = std_parent
                .strip_prefix(base.as_std_path())
                .or_else(|_| std_parent.strip_prefix(prefix.as_os_str()))
                .map_err(|_| io::Error::other("failed to strip prefix from path"))?
                .to_path_buf();
            (base, relative)
        }
        // Unix-style absolute path.
        Some(Component::RootDir) => {
            let base = Utf8PathBuf::from(std::path::MAIN_SEPARATOR.to_string());
            let relative = std_parent
                .strip_prefix(base.as_std_path())
                .map_err(|_| io::Error::other("failed to strip root from absolute path"))?
                .to_path_buf();
            (base, relative)
        }
        // Relative path: resolve from the current directory.
        _ => (Utf8PathBuf::from("."), std_parent.to_path_buf()),
    };

    let dir = fs_utf8::Dir::open_ambient_dir(&base, ambient_authority())?;
    let relative =
        Utf8PathBuf::from_path_buf(relative).map_err(|_| io::Error::other("non-UTF-8 path"))?;

    Ok((dir, relative))
}
