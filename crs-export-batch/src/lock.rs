//! One coarse lock per output root.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex};

use camino::{Utf8Path, Utf8PathBuf};

use crate::BatchError;

type RootLock = Arc<Mutex<()>>;

static ROOT_LOCKS: LazyLock<Mutex<HashMap<Utf8PathBuf, RootLock>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Runs `work` while holding the lock for `root`.
///
/// The root is created and canonicalised first, so overlapping runs on the
/// same directory are serialised however its path is spelt. Runs on
/// different roots proceed in parallel.
pub(crate) fn with_root_lock<T>(
    root: &Utf8Path,
    work: impl FnOnce() -> Result<T, BatchError>,
) -> Result<T, BatchError> {
    let key = crs_export_fs::canonical_dir(root).map_err(|source| BatchError::ResolveRoot {
        path: root.to_path_buf(),
        source,
    })?;
    let poisoned = || BatchError::LockPoisoned { root: key.clone() };
    let lock = {
        let mut locks = ROOT_LOCKS.lock().map_err(|_| poisoned())?;
        Arc::clone(locks.entry(key.clone()).or_default())
    };
    let _guard = lock.lock().map_err(|_| poisoned())?;
    work()
}
