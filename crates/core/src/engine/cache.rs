//! On-disk cache cleanup for removed torrents.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};

use crate::session::InfoHash;
use crate::settings::BtSettings;

/// Cache directory of `hash`, or `None` when disk caching is off.
pub fn cache_dir_for(settings: &BtSettings, hash: &InfoHash) -> Option<PathBuf> {
    if !settings.use_disk_cache || !hash.is_safe_path_segment() {
        return None;
    }
    Some(Path::new(&settings.cache_directory).join(hash.as_str()))
}

/// Delete every file under `dir`, including nested folders, then the
/// folders themselves and `dir`.
///
/// Failures are logged and skipped. Returns the number of files deleted.
pub async fn purge_cache_dir(dir: &Path) -> usize {
    match fs::metadata(dir).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(dir = %dir.display(), "No cache directory to remove");
            return 0;
        }
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "Failed to read cache directory");
        }
    }

    let mut removed = 0;
    // Directories in discovery order; parents always precede children
    let mut dirs = vec![dir.to_path_buf()];
    let mut next = 0;

    while next < dirs.len() {
        let current = dirs[next].clone();
        next += 1;

        let mut entries = match fs::read_dir(&current).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %current.display(), error = %e, "Failed to list cache directory");
                continue;
            }
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!(dir = %current.display(), error = %e, "Failed to list cache directory");
                    break;
                }
            };

            let path = entry.path();
            let is_dir = match entry.file_type().await {
                Ok(file_type) => file_type.is_dir(),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to stat cache entry");
                    continue;
                }
            };

            if is_dir {
                dirs.push(path);
                continue;
            }
            match fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to remove cache file")
                }
            }
        }
    }

    for current in dirs.iter().rev() {
        if let Err(e) = fs::remove_dir(current).await {
            warn!(dir = %current.display(), error = %e, "Failed to remove cache directory");
        }
    }

    removed
}
