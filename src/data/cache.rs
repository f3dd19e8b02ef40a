//! Persistent cache for parsed example pools.
//!
//! Parsing a corpus can dominate dataset construction, so the
//! `(support, query)` pools are cached on disk keyed by split, tokenizer,
//! sequence length, and task. Concurrent dataset initializations (e.g. one
//! per training process) coordinate through a blocking exclusive advisory
//! lock on a sibling `.lock` file: the first process builds and persists,
//! the rest block and then read the result.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{PlantillaError, Result};

use super::dataset::SplitMode;
use super::example::Example;

#[derive(Serialize, Deserialize)]
struct CachedPools {
    support: Vec<Example>,
    query: Vec<Example>,
}

/// Load the example pools from cache, or build and persist them.
///
/// The cache key mirrors the file name:
/// `cached_{split}_{tokenizer}_{max_length}_{task}.json`. Anything beyond
/// those elements is not part of the key; change tokenization or corpus
/// contents and the cache must be overwritten or removed.
///
/// # Errors
///
/// Cache I/O and serialization failures are fatal environment errors, as is
/// a failing `build` closure.
pub fn load_or_build_pools(
    cache_dir: &Path,
    split: SplitMode,
    tokenizer_name: &str,
    max_length: usize,
    task_name: &str,
    overwrite: bool,
    build: impl FnOnce() -> Result<(Vec<Example>, Vec<Example>)>,
) -> Result<(Vec<Example>, Vec<Example>)> {
    let cache_path = cache_dir.join(format!(
        "cached_{split}_{tokenizer_name}_{max_length}_{task_name}.json"
    ));
    let lock_path = cache_path.with_extension("json.lock");

    let _lock = FileLock::acquire(&lock_path)?;

    if cache_path.exists() && !overwrite {
        let start = Instant::now();
        let file = File::open(&cache_path)
            .map_err(|e| PlantillaError::io(format!("opening cache {}", cache_path.display()), e))?;
        let pools: CachedPools =
            serde_json::from_reader(std::io::BufReader::new(file)).map_err(|e| {
                PlantillaError::Cache { path: cache_path.clone(), message: e.to_string() }
            })?;
        info!(
            path = %cache_path.display(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "loaded example pools from cache"
        );
        return Ok((pools.support, pools.query));
    }

    let (support, query) = build()?;

    let start = Instant::now();
    let file = File::create(&cache_path)
        .map_err(|e| PlantillaError::io(format!("creating cache {}", cache_path.display()), e))?;
    serde_json::to_writer(
        std::io::BufWriter::new(file),
        &CachedPools { support: support.clone(), query: query.clone() },
    )
    .map_err(|e| PlantillaError::Cache { path: cache_path.clone(), message: e.to_string() })?;
    info!(
        path = %cache_path.display(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "saved example pools to cache"
    );

    Ok((support, query))
}

/// Blocking exclusive advisory lock on a file, released on drop.
///
/// The lock file itself is left in place: removing it would let a third
/// process lock a fresh inode while a second still waits on the old one.
struct FileLock {
    #[allow(dead_code)] // held for its lifetime; the fd carries the lock
    file: File,
}

impl FileLock {
    fn acquire(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)
            .map_err(|e| PlantillaError::io(format!("opening lock file {}", path.display()), e))?;

        #[cfg(unix)]
        {
            use std::os::unix::io::AsRawFd;
            let result = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX) };
            if result != 0 {
                return Err(PlantillaError::io(
                    format!("locking {}", path.display()),
                    std::io::Error::last_os_error(),
                ));
            }
        }
        // Non-unix targets fall back to no inter-process exclusion; the
        // cache write is then last-writer-wins.

        Ok(Self { file })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        #[cfg(unix)]
        {
            use std::os::unix::io::AsRawFd;
            unsafe { libc::flock(self.file.as_raw_fd(), libc::LOCK_UN) };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pools() -> (Vec<Example>, Vec<Example>) {
        (
            vec![Example::new("train-0", "support text", Some("1"))],
            vec![Example::new("dev-0", "query text", Some("0"))],
        )
    }

    #[test]
    fn test_cache_builds_then_reads() {
        let dir = tempfile::tempdir().unwrap();
        let mut built = 0;

        for _ in 0..2 {
            let (support, query) = load_or_build_pools(
                dir.path(),
                SplitMode::Dev,
                "WhitespaceTokenizer",
                64,
                "sst-2",
                false,
                || {
                    built += 1;
                    Ok(pools())
                },
            )
            .unwrap();
            assert_eq!(support.len(), 1);
            assert_eq!(query[0].guid, "dev-0");
        }
        // Second call served from cache.
        assert_eq!(built, 1);
    }

    #[test]
    fn test_cache_overwrite_rebuilds() {
        let dir = tempfile::tempdir().unwrap();
        let mut built = 0;
        for _ in 0..2 {
            load_or_build_pools(
                dir.path(),
                SplitMode::Test,
                "WhitespaceTokenizer",
                64,
                "sst-2",
                true,
                || {
                    built += 1;
                    Ok(pools())
                },
            )
            .unwrap();
        }
        assert_eq!(built, 2);
    }

    #[test]
    fn test_cache_key_separates_splits() {
        let dir = tempfile::tempdir().unwrap();
        load_or_build_pools(dir.path(), SplitMode::Dev, "tok", 64, "t", false, || Ok(pools()))
            .unwrap();
        let mut built = 0;
        load_or_build_pools(dir.path(), SplitMode::Train, "tok", 64, "t", false, || {
            built += 1;
            Ok(pools())
        })
        .unwrap();
        assert_eq!(built, 1);
    }

    #[test]
    fn test_build_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_or_build_pools(dir.path(), SplitMode::Dev, "tok", 32, "t", false, || {
            Err(PlantillaError::EmptyDemonstrationSet)
        });
        assert!(result.is_err());
        // Nothing cached on failure.
        assert!(!dir.path().join("cached_dev_tok_32_t.json").exists());
    }
}
