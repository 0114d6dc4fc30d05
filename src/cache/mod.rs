// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Content-addressed task result caching.
//!
//! A task marked `cache = true` is skipped on a subsequent run if its
//! command and environment hash to a key whose marker file already exists
//! under `~/.zr/cache/`. Keys use FNV-1a rather than `DefaultHasher`: the
//! standard library explicitly does not guarantee a stable algorithm across
//! compiler versions, and a cache that silently invalidates itself on every
//! toolchain bump defeats the point.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("could not access cache directory '{path}': {source}")]
    Inaccessible {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Compute a stable 16-hex-character cache key from a task's command and
/// its environment pairs, in their stored order — callers that want a
/// stable key across equivalent-but-reordered env lists must sort before
/// calling this.
pub fn key(cmd: &str, env: &[(&str, &str)]) -> String {
    let mut hash = FNV_OFFSET_BASIS;

    for byte in cmd.bytes() {
        hash = fnv_step(hash, byte);
    }
    for (k, v) in env {
        hash = fnv_step(hash, 0);
        for byte in k.bytes() {
            hash = fnv_step(hash, byte);
        }
        hash = fnv_step(hash, b'=');
        for byte in v.bytes() {
            hash = fnv_step(hash, byte);
        }
    }

    format!("{:016x}", hash)
}

fn fnv_step(hash: u64, byte: u8) -> u64 {
    (hash ^ byte as u64).wrapping_mul(FNV_PRIME)
}

/// A marker-file cache rooted at a directory (normally `~/.zr/cache/`).
pub struct Cache {
    root: PathBuf,
}

impl Cache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The default cache root: `~/.zr/cache/`, falling back to
    /// `./.zr/cache/` if the home directory cannot be determined.
    pub fn default_root() -> PathBuf {
        let home = std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        home.join(".zr").join("cache")
    }

    fn marker_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.ok"))
    }

    /// `true` if a marker for `key` exists. An inaccessible cache directory
    /// is treated as a miss, never a fatal error.
    pub fn hit(&self, key: &str) -> bool {
        self.marker_path(key).is_file()
    }

    /// Record a successful run under `key`. Creates the cache directory on
    /// demand; failures surface as a `CacheError` for the caller to log as a
    /// warning, not to abort the run over.
    pub fn mark(&self, key: &str) -> Result<(), CacheError> {
        fs::create_dir_all(&self.root).map_err(|source| CacheError::Inaccessible {
            path: self.root.display().to_string(),
            source,
        })?;
        fs::write(self.marker_path(key), b"").map_err(|source| CacheError::Inaccessible {
            path: self.root.display().to_string(),
            source,
        })
    }

    /// Remove every marker file under the cache root, leaving the directory
    /// itself in place.
    pub fn clear_all(&self) -> Result<(), CacheError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(source) if source.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(source) => {
                return Err(CacheError::Inaccessible {
                    path: self.root.display().to_string(),
                    source,
                })
            }
        };

        for entry in entries.flatten() {
            let path: &Path = &entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("ok") {
                let _ = fs::remove_file(path);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn key_is_stable_for_the_same_inputs() {
        let a = key("echo hi", &[("X", "1")]);
        let b = key("echo hi", &[("X", "1")]);
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn key_is_order_dependent_over_env_pairs() {
        let a = key("echo hi", &[("X", "1"), ("Y", "2")]);
        let b = key("echo hi", &[("Y", "2"), ("X", "1")]);
        assert_ne!(a, b);
    }

    #[test]
    fn key_differs_for_different_commands() {
        let a = key("echo hi", &[]);
        let b = key("echo bye", &[]);
        assert_ne!(a, b);
    }

    #[test]
    fn miss_then_hit_after_mark() {
        let dir = tempdir().unwrap();
        let cache = Cache::new(dir.path());
        let k = key("echo hi", &[]);
        assert!(!cache.hit(&k));
        cache.mark(&k).unwrap();
        assert!(cache.hit(&k));
    }

    #[test]
    fn clear_all_removes_markers() {
        let dir = tempdir().unwrap();
        let cache = Cache::new(dir.path());
        let k = key("echo hi", &[]);
        cache.mark(&k).unwrap();
        cache.clear_all().unwrap();
        assert!(!cache.hit(&k));
    }

    #[test]
    fn clear_all_on_missing_directory_is_not_an_error() {
        let dir = tempdir().unwrap();
        let cache = Cache::new(dir.path().join("does-not-exist"));
        assert!(cache.clear_all().is_ok());
    }
}
