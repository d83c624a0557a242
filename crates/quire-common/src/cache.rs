//! On-disk cache for fetched images.
//!
//! The drawing backend asks for a local file handle for every image URL it
//! paints. Remote and `data:` URLs are fetched once and written under the
//! cache directory; local paths are handed back unchanged.

use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use crate::net::{DataUrl, FetchError, fetch_bytes, is_remote};

/// Image cache rooted at a directory.
#[derive(Debug, Clone)]
pub struct ImageCache {
    dir: PathBuf,
}

impl ImageCache {
    /// Create a cache that stores files under `dir`.
    ///
    /// The directory is created lazily on the first store.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Cache in the system temporary directory.
    #[must_use]
    pub fn in_temp_dir() -> Self {
        Self::new(std::env::temp_dir().join("quire-image-cache"))
    }

    /// Directory cached files are written to.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Cache file path for `url` (whether or not it exists yet).
    #[must_use]
    pub fn path_for(&self, url: &str) -> PathBuf {
        let mut hasher = DefaultHasher::new();
        url.hash(&mut hasher);
        let ext = extension_hint(url);
        self.dir.join(format!("{:016x}.{ext}", hasher.finish()))
    }

    /// Make `url` available as a local file and return its path.
    ///
    /// Blocks until the fetch completes. An already-cached URL is not
    /// fetched again.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] if the download, data-URL decode, or cache
    /// write fails, or if a local path does not exist.
    pub fn fetch_and_cache(&self, url: &str) -> Result<PathBuf, FetchError> {
        if !is_remote(url) && !url.starts_with("data:") {
            let local = PathBuf::from(url.trim_start_matches("file://"));
            if local.is_file() {
                return Ok(local);
            }
            return Err(FetchError::Io {
                path: local.display().to_string(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            });
        }

        let target = self.path_for(url);
        if target.is_file() {
            return Ok(target);
        }

        let bytes = if is_remote(url) {
            fetch_bytes(url)?
        } else {
            DataUrl::new(url.to_string()).decode()?
        };

        fs::create_dir_all(&self.dir).map_err(|source| FetchError::Io {
            path: self.dir.display().to_string(),
            source,
        })?;
        fs::write(&target, bytes).map_err(|source| FetchError::Io {
            path: target.display().to_string(),
            source,
        })?;
        Ok(target)
    }
}

impl Default for ImageCache {
    fn default() -> Self {
        Self::in_temp_dir()
    }
}

/// File extension to store a cached URL under.
fn extension_hint(url: &str) -> &'static str {
    if let Some(rest) = url.strip_prefix("data:") {
        return match rest.split([';', ',']).next().unwrap_or_default() {
            "image/png" => "png",
            "image/jpeg" => "jpg",
            "image/gif" => "gif",
            "image/svg+xml" => "svg",
            _ => "bin",
        };
    }
    let path = url.split(['?', '#']).next().unwrap_or_default();
    match Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "png",
        Some("jpg" | "jpeg") => "jpg",
        Some("gif") => "gif",
        Some("svg") => "svg",
        Some("webp") => "webp",
        _ => "bin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_hint() {
        assert_eq!(extension_hint("https://x.org/a/b.PNG?w=10"), "png");
        assert_eq!(extension_hint("data:image/jpeg;base64,AAAA"), "jpg");
        assert_eq!(extension_hint("https://x.org/img"), "bin");
    }

    #[test]
    fn test_path_for_is_stable() {
        let cache = ImageCache::new("/tmp/quire-test-cache");
        assert_eq!(cache.path_for("https://x.org/a.png"), cache.path_for("https://x.org/a.png"));
        assert_ne!(cache.path_for("https://x.org/a.png"), cache.path_for("https://x.org/b.png"));
    }
}
