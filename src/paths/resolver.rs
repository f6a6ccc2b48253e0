//! Logical file name → concrete location.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};
use crate::overlay::{OverlayFile, ResourceOverlay};

/// Prefixes probed inside the overlay, so configuration can ship either at
/// the bundle root or under a `config` directory.
pub const OVERLAY_PREFIXES: [&str; 6] = ["", "/", "config/", "config", "/config", "/config/"];

/// Subdirectory checked under every search path on disk.
pub const CONFIG_SUBDIR: &str = "config";

/// Where a file name resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Overlay(OverlayFile),
    Disk(PathBuf),
}

impl Resolved {
    /// Human-readable location, for logs and the CLI.
    pub fn location(&self) -> String {
        match self {
            Resolved::Overlay(file) => file.name().to_string(),
            Resolved::Disk(path) => path.display().to_string(),
        }
    }
}

/// Read-only resolution over a search path snapshot and an optional overlay.
pub struct PathResolver<'a> {
    search_paths: &'a [String],
    overlay: Option<&'a dyn ResourceOverlay>,
}

impl<'a> PathResolver<'a> {
    pub fn new(search_paths: &'a [String], overlay: Option<&'a dyn ResourceOverlay>) -> Self {
        Self {
            search_paths,
            overlay: overlay.filter(|overlay| !overlay.is_empty()),
        }
    }

    /// First match: overlay root prefixes, overlay search paths, then disk.
    pub fn resolve(&self, name: &str) -> Option<Resolved> {
        if name.is_empty() {
            return None;
        }
        self.resolve_overlay(name)
            .map(Resolved::Overlay)
            .or_else(|| self.resolve_disk(name).map(Resolved::Disk))
    }

    fn resolve_overlay(&self, name: &str) -> Option<OverlayFile> {
        let overlay = self.overlay?;
        let probe = |candidate: String| overlay.get(&candidate).filter(|file| !file.is_dir());

        OVERLAY_PREFIXES
            .iter()
            .find_map(|prefix| probe(format!("{prefix}{name}")))
            .or_else(|| {
                self.search_paths.iter().find_map(|dir| {
                    OVERLAY_PREFIXES
                        .iter()
                        .find_map(|prefix| probe(format!("{dir}{prefix}{name}")))
                })
            })
    }

    fn resolve_disk(&self, name: &str) -> Option<PathBuf> {
        self.search_paths.iter().find_map(|dir| {
            let dir = trim_separators(dir);
            [dir.join(name), dir.join(CONFIG_SUBDIR).join(name)]
                .into_iter()
                .find(|candidate| candidate.is_file())
        })
    }

    /// Resolve a directory for `add_path`/`set_path`.
    ///
    /// Order: overlay entry, the path itself on disk, then the path relative
    /// to each current search directory.
    pub fn resolve_directory(&self, path: &str) -> Result<String> {
        let not_found = || ConfigError::PathNotFound {
            path: path.to_string(),
            searched: self.search_paths.to_vec(),
        };
        if path.trim().is_empty() {
            return Err(not_found());
        }

        if let Some(entry) = self.overlay.and_then(|overlay| overlay.get(path)) {
            return if entry.is_dir() {
                Ok(entry.name().to_string())
            } else {
                Err(ConfigError::NotADirectory {
                    path: path.to_string(),
                })
            };
        }

        let real = fs::canonicalize(path)
            .ok()
            .or_else(|| {
                self.search_paths
                    .iter()
                    .find_map(|dir| fs::canonicalize(Path::new(dir).join(path)).ok())
            })
            .ok_or_else(not_found)?;

        if !real.is_dir() {
            return Err(ConfigError::NotADirectory {
                path: path.to_string(),
            });
        }
        Ok(real.to_string_lossy().into_owned())
    }
}

fn trim_separators(dir: &str) -> PathBuf {
    let trimmed = dir.trim_end_matches(['/', '\\']);
    if trimmed.is_empty() {
        PathBuf::from(if dir.is_empty() { "." } else { "/" })
    } else {
        PathBuf::from(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::MapOverlay;
    use tempfile::TempDir;

    fn dir_string(dir: &TempDir) -> String {
        fs::canonicalize(dir.path())
            .unwrap()
            .to_string_lossy()
            .into_owned()
    }

    #[test]
    fn test_disk_prefers_direct_file_then_config_subdir() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("config")).unwrap();
        fs::write(dir.path().join("config").join("app.toml"), "a = 1").unwrap();

        let paths = vec![dir_string(&dir)];
        let resolver = PathResolver::new(&paths, None);
        let found = resolver.resolve("app.toml").unwrap();
        assert_eq!(
            found,
            Resolved::Disk(PathBuf::from(&paths[0]).join("config").join("app.toml"))
        );

        fs::write(dir.path().join("app.toml"), "a = 2").unwrap();
        let found = resolver.resolve("app.toml").unwrap();
        assert_eq!(found, Resolved::Disk(PathBuf::from(&paths[0]).join("app.toml")));
    }

    #[test]
    fn test_trailing_separator_is_trimmed() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("app.json"), "{}").unwrap();
        let paths = vec![format!("{}/", dir_string(&dir))];
        let resolver = PathResolver::new(&paths, None);
        assert_eq!(
            resolver.resolve("app.json"),
            Some(Resolved::Disk(PathBuf::from(dir_string(&dir)).join("app.json")))
        );
    }

    #[test]
    fn test_directories_do_not_match_files() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("app.toml")).unwrap();
        let paths = vec![dir_string(&dir)];
        assert_eq!(PathResolver::new(&paths, None).resolve("app.toml"), None);
    }

    #[test]
    fn test_overlay_wins_over_disk() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("app.toml"), "from = \"disk\"").unwrap();
        let mut overlay = MapOverlay::new();
        overlay.insert("/config/app.toml", "from = \"overlay\"");

        let paths = vec![dir_string(&dir)];
        let resolver = PathResolver::new(&paths, Some(&overlay));
        match resolver.resolve("app.toml") {
            Some(Resolved::Overlay(file)) => assert_eq!(file.name(), "/config/app.toml"),
            other => panic!("expected overlay hit, got {other:?}"),
        }
    }

    #[test]
    fn test_overlay_search_path_prefix() {
        let mut overlay = MapOverlay::new();
        overlay.insert("/bundle/config/app.yaml", "a: 1");
        let paths = vec!["/bundle".to_string()];
        let resolver = PathResolver::new(&paths, Some(&overlay));
        let found = resolver.resolve("app.yaml").unwrap();
        assert_eq!(found.location(), "/bundle/config/app.yaml");
    }

    #[test]
    fn test_empty_overlay_is_skipped() {
        let overlay = MapOverlay::new();
        let paths: Vec<String> = Vec::new();
        let resolver = PathResolver::new(&paths, Some(&overlay));
        assert_eq!(resolver.resolve("app.toml"), None);
    }

    #[test]
    fn test_resolve_directory() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("file.txt"), "x").unwrap();
        let paths = vec![dir_string(&dir)];
        let resolver = PathResolver::new(&paths, None);

        let nested = resolver.resolve_directory("nested").unwrap();
        assert_eq!(PathBuf::from(&nested), PathBuf::from(&paths[0]).join("nested"));
        assert!(matches!(
            resolver.resolve_directory("file.txt"),
            Err(ConfigError::NotADirectory { .. })
        ));
        match resolver.resolve_directory("missing-dir-for-test") {
            Err(ConfigError::PathNotFound { searched, .. }) => assert_eq!(searched, paths),
            other => panic!("unexpected {other:?}"),
        }
        assert!(resolver.resolve_directory("").is_err());
    }

    #[test]
    fn test_resolve_directory_in_overlay() {
        let mut overlay = MapOverlay::new();
        overlay.insert("/res/config.toml", "a = 1");
        let paths: Vec<String> = Vec::new();
        let resolver = PathResolver::new(&paths, Some(&overlay));
        assert_eq!(resolver.resolve_directory("res/").unwrap(), "/res");
        assert!(matches!(
            resolver.resolve_directory("/res/config.toml"),
            Err(ConfigError::NotADirectory { .. })
        ));
    }
}
