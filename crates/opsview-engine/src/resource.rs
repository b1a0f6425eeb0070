//! Resource resolution seam between the engine and its host.
//!
//! The engine needs two kinds of out-of-document resources: display markup
//! for navigation targets, and symbol library files. How those are fetched
//! (filesystem, HTTP, bundle) is the host's business; the engine only sees
//! this trait.

use std::path::PathBuf;

use anyhow::Context;

pub trait ResourceResolver {
    /// Absolute location for a display-relative path (used for image hrefs).
    fn resolve_path(&self, path: &str) -> String;

    /// Fetch the text content behind a display-relative path.
    fn resolve(&self, path: &str) -> anyhow::Result<String>;
}

/// Filesystem-backed resolver rooted at a directory.
#[derive(Debug, Clone)]
pub struct DirectoryResolver {
    root: PathBuf,
}

impl DirectoryResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ResourceResolver for DirectoryResolver {
    fn resolve_path(&self, path: &str) -> String {
        self.root.join(path).to_string_lossy().into_owned()
    }

    fn resolve(&self, path: &str) -> anyhow::Result<String> {
        let full = self.root.join(path);
        std::fs::read_to_string(&full)
            .with_context(|| format!("reading resource {}", full.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_resolver_reads_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("panel.uss"), "<Display/>").unwrap();

        let resolver = DirectoryResolver::new(dir.path());
        assert_eq!(resolver.resolve("panel.uss").unwrap(), "<Display/>");
        assert!(resolver.resolve("missing.uss").is_err());
        assert!(resolver.resolve_path("img/led.png").ends_with("img/led.png"));
    }
}
