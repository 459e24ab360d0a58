//! Source discovery.

use std::fs;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::GeneratorError;
use crate::syntax::SourceFile;

/// Finds the Rust sources of one crate.
#[derive(Debug, Clone)]
pub struct SourceDiscovery {
    root: PathBuf,
    source_root: String,
    exclude: GlobSet,
    skip: Option<PathBuf>,
}

impl SourceDiscovery {
    /// Discovers `.rs` files under `root/source_root`, minus `exclude` globs.
    ///
    /// Globs match paths relative to `root` with `/` separators, e.g.
    /// `src/fixtures/**`.
    pub fn new(root: impl Into<PathBuf>, source_root: &str, exclude: &[String]) -> Result<Self, GeneratorError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in exclude {
            let glob = Glob::new(pattern).map_err(|source| GeneratorError::InvalidExclude {
                pattern: pattern.clone(),
                source,
            })?;
            builder.add(glob);
        }
        let exclude = builder.build().map_err(|source| GeneratorError::InvalidExclude {
            pattern: exclude.join(", "),
            source,
        })?;
        Ok(Self {
            root: root.into(),
            source_root: source_root.trim_matches('/').to_string(),
            exclude,
            skip: None,
        })
    }

    /// Never returns `path` (the generated output, when it lives in the tree).
    pub fn skip(mut self, path: impl Into<PathBuf>) -> Self {
        self.skip = Some(path.into());
        self
    }

    /// The crate root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Paths of every matching file, relative to the root and sorted.
    pub fn paths(&self) -> Result<Vec<String>, GeneratorError> {
        let base = self.root.join(&self.source_root);
        if !base.is_dir() {
            return Err(GeneratorError::io(
                base,
                std::io::Error::new(std::io::ErrorKind::NotFound, "source root is not a directory"),
            ));
        }
        let skip = self.skip.as_ref().and_then(|p| fs::canonicalize(p).ok());

        let mut paths = Vec::new();
        for entry in WalkDir::new(&base).follow_links(true) {
            let entry = entry?;
            let path = entry.path();
            if !entry.file_type().is_file() || path.extension().map_or(true, |ext| ext != "rs") {
                continue;
            }
            let Ok(relative) = path.strip_prefix(&self.root) else {
                continue;
            };
            let relative = relative_string(relative);
            if self.exclude.is_match(&relative) {
                debug!(path = %relative, "Excluded source file");
                continue;
            }
            if skip.is_some() && fs::canonicalize(path).ok() == skip {
                continue;
            }
            paths.push(relative);
        }
        paths.sort();
        Ok(paths)
    }

    /// Reads every matching file.
    pub fn load(&self) -> Result<Vec<SourceFile>, GeneratorError> {
        self.paths()?
            .into_iter()
            .map(|relative| {
                let path = self.root.join(&relative);
                let text = fs::read_to_string(&path).map_err(|e| GeneratorError::io(&path, e))?;
                Ok(SourceFile::new(relative, text))
            })
            .collect()
    }
}

fn relative_string(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tree(files: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for file in files {
            let path = dir.path().join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, format!("// {file}\n")).unwrap();
        }
        dir
    }

    #[test]
    fn test_finds_sorted_rust_sources() {
        let dir = tree(&["src/lib.rs", "src/api/items.rs", "src/api/mod.rs", "src/notes.txt", "build.rs"]);
        let discovery = SourceDiscovery::new(dir.path(), "src", &[]).unwrap();

        assert_eq!(
            discovery.paths().unwrap(),
            vec!["src/api/items.rs", "src/api/mod.rs", "src/lib.rs"]
        );
        let files = discovery.load().unwrap();
        assert_eq!(files[2].text, "// src/lib.rs\n");
    }

    #[test]
    fn test_exclude_and_skip() {
        let dir = tree(&["src/lib.rs", "src/fixtures/a.rs", "src/fixtures/deep/b.rs", "src/generated.rs"]);
        let discovery = SourceDiscovery::new(dir.path(), "src", &["src/fixtures/**".to_string()])
            .unwrap()
            .skip(dir.path().join("src/generated.rs"));

        assert_eq!(discovery.paths().unwrap(), vec!["src/lib.rs"]);
    }

    #[test]
    fn test_invalid_glob_and_missing_root() {
        let err = SourceDiscovery::new(".", "src", &["src/[".to_string()]).unwrap_err();
        assert!(matches!(err, GeneratorError::InvalidExclude { .. }));

        let dir = tree(&[]);
        let err = SourceDiscovery::new(dir.path(), "src", &[]).unwrap().paths().unwrap_err();
        assert!(matches!(err, GeneratorError::Io { .. }));
    }
}
