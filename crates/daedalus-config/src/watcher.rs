//! File watching for watch mode.
//!
//! [`FileWatcher`] reports batches of changed files. Events are collected
//! until the tree has been quiet for the debounce duration, so an editor
//! saving several files (or writing one file in several steps) produces a
//! single batch.
//!
//! # Example
//!
//! ```no_run
//! use daedalus_config::FileWatcher;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), daedalus_config::ConfigError> {
//! let mut watcher = FileWatcher::builder()
//!     .with_debounce(Duration::from_millis(200))
//!     .watch_path("src")?
//!     .watch_extensions(&["rs", "toml"])
//!     .build()?;
//!
//! while let Some(batch) = watcher.next_batch().await {
//!     println!("{} file(s) changed", batch.paths.len());
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::timeout;

use crate::ConfigError;

/// Kind of file change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileChangeKind {
    /// File was created.
    Created,
    /// File was modified.
    Modified,
    /// File was deleted.
    Deleted,
}

impl FileChangeKind {
    fn from_event(kind: &EventKind) -> Option<Self> {
        match kind {
            EventKind::Create(_) => Some(Self::Created),
            EventKind::Modify(_) => Some(Self::Modified),
            EventKind::Remove(_) => Some(Self::Deleted),
            EventKind::Access(_) | EventKind::Other | EventKind::Any => None,
        }
    }
}

/// A single relevant change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChangeEvent {
    /// Path to the changed file.
    pub path: PathBuf,
    /// Kind of change.
    pub kind: FileChangeKind,
}

/// Changes observed during one quiet period.
#[derive(Debug, Clone)]
pub struct ChangeBatch {
    /// Changed paths, deduplicated and sorted.
    pub paths: Vec<PathBuf>,
    /// When the first change of the batch arrived.
    pub started: Instant,
}

/// Configuration for the file watcher.
#[derive(Debug, Clone)]
pub struct FileWatcherConfig {
    /// Paths to watch (files or directories).
    pub paths: Vec<PathBuf>,
    /// Quiet period that closes a batch.
    pub debounce: Duration,
    /// Whether to watch directories recursively.
    pub recursive: bool,
    /// File extensions to watch (empty = all files).
    pub extensions: HashSet<String>,
    /// File names that never trigger a batch (e.g. the generated output).
    pub ignored_names: HashSet<String>,
}

impl Default for FileWatcherConfig {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            debounce: Duration::from_millis(200),
            recursive: true,
            extensions: HashSet::new(),
            ignored_names: HashSet::new(),
        }
    }
}

impl FileWatcherConfig {
    fn filter(&self, event: &Event) -> Vec<FileChangeEvent> {
        let Some(kind) = FileChangeKind::from_event(&event.kind) else {
            return Vec::new();
        };
        event
            .paths
            .iter()
            .filter(|path| self.is_relevant(path))
            .map(|path| FileChangeEvent {
                path: path.clone(),
                kind,
            })
            .collect()
    }

    fn is_relevant(&self, path: &Path) -> bool {
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if self.ignored_names.contains(name) {
                return false;
            }
        }
        if self.extensions.is_empty() {
            return true;
        }
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.contains(ext))
    }
}

/// Builder for a [`FileWatcher`].
#[derive(Debug, Default)]
pub struct FileWatcherBuilder {
    config: FileWatcherConfig,
}

impl FileWatcherBuilder {
    /// Create a new file watcher builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the quiet period that closes a batch. Default is 200ms.
    #[must_use]
    pub fn with_debounce(mut self, duration: Duration) -> Self {
        self.config.debounce = duration;
        self
    }

    /// Add a path to watch.
    ///
    /// # Errors
    ///
    /// Returns an error if the path does not exist.
    pub fn watch_path<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::MissingPath {
                path: path.to_path_buf(),
            });
        }
        self.config.paths.push(path.to_path_buf());
        Ok(self)
    }

    /// Add a path to watch, ignoring it if it doesn't exist.
    #[must_use]
    pub fn watch_path_optional<P: AsRef<Path>>(mut self, path: P) -> Self {
        let path = path.as_ref();
        if path.exists() {
            self.config.paths.push(path.to_path_buf());
        }
        self
    }

    /// Set whether to watch directories recursively. Default is true.
    #[must_use]
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.config.recursive = recursive;
        self
    }

    /// Only report files with these extensions.
    #[must_use]
    pub fn watch_extensions(mut self, extensions: &[&str]) -> Self {
        self.config.extensions = extensions.iter().map(|s| (*s).to_string()).collect();
        self
    }

    /// Never report files with this name.
    #[must_use]
    pub fn ignore_file_name(mut self, name: impl Into<String>) -> Self {
        self.config.ignored_names.insert(name.into());
        self
    }

    /// Build the file watcher.
    ///
    /// # Errors
    ///
    /// Returns an error if no paths are configured or the platform watcher
    /// cannot be created.
    pub fn build(self) -> Result<FileWatcher, ConfigError> {
        if self.config.paths.is_empty() {
            return Err(ConfigError::watch("no paths configured for file watcher"));
        }

        let (tx, rx) = mpsc::channel(100);

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            if let Ok(event) = res {
                // The receiver is gone once the watcher is dropped.
                let _ = tx.blocking_send(event);
            }
        })
        .map_err(|e| ConfigError::watch(format!("failed to create file watcher: {e}")))?;

        let mode = if self.config.recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };

        for path in &self.config.paths {
            watcher
                .watch(path, mode)
                .map_err(|e| ConfigError::watch(format!("failed to watch {}: {e}", path.display())))?;
        }

        Ok(FileWatcher {
            _watcher: watcher,
            rx,
            config: self.config,
        })
    }
}

/// Watches files and reports debounced batches of changes.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<Event>,
    config: FileWatcherConfig,
}

impl FileWatcher {
    /// Create a new file watcher builder.
    #[must_use]
    pub fn builder() -> FileWatcherBuilder {
        FileWatcherBuilder::new()
    }

    /// The watcher configuration.
    #[must_use]
    pub fn config(&self) -> &FileWatcherConfig {
        &self.config
    }

    /// Waits for the next relevant change.
    ///
    /// Returns `None` when the underlying watcher has shut down.
    pub async fn next(&mut self) -> Option<FileChangeEvent> {
        loop {
            let event = self.rx.recv().await?;
            if let Some(change) = self.config.filter(&event).into_iter().next() {
                return Some(change);
            }
        }
    }

    /// Waits for a change, then collects further changes until the tree
    /// has been quiet for the debounce duration.
    ///
    /// Returns `None` when the underlying watcher has shut down.
    pub async fn next_batch(&mut self) -> Option<ChangeBatch> {
        let first = self.next().await?;
        let started = Instant::now();
        let mut paths = BTreeSet::from([first.path]);

        loop {
            match timeout(self.config.debounce, self.rx.recv()).await {
                Ok(Some(event)) => paths.extend(self.config.filter(&event).into_iter().map(|c| c.path)),
                Ok(None) | Err(_) => break,
            }
        }

        Some(ChangeBatch {
            paths: paths.into_iter().collect(),
            started,
        })
    }
}

impl std::fmt::Debug for FileWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWatcher").field("config", &self.config).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, ModifyKind, RemoveKind};
    use std::fs;
    use tempfile::TempDir;
    use tokio::time::sleep;

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn test_change_kind_from_event_kind() {
        assert_eq!(
            FileChangeKind::from_event(&EventKind::Create(CreateKind::File)),
            Some(FileChangeKind::Created)
        );
        assert_eq!(
            FileChangeKind::from_event(&EventKind::Modify(ModifyKind::Data(DataChange::Any))),
            Some(FileChangeKind::Modified)
        );
        assert_eq!(
            FileChangeKind::from_event(&EventKind::Remove(RemoveKind::File)),
            Some(FileChangeKind::Deleted)
        );
        assert_eq!(FileChangeKind::from_event(&EventKind::Access(AccessKind::Any)), None);
    }

    #[test]
    fn test_filter_by_extension_and_name() {
        let config = FileWatcherConfig {
            extensions: ["rs".to_string()].into_iter().collect(),
            ignored_names: ["daedalus_endpoints.rs".to_string()].into_iter().collect(),
            ..Default::default()
        };
        let modify = EventKind::Modify(ModifyKind::Data(DataChange::Any));

        assert_eq!(config.filter(&event(modify, "src/lib.rs")).len(), 1);
        assert!(config.filter(&event(modify, "README.md")).is_empty());
        assert!(config.filter(&event(modify, "src/daedalus_endpoints.rs")).is_empty());
        assert!(config.filter(&event(EventKind::Access(AccessKind::Any), "src/lib.rs")).is_empty());
    }

    #[test]
    fn test_default_config() {
        let config = FileWatcherConfig::default();
        assert!(config.paths.is_empty());
        assert_eq!(config.debounce, Duration::from_millis(200));
        assert!(config.recursive);
    }

    #[test]
    fn test_watch_path_not_found() {
        let result = FileWatcherBuilder::new().watch_path("/nonexistent/path");
        assert!(matches!(result, Err(ConfigError::MissingPath { .. })));
    }

    #[test]
    fn test_watch_path_optional_not_found() {
        let builder = FileWatcherBuilder::new().watch_path_optional("/nonexistent/path");
        assert!(builder.config.paths.is_empty());
    }

    #[test]
    fn test_build_no_paths() {
        let result = FileWatcherBuilder::new().build();
        assert!(matches!(result, Err(ConfigError::Watch { .. })));
    }

    #[tokio::test]
    async fn test_batch_collects_changes() {
        let dir = TempDir::new().unwrap();
        let lib = dir.path().join("lib.rs");
        fs::write(&lib, "fn a() {}").unwrap();

        let mut watcher = FileWatcher::builder()
            .with_debounce(Duration::from_millis(50))
            .watch_path(dir.path())
            .unwrap()
            .watch_extensions(&["rs"])
            .build()
            .unwrap();

        sleep(Duration::from_millis(100)).await;
        fs::write(&lib, "fn b() {}").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        // File system events can be unreliable in CI; only check what arrives.
        if let Ok(Some(batch)) = timeout(Duration::from_secs(2), watcher.next_batch()).await {
            assert!(batch
                .paths
                .iter()
                .all(|p| p.extension().and_then(|e| e.to_str()) == Some("rs")));
        }
    }
}
