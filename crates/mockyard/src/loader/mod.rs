//! Definition files loader.
//!
//! Reads route and collection definitions from a folder:
//!
//! ```text
//! <path>/
//!   collections.{json,yaml,yml}   array of collections
//!   routes/**/*.{json,yaml,yml}   arrays of routes, or single routes
//! ```
//!
//! Every file is parsed before the engine is touched, and routes and
//! collections are handed over in one [`Mock::load_definitions`] call. With
//! watching enabled, changes below the folder trigger a debounced reload.

use crate::alerts::Alerts;
use crate::mock::{LoadSummary, Mock, MockError};
use mockyard_schema::Value;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

const COLLECTIONS_FILES: [&str; 3] = ["collections.json", "collections.yaml", "collections.yml"];
const ROUTES_FOLDER: &str = "routes";
const EXTENSIONS: [&str; 3] = ["json", "yaml", "yml"];

/// Quiet period before a burst of file events triggers a reload.
const DEBOUNCE: Duration = Duration::from_millis(200);

/// Why a definitions file was skipped.
#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("failed to read file: {0}")]
    Read(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("expected {0}")]
    Shape(&'static str),
}

/// Raw definitions read from disk.
#[derive(Debug, Default)]
pub struct Definitions {
    pub routes: Vec<Value>,
    pub collections: Vec<Value>,
}

/// Loads definition files into a [`Mock`].
pub struct FilesLoader {
    path: PathBuf,
    mock: Arc<Mock>,
    alerts: Alerts,
}

impl FilesLoader {
    /// `alerts` is the loader's own scope (`files` in the binary).
    pub fn new(path: impl Into<PathBuf>, mock: Arc<Mock>, alerts: Alerts) -> Self {
        Self {
            path: path.into(),
            mock,
            alerts,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every definitions file below the loader's folder.
    pub fn read_definitions(&self) -> Definitions {
        read_definitions(&self.path, &self.alerts)
    }

    /// Read the files and swap them into the engine.
    pub fn load(&self) -> Result<LoadSummary, MockError> {
        let definitions = self.read_definitions();
        self.mock
            .load_definitions(definitions.routes, definitions.collections)
    }

    /// Reload on every change below the folder until the returned watcher
    /// is dropped. Must be called inside a tokio runtime.
    pub fn watch(self: &Arc<Self>) -> Result<FilesWatcher, notify::Error> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if !event.kind.is_access() => {
                    let _ = tx.send(());
                }
                Ok(_) => {}
                Err(e) => error!("Definitions watch error: {}", e),
            },
            notify::Config::default(),
        )?;
        watcher.watch(&self.path, RecursiveMode::Recursive)?;

        let loader = Arc::clone(self);
        let task = tokio::spawn(async move {
            while rx.recv().await.is_some() {
                loop {
                    match tokio::time::timeout(DEBOUNCE, rx.recv()).await {
                        Ok(Some(())) => continue,
                        Ok(None) => return,
                        Err(_) => break,
                    }
                }
                info!(path = %loader.path.display(), "Definition files changed, reloading");
                let reload = Arc::clone(&loader);
                match tokio::task::spawn_blocking(move || reload.load()).await {
                    Ok(Ok(_)) => {}
                    Ok(Err(e)) => warn!("Definitions reload rejected: {}", e),
                    Err(e) => error!("Definitions reload task failed: {}", e),
                }
            }
        });

        info!(path = %self.path.display(), "Watching definition files");
        Ok(FilesWatcher {
            _watcher: watcher,
            task,
        })
    }
}

/// Stops watching when dropped.
pub struct FilesWatcher {
    _watcher: RecommendedWatcher,
    task: JoinHandle<()>,
}

impl Drop for FilesWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Read every definitions file below `path`. Unreadable files are alerted
/// in `alerts` and skipped.
pub fn read_definitions(path: &Path, alerts: &Alerts) -> Definitions {
    let file_alerts = alerts.collection("load");
    file_alerts.clean();

    if !path.is_dir() {
        alerts.set(
            "path",
            format!("Folder \"{}\" was not found", path.display()),
            None,
        );
        return Definitions::default();
    }
    alerts.remove("path");

    let mut definitions = Definitions::default();

    if let Some(file) = COLLECTIONS_FILES
        .iter()
        .map(|name| path.join(name))
        .find(|file| file.is_file())
    {
        match read_file(&file) {
            Ok(serde_json::Value::Array(items)) => {
                definitions
                    .collections
                    .extend(items.into_iter().map(Value::from));
            }
            Ok(_) => alert_file(&file_alerts, path, &file, &FileError::Shape("an array of collections")),
            Err(e) => alert_file(&file_alerts, path, &file, &e),
        }
    } else {
        debug!(path = %path.display(), "No collections file found");
    }

    let mut files = Vec::new();
    let routes_folder = path.join(ROUTES_FOLDER);
    if let Err(e) = collect_files(&routes_folder, &mut files) {
        if routes_folder.exists() {
            alert_file(&file_alerts, path, &routes_folder, &FileError::Read(e));
        }
    }
    files.sort();

    for file in files {
        match read_file(&file) {
            Ok(serde_json::Value::Array(items)) => {
                definitions.routes.extend(items.into_iter().map(Value::from));
            }
            Ok(item @ serde_json::Value::Object(_)) => definitions.routes.push(Value::from(item)),
            Ok(_) => alert_file(
                &file_alerts,
                path,
                &file,
                &FileError::Shape("an array of routes or a single route"),
            ),
            Err(e) => alert_file(&file_alerts, path, &file, &e),
        }
    }

    debug!(
        routes = definitions.routes.len(),
        collections = definitions.collections.len(),
        "Definition files read"
    );
    definitions
}

/// Alert id is the file path relative to the definitions folder.
fn alert_file(alerts: &Alerts, root: &Path, file: &Path, error: &FileError) {
    let relative = file.strip_prefix(root).unwrap_or(file);
    let id = relative.to_string_lossy().replace('\\', "/");
    alerts.set(&id, format!("Error loading file {}", file.display()), Some(error));
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(&path, out)?;
        } else if has_definitions_extension(&path) {
            out.push(path);
        }
    }
    Ok(())
}

fn has_definitions_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

fn read_file(path: &Path) -> Result<serde_json::Value, FileError> {
    let contents = std::fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        Ok(serde_json::from_str(&contents)?)
    } else {
        Ok(serde_yaml::from_str(&contents)?)
    }
}
