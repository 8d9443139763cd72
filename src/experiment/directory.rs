//! On-disk experiment store.
//!
//! Reads the layout the training pipeline writes: one directory per
//! experiment, named by its decimal id.
//!
//! ```text
//! <root>/<id>/meta.json       date, host, config_name, environment, hyperparameters, ...
//! <root>/<id>/progress.json   per-iteration rewards (optional)
//! <root>/<id>/*               plots, model diagram and other artifacts
//! ```
//!
//! Reads scan the directory on every call, so runs started by the pipeline
//! show up without a restart. Mutations are serialized behind one async lock.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::store::validate_artifact_name;
use super::{
    ExperimentId, ExperimentRecord, ExperimentStore, SuccessClass, TrainingProgress,
    DEFAULT_CONFIG_NAME,
};
use crate::{Error, Result};

/// Metadata file every experiment directory must contain.
pub const META_FILE: &str = "meta.json";

/// Training statistics file; missing means no completed iteration.
pub const PROGRESS_FILE: &str = "progress.json";

const META_TMP_FILE: &str = "meta.json.tmp";
const TRASH_PREFIX: &str = ".deleted-";

/// Experiment registry over a directory tree written by the training pipeline.
#[derive(Debug)]
pub struct DirectoryExperimentStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl DirectoryExperimentStore {
    /// Create a store rooted at `root`. Nothing is touched until [`open`].
    ///
    /// [`open`]: ExperimentStore::open
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Root directory holding one sub-directory per experiment.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of one experiment.
    #[must_use]
    pub fn experiment_dir(&self, id: ExperimentId) -> PathBuf {
        self.root.join(id.to_string())
    }

    fn trash_dir(&self, id: ExperimentId) -> PathBuf {
        self.root.join(format!("{TRASH_PREFIX}{id}"))
    }

    async fn load(&self, id: ExperimentId) -> Result<Option<ExperimentRecord>> {
        let dir = self.experiment_dir(id);
        let Some(meta) = read_meta(&dir.join(META_FILE)).await? else {
            return Ok(None);
        };
        let progress = read_progress(&dir.join(PROGRESS_FILE)).await?;
        Ok(Some(record_from_meta(id, &meta, progress.as_ref())))
    }

    /// A directory only counts as an experiment once its metadata exists.
    async fn is_experiment_dir(&self, id: ExperimentId) -> Result<bool> {
        let meta = self.experiment_dir(id).join(META_FILE);
        match tokio::fs::metadata(&meta).await {
            Ok(metadata) => Ok(metadata.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(storage_error(&meta, &e)),
        }
    }
}

/// Parse a directory name into an id, ignoring hidden and non-canonical names.
#[must_use]
pub fn parse_dir_name(name: &str) -> Option<ExperimentId> {
    if name.starts_with('.') {
        return None;
    }
    let id: ExperimentId = name.parse().ok()?;
    (id.to_string() == name).then_some(id)
}

/// Build a record from a parsed `meta.json` and the run's progress.
///
/// `progress` is `None` when the progress file could not be read; the
/// record's iteration count is then unknown.
#[must_use]
pub fn record_from_meta(
    id: ExperimentId,
    meta: &Map<String, Value>,
    progress: Option<&TrainingProgress>,
) -> ExperimentRecord {
    let text = |key: &str| meta.get(key).and_then(Value::as_str).unwrap_or_default();
    let table = |key: &str| meta.get(key).and_then(Value::as_object).cloned().unwrap_or_default();

    let env_meta = table("environment");
    let env = env_meta
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let config_name = match text("config_name") {
        "" => DEFAULT_CONFIG_NAME,
        name => name,
    };

    let builder = ExperimentRecord::builder(id, env)
        .config_name(config_name)
        .hps(table("hyperparameters"))
        .env_meta(env_meta)
        .date(text("date"))
        .host(text("host"));
    let builder = match progress {
        Some(progress) => builder.progress(progress),
        None => builder.unknown_progress(),
    };

    builder
        .bookmark(meta.get("bookmark").and_then(Value::as_bool).unwrap_or(false))
        .success(SuccessClass::from_metadata(meta.get("success")))
        .build()
}

fn storage_error(path: &Path, err: &dyn std::fmt::Display) -> Error {
    Error::StorageError(format!("{}: {err}", path.display()))
}

async fn read_meta(path: &Path) -> Result<Option<Map<String, Value>>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(storage_error(path, &e)),
    };
    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(meta)) => Ok(Some(meta)),
        Ok(_) => Err(storage_error(path, &"metadata is not a JSON object")),
        Err(e) => Err(storage_error(path, &e)),
    }
}

/// Missing progress means no completed iteration; unreadable progress means
/// the iteration count is unknown.
async fn read_progress(path: &Path) -> Result<Option<TrainingProgress>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Some(TrainingProgress::default())),
        Err(e) => return Err(storage_error(path, &e)),
    };
    match TrainingProgress::from_json(&bytes) {
        Ok(progress) => Ok(Some(progress)),
        Err(e) => {
            // Usually a rewrite in progress
            warn!(path = %path.display(), error = %e, "unreadable progress, iterations unknown");
            Ok(None)
        }
    }
}

async fn write_meta(dir: &Path, meta: &Map<String, Value>) -> Result<()> {
    let tmp = dir.join(META_TMP_FILE);
    let target = dir.join(META_FILE);
    let bytes = serde_json::to_vec(meta)?;
    tokio::fs::write(&tmp, bytes)
        .await
        .map_err(|e| storage_error(&tmp, &e))?;
    tokio::fs::rename(&tmp, &target)
        .await
        .map_err(|e| storage_error(&target, &e))
}

impl ExperimentStore for DirectoryExperimentStore {
    async fn open(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| storage_error(&self.root, &e))?;

        // Finish deletions interrupted by a crash
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| storage_error(&self.root, &e))?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_name().to_string_lossy().starts_with(TRASH_PREFIX) {
                if let Err(e) = tokio::fs::remove_dir_all(entry.path()).await {
                    warn!(path = %entry.path().display(), error = %e, "could not purge deleted experiment");
                }
            }
        }

        info!(root = %self.root.display(), "opened experiment directory");
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        info!(root = %self.root.display(), "closed experiment directory");
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ExperimentRecord>> {
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| storage_error(&self.root, &e))?;

        let mut records = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let Some(id) = entry.file_name().to_str().and_then(parse_dir_name) else {
                continue;
            };
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            match self.load(id).await {
                Ok(Some(record)) => records.push(record),
                Ok(None) => debug!(%id, "experiment directory without metadata, skipping"),
                Err(e) => warn!(%id, error = %e, "skipping unreadable experiment"),
            }
        }
        Ok(records)
    }

    async fn ids(&self) -> Result<Vec<ExperimentId>> {
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| storage_error(&self.root, &e))?;

        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let Some(id) = entry.file_name().to_str().and_then(parse_dir_name) else {
                continue;
            };
            if self.is_experiment_dir(id).await? {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    async fn get(&self, id: ExperimentId) -> Result<Option<ExperimentRecord>> {
        self.load(id).await
    }

    async fn toggle_bookmark(&self, id: ExperimentId) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let dir = self.experiment_dir(id);
        let mut meta = read_meta(&dir.join(META_FILE))
            .await?
            .ok_or(Error::NotFound(id))?;

        let bookmark = !meta.get("bookmark").and_then(Value::as_bool).unwrap_or(false);
        meta.insert("bookmark".to_string(), Value::Bool(bookmark));
        write_meta(&dir, &meta).await?;
        Ok(bookmark)
    }

    async fn remove(&self, id: ExperimentId) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        if !self.is_experiment_dir(id).await? {
            return Err(Error::NotFound(id));
        }

        let dir = self.experiment_dir(id);
        let trash = self.trash_dir(id);
        if tokio::fs::metadata(&trash).await.is_ok() {
            // Leftover from an earlier failed cleanup
            let _ = tokio::fs::remove_dir_all(&trash).await;
        }
        tokio::fs::rename(&dir, &trash)
            .await
            .map_err(|e| storage_error(&dir, &e))?;

        if let Err(e) = tokio::fs::remove_dir_all(&trash).await {
            warn!(%id, path = %trash.display(), error = %e, "experiment removed but files remain");
        }
        Ok(())
    }

    async fn artifacts(&self, id: ExperimentId) -> Result<Vec<String>> {
        if !self.is_experiment_dir(id).await? {
            return Err(Error::NotFound(id));
        }

        let dir = self.experiment_dir(id);
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| storage_error(&dir, &e))?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if matches!(name.as_str(), META_FILE | PROGRESS_FILE | META_TMP_FILE)
                || validate_artifact_name(&name).is_err()
            {
                continue;
            }
            if entry.file_type().await?.is_file() {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    async fn read_artifact(&self, id: ExperimentId, name: &str) -> Result<Vec<u8>> {
        validate_artifact_name(name)?;
        if !self.is_experiment_dir(id).await? {
            return Err(Error::NotFound(id));
        }

        let path = self.experiment_dir(id).join(name);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(Error::ArtifactNotFound {
                id,
                name: name.to_string(),
            }),
            Err(e) => Err(storage_error(&path, &e)),
        }
    }
}
