//! Ensemble persistence
//!
//! Ensembles live under one directory per token, one serialized member
//! per file. The store contract is a trait so the filesystem layout can
//! be swapped for any blob store without touching core logic.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use tracing::{error, info};

use crate::ensemble::Ensemble;
use crate::error::{RepscoreError, Result};
use crate::tree::RegressorTree;

/// Generate a new ensemble token: SHA-256 of a nanosecond-resolution
/// timestamp, hex-encoded.
pub fn new_token() -> String {
    let stamp = Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true);
    let mut hasher = Sha256::new();
    hasher.update(stamp.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Durable storage for trained ensembles, keyed by token.
pub trait EnsembleStore: Send + Sync {
    /// Write one serialized member under a token-scoped location,
    /// creating the location if absent.
    fn persist(&self, token: &str, member_index: usize, model: &RegressorTree) -> Result<()>;

    /// Load the ensemble stored under `token`, caching it in memory
    /// (replacing any previously cached ensemble). Concurrent callers
    /// share a single load.
    fn load(&self, token: &str) -> Result<Arc<Ensemble>>;

    /// Delete every persisted ensemble except `keep`. Idempotent and
    /// safe to call when no ensembles exist.
    fn evict(&self, keep: Option<&str>) -> Result<()>;
}

/// Filesystem-backed ensemble store
pub struct FsEnsembleStore {
    base_dir: PathBuf,
    cache: RwLock<Option<(String, Arc<Ensemble>)>>,
}

impl FsEnsembleStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir)?;
        Ok(Self {
            base_dir,
            cache: RwLock::new(None),
        })
    }

    fn token_dir(&self, token: &str) -> PathBuf {
        self.base_dir.join(token)
    }

    fn member_path(&self, token: &str, member_index: usize) -> PathBuf {
        self.token_dir(token).join(format!("model_{member_index}.json"))
    }

    fn read_from_disk(&self, token: &str) -> Result<Ensemble> {
        info!(token, "Loading ensemble model");
        let dir = self.token_dir(token);
        if !dir.is_dir() {
            error!(token, "Ensemble model not found");
            return Err(RepscoreError::EnsembleNotFound(token.to_string()));
        }

        // Member files are model_<idx>.json; order by index so the
        // ensemble keeps its training order.
        let mut entries: Vec<(usize, PathBuf)> = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if let Some(idx) = member_index_of(&path) {
                entries.push((idx, path));
            }
        }
        entries.sort_by_key(|(idx, _)| *idx);

        let mut members = Vec::with_capacity(entries.len());
        for (idx, path) in &entries {
            let contents = fs::read_to_string(path)?;
            let tree: RegressorTree = serde_json::from_str(&contents)?;
            members.push(tree);
            info!(token, member = idx, "Model loaded");
        }

        let ensemble = Ensemble::from_members(members).ok_or_else(|| {
            error!(token, "Empty ensemble model");
            RepscoreError::EmptyEnsemble(token.to_string())
        })?;
        info!(token, members = ensemble.len(), "Ensemble model loaded successfully");
        Ok(ensemble)
    }
}

impl EnsembleStore for FsEnsembleStore {
    fn persist(&self, token: &str, member_index: usize, model: &RegressorTree) -> Result<()> {
        fs::create_dir_all(self.token_dir(token))?;
        let json = serde_json::to_string(model)?;
        fs::write(self.member_path(token, member_index), json)?;
        Ok(())
    }

    fn load(&self, token: &str) -> Result<Arc<Ensemble>> {
        if let Some((cached_token, ensemble)) = self.cache.read().as_ref() {
            if cached_token == token {
                return Ok(Arc::clone(ensemble));
            }
        }

        // Double-checked under the write lock so concurrent requests
        // before the cache is warm trigger a single disk load.
        let mut guard = self.cache.write();
        if let Some((cached_token, ensemble)) = guard.as_ref() {
            if cached_token == token {
                return Ok(Arc::clone(ensemble));
            }
        }
        let ensemble = Arc::new(self.read_from_disk(token)?);
        *guard = Some((token.to_string(), Arc::clone(&ensemble)));
        Ok(ensemble)
    }

    fn evict(&self, keep: Option<&str>) -> Result<()> {
        if !self.base_dir.is_dir() {
            return Ok(());
        }
        for entry in fs::read_dir(&self.base_dir)? {
            let path = entry?.path();
            if !path.is_dir() {
                continue;
            }
            let name = match path.file_name().and_then(|n| n.to_str()) {
                Some(n) => n.to_string(),
                None => continue,
            };
            if Some(name.as_str()) != keep {
                info!(token = %name, "Deleting ensemble model");
                fs::remove_dir_all(&path)?;

                let mut guard = self.cache.write();
                if guard.as_ref().map(|(t, _)| t.as_str()) == Some(name.as_str()) {
                    *guard = None;
                }
            }
        }
        Ok(())
    }
}

fn member_index_of(path: &Path) -> Option<usize> {
    let name = path.file_name()?.to_str()?;
    name.strip_prefix("model_")?
        .strip_suffix(".json")?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use tempfile::TempDir;

    fn fitted_tree(value: f64) -> RegressorTree {
        let x = array![[0.0], [1.0]];
        let y = array![value, value];
        let mut tree = RegressorTree::new();
        tree.fit(&x, &y).unwrap();
        tree
    }

    #[test]
    fn test_token_unique_and_hex() {
        let a = new_token();
        let b = new_token();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_persist_and_load() {
        let dir = TempDir::new().unwrap();
        let store = FsEnsembleStore::new(dir.path()).unwrap();

        store.persist("tok", 0, &fitted_tree(0.2)).unwrap();
        store.persist("tok", 1, &fitted_tree(0.4)).unwrap();

        let ensemble = store.load("tok").unwrap();
        assert_eq!(ensemble.len(), 2);
        assert_eq!(ensemble.n_features(), 1);

        let scores = ensemble.predict_batch(&[vec![0.5]]).unwrap();
        assert!((scores[0] - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_load_unknown_token() {
        let dir = TempDir::new().unwrap();
        let store = FsEnsembleStore::new(dir.path()).unwrap();

        let err = store.load("missing").unwrap_err();
        assert!(matches!(err, RepscoreError::EnsembleNotFound(_)));
    }

    #[test]
    fn test_load_empty_ensemble() {
        let dir = TempDir::new().unwrap();
        let store = FsEnsembleStore::new(dir.path()).unwrap();
        fs::create_dir_all(dir.path().join("tok")).unwrap();

        let err = store.load("tok").unwrap_err();
        assert!(matches!(err, RepscoreError::EmptyEnsemble(_)));
    }

    #[test]
    fn test_evict_keeps_only_named_token() {
        let dir = TempDir::new().unwrap();
        let store = FsEnsembleStore::new(dir.path()).unwrap();

        store.persist("old", 0, &fitted_tree(0.1)).unwrap();
        store.persist("new", 0, &fitted_tree(0.2)).unwrap();

        store.evict(Some("new")).unwrap();
        assert!(!dir.path().join("old").exists());
        assert!(dir.path().join("new").exists());

        // Evicting everything
        store.evict(None).unwrap();
        assert!(!dir.path().join("new").exists());

        // Idempotent with nothing left
        store.evict(None).unwrap();
    }

    #[test]
    fn test_evict_invalidates_cache() {
        let dir = TempDir::new().unwrap();
        let store = FsEnsembleStore::new(dir.path()).unwrap();

        store.persist("tok", 0, &fitted_tree(0.1)).unwrap();
        store.load("tok").unwrap();

        store.evict(None).unwrap();
        let err = store.load("tok").unwrap_err();
        assert!(matches!(err, RepscoreError::EnsembleNotFound(_)));
    }

    #[test]
    fn test_cache_replaced_on_new_token() {
        let dir = TempDir::new().unwrap();
        let store = FsEnsembleStore::new(dir.path()).unwrap();

        store.persist("a", 0, &fitted_tree(0.1)).unwrap();
        store.persist("b", 0, &fitted_tree(0.9)).unwrap();

        let first = store.load("a").unwrap();
        assert!((first.predict_batch(&[vec![0.0]]).unwrap()[0] - 0.1).abs() < 1e-12);

        let second = store.load("b").unwrap();
        assert!((second.predict_batch(&[vec![0.0]]).unwrap()[0] - 0.9).abs() < 1e-12);
    }
}
