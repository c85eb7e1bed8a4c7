use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::error::SurveyError;
use crate::models::Project;

/// Opaque byte storage addressed by key.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, SurveyError>;
    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), SurveyError>;
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, SurveyError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), SurveyError> {
        self.entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

/// One `<key>.json` file per key inside a directory.
#[derive(Clone, Debug)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, SurveyError> {
        let root = root.into();
        fs::create_dir_all(&root)
            .map_err(|e| SurveyError::Storage(format!("{}: {e}", root.display())))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, SurveyError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(SurveyError::Storage(format!("invalid key '{key}'")));
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, SurveyError> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SurveyError::Storage(format!("{}: {e}", path.display()))),
        }
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), SurveyError> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)
            .and_then(|_| fs::rename(&tmp, &path))
            .map_err(|e| SurveyError::Storage(format!("{}: {e}", path.display())))
    }
}

/// Ordered collection of projects persisted under a single key.
///
/// Every mutation is a whole-collection read-modify-write; a failed operation
/// writes nothing.
#[derive(Clone, Debug)]
pub struct SurveyStore<S> {
    backend: S,
    key: String,
}

impl<S: KeyValueStore> SurveyStore<S> {
    pub const DEFAULT_KEY: &'static str = "results";

    pub fn new(backend: S) -> Self {
        Self::with_key(backend, Self::DEFAULT_KEY)
    }

    pub fn with_key(backend: S, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn into_inner(self) -> S {
        self.backend
    }

    pub fn load_all(&self) -> Result<Vec<Project>, SurveyError> {
        match self.backend.get(&self.key)? {
            None => Ok(Vec::new()),
            Some(bytes) => {
                serde_json::from_slice(&bytes).map_err(|e| SurveyError::CorruptStore(e.to_string()))
            }
        }
    }

    pub fn len(&self) -> Result<usize, SurveyError> {
        Ok(self.load_all()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, SurveyError> {
        Ok(self.len()? == 0)
    }

    pub fn get(&self, index: usize) -> Result<Project, SurveyError> {
        self.load_all()?
            .into_iter()
            .nth(index)
            .ok_or(SurveyError::NotFound(index))
    }

    /// Add `project` at the end and return its index.
    pub fn append(&mut self, project: Project) -> Result<usize, SurveyError> {
        let mut projects = self.load_all()?;
        let name = project.name.clone();
        projects.push(project);
        self.save_all(&projects)?;
        let index = projects.len() - 1;
        info!("appended project '{name}' at index {index}");
        Ok(index)
    }

    pub fn replace_at(&mut self, index: usize, project: Project) -> Result<(), SurveyError> {
        let mut projects = self.load_all()?;
        let len = projects.len();
        let slot = projects
            .get_mut(index)
            .ok_or(SurveyError::IndexOutOfRange { index, len })?;
        *slot = project;
        self.save_all(&projects)?;
        debug!("replaced project at index {index}");
        Ok(())
    }

    fn save_all(&mut self, projects: &[Project]) -> Result<(), SurveyError> {
        let bytes =
            serde_json::to_vec(projects).map_err(|e| SurveyError::Storage(e.to_string()))?;
        self.backend.set(&self.key, &bytes)
    }
}
