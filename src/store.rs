use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use directories::BaseDirs;
use tempfile::Builder;

use crate::domain::PhamId;
use crate::error::VerifyError;

pub const ID_LIST_FILE: &str = "pham_ids.txt";

#[derive(Debug, Clone)]
pub struct Store {
    project_root: Utf8PathBuf,
    cache_root: Utf8PathBuf,
}

impl Store {
    pub fn new() -> Result<Self, VerifyError> {
        let cwd =
            std::env::current_dir().map_err(|err| VerifyError::Filesystem(err.to_string()))?;
        let project_root = Utf8PathBuf::from_path_buf(cwd.join(".starterator"))
            .map_err(|_| VerifyError::Filesystem("invalid project path".to_string()))?;

        let cache_root = BaseDirs::new()
            .and_then(|dirs| {
                Utf8PathBuf::from_path_buf(
                    dirs.home_dir().join(".cache").join("starterator-verify"),
                )
                .ok()
            })
            .ok_or_else(|| {
                VerifyError::Filesystem("unable to resolve cache directory".to_string())
            })?;

        Ok(Self {
            project_root,
            cache_root,
        })
    }

    pub fn new_with_paths(project_root: Utf8PathBuf, cache_root: Utf8PathBuf) -> Self {
        Self {
            project_root,
            cache_root,
        }
    }

    pub fn project_root(&self) -> &Utf8Path {
        &self.project_root
    }

    pub fn cache_root(&self) -> &Utf8Path {
        &self.cache_root
    }

    pub fn id_list_path(&self) -> Utf8PathBuf {
        self.project_root.join(ID_LIST_FILE)
    }

    pub fn dataset_dir(&self) -> Utf8PathBuf {
        self.cache_root.join("json")
    }

    pub fn dataset_path(&self, id: PhamId) -> Utf8PathBuf {
        self.dataset_dir().join(id.json_file_name())
    }

    pub fn dataset_exists(&self, id: PhamId) -> bool {
        self.dataset_path(id).as_std_path().exists()
    }

    pub fn ensure_project_root(&self) -> Result<(), VerifyError> {
        fs::create_dir_all(self.project_root.as_std_path())
            .map_err(|err| VerifyError::Filesystem(err.to_string()))
    }

    pub fn ensure_cache_root(&self) -> Result<(), VerifyError> {
        fs::create_dir_all(self.dataset_dir().as_std_path())
            .map_err(|err| VerifyError::Filesystem(err.to_string()))
    }

    pub fn read_dataset_bytes(&self, id: PhamId) -> Result<Vec<u8>, VerifyError> {
        let path = self.dataset_path(id);
        fs::read(path.as_std_path())
            .map_err(|err| VerifyError::Filesystem(format!("read {path}: {err}")))
    }

    /// Write through a sibling temp file so a reader never sees a partial document.
    pub fn write_bytes_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), VerifyError> {
        let parent = path
            .parent()
            .ok_or_else(|| VerifyError::Filesystem("invalid destination path".to_string()))?;
        fs::create_dir_all(parent.as_std_path())
            .map_err(|err| VerifyError::Filesystem(err.to_string()))?;
        let temp = Builder::new()
            .prefix("stv-file")
            .tempfile_in(parent.as_std_path())
            .map_err(|err| VerifyError::Filesystem(err.to_string()))?;
        fs::write(temp.path(), content).map_err(|err| VerifyError::Filesystem(err.to_string()))?;
        temp.persist(path.as_std_path())
            .map_err(|err| VerifyError::Filesystem(err.to_string()))?;
        Ok(())
    }

    pub fn list_cached_ids(&self) -> Result<Vec<PhamId>, VerifyError> {
        let dir = self.dataset_dir();
        if !dir.as_std_path().exists() {
            return Ok(Vec::new());
        }
        let entries =
            fs::read_dir(dir.as_std_path()).map_err(|err| VerifyError::Filesystem(err.to_string()))?;
        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| VerifyError::Filesystem(err.to_string()))?;
            let path = entry.path();
            if path.extension().map(|ext| ext == "json").unwrap_or(false) {
                if let Some(id) = path
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .and_then(|stem| stem.parse::<PhamId>().ok())
                {
                    ids.push(id);
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}
