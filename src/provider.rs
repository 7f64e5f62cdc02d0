use camino::Utf8PathBuf;
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::{Dataset, PhamId};
use crate::error::VerifyError;
use crate::starterator::StarteratorClient;
use crate::store::Store;

/// Source of parsed pham datasets for the verifier.
pub trait DatasetProvider {
    fn get_dataset(&self, id: PhamId) -> Result<Dataset, VerifyError>;
}

#[derive(Debug, Clone, Copy)]
pub struct ProviderOptions {
    pub use_network: bool,
    pub force_refresh: bool,
}

impl Default for ProviderOptions {
    fn default() -> Self {
        Self {
            use_network: true,
            force_refresh: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshSummary {
    pub requested: usize,
    pub succeeded: usize,
    pub failed: Vec<PhamId>,
}

/// Local JSON cache in front of the Starterator server.
pub struct CachedProvider<C: StarteratorClient> {
    store: Store,
    client: C,
    options: ProviderOptions,
}

impl<C: StarteratorClient> CachedProvider<C> {
    pub fn new(store: Store, client: C, options: ProviderOptions) -> Self {
        Self {
            store,
            client,
            options,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Make sure `<cache>/json/<id>.json` exists, downloading it when missing or
    /// when `force` is set. The body is validated as JSON before it is written.
    pub fn ensure_local(&self, id: PhamId, force: bool) -> Result<Utf8PathBuf, VerifyError> {
        let path = self.store.dataset_path(id);
        if !force && self.store.dataset_exists(id) {
            return Ok(path);
        }
        if !self.options.use_network {
            return Err(VerifyError::DatasetNotFound(path.to_string()));
        }

        let body = self.client.fetch_dataset(id)?;
        serde_json::from_slice::<serde_json::Value>(&body)
            .map_err(|err| VerifyError::FormatFailure(format!("pham {id}: {err}")))?;
        self.store.ensure_cache_root()?;
        Store::write_bytes_atomic(&path, &body)?;
        info!(pham = %id, %path, "cached pham dataset");
        Ok(path)
    }

    /// Re-download every id, carrying on past individual failures.
    pub fn refresh_all(&self, ids: &[PhamId]) -> RefreshSummary {
        let mut failed = Vec::new();
        for &id in ids {
            if let Err(err) = self.ensure_local(id, true) {
                warn!(pham = %id, error = %err, "refresh failed");
                failed.push(id);
            }
        }
        RefreshSummary {
            requested: ids.len(),
            succeeded: ids.len() - failed.len(),
            failed,
        }
    }
}

impl<C: StarteratorClient> DatasetProvider for CachedProvider<C> {
    fn get_dataset(&self, id: PhamId) -> Result<Dataset, VerifyError> {
        self.ensure_local(id, self.options.force_refresh)?;
        let bytes = self.store.read_dataset_bytes(id)?;
        serde_json::from_slice::<Dataset>(&bytes)
            .map_err(|err| VerifyError::FormatFailure(format!("pham {id}: {err}")))
    }
}
