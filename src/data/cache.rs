use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use parking_lot::RwLock;

use super::loader::{self, DataSource};
use super::model::Table;
use crate::error::{InsightsError, Result};

type Slot = Arc<OnceLock<Result<Arc<Table>>>>;

/// Process-wide dataset cache keyed by [`DataSource`].
///
/// Each source is loaded at most once; the outcome (table or failure) is kept
/// for the lifetime of the cache. There is no invalidation.
pub struct DatasetCache {
    slots: RwLock<HashMap<DataSource, Slot>>,
    fetch: Box<dyn Fn(&DataSource) -> anyhow::Result<Table> + Send + Sync>,
}

impl DatasetCache {
    /// Cache backed by [`loader::load`] with the given fetch timeout.
    pub fn new(timeout: Duration) -> Self {
        Self::with_fetcher(move |source| loader::load(source, timeout))
    }

    /// Cache backed by a custom fetch function.
    pub fn with_fetcher<F>(fetch: F) -> Self
    where
        F: Fn(&DataSource) -> anyhow::Result<Table> + Send + Sync + 'static,
    {
        DatasetCache {
            slots: RwLock::new(HashMap::new()),
            fetch: Box::new(fetch),
        }
    }

    /// Return the table for `source`, loading it on first use.
    pub fn get(&self, source: &DataSource) -> Result<Arc<Table>> {
        let slot = self.slot(source);
        slot.get_or_init(|| {
            log::info!("Loading dataset {source}");
            match (self.fetch)(source) {
                Ok(table) => {
                    log::info!(
                        "Loaded {} rows with columns {:?} from {source}",
                        table.len(),
                        table.column_names
                    );
                    Ok(Arc::new(table))
                }
                Err(e) => {
                    log::error!("Failed to load {source}: {e:#}");
                    Err(InsightsError::data_unavailable(&e))
                }
            }
        })
        .clone()
    }

    /// Whether `source` has been attempted (successfully or not).
    pub fn is_loaded(&self, source: &DataSource) -> bool {
        self.slots
            .read()
            .get(source)
            .is_some_and(|slot| slot.get().is_some())
    }

    fn slot(&self, source: &DataSource) -> Slot {
        if let Some(slot) = self.slots.read().get(source) {
            return slot.clone();
        }
        self.slots
            .write()
            .entry(source.clone())
            .or_default()
            .clone()
    }
}
