use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    error::WeatherError,
    model::{HistoryList, Location},
    store::KeyValueStore,
};

/// Key under which the serialized history lives.
pub const HISTORY_KEY: &str = "cityHistory";

/// Recently viewed places, persisted through a [`KeyValueStore`].
///
/// Every failure is recovered here: an unreadable or corrupt stored list
/// loads as empty, and a failed write keeps the in-memory list.
#[derive(Debug)]
pub struct HistoryStore {
    store: Arc<dyn KeyValueStore>,
    list: HistoryList,
}

impl HistoryStore {
    /// Opens the store and reads whatever is persisted.
    pub fn open(store: Arc<dyn KeyValueStore>) -> Self {
        let list = Self::read(store.as_ref());
        Self { store, list }
    }

    /// Re-reads the persisted list, replacing the in-memory copy.
    pub fn load(&mut self) -> HistoryList {
        self.list = Self::read(self.store.as_ref());
        self.list.clone()
    }

    pub fn list(&self) -> &HistoryList {
        &self.list
    }

    pub fn find(&self, name: &str) -> Option<&Location> {
        self.list.find(name)
    }

    /// Moves `location` to the front, persists and returns the new list.
    pub fn record(&mut self, location: Location) -> HistoryList {
        let updated = self.list.with_recorded(location);

        if updated != self.list {
            if let Err(err) = self.write(&updated) {
                warn!(error = %err, "failed to persist history; keeping it in memory");
            }
            self.list = updated;
        }

        self.list.clone()
    }

    fn write(&self, list: &HistoryList) -> Result<(), WeatherError> {
        let json = serde_json::to_string(list)
            .map_err(|err| WeatherError::Persistence(err.to_string()))?;
        self.store.set(HISTORY_KEY, &json)
    }

    fn read(store: &dyn KeyValueStore) -> HistoryList {
        let raw = match store.get(HISTORY_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("no stored history");
                return HistoryList::default();
            }
            Err(err) => {
                warn!(error = %err, "could not read stored history");
                return HistoryList::default();
            }
        };

        match serde_json::from_str::<HistoryList>(&raw) {
            Ok(list) => list,
            Err(err) => {
                warn!(error = %err, "stored history is corrupt; starting empty");
                HistoryList::default()
            }
        }
    }
}
