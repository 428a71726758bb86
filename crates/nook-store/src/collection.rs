use std::marker::PhantomData;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use serde::de::{Deserialize, DeserializeOwned};
use serde_json::Value;
use tracing::{debug, warn};

use crate::backend::CollectionBackend;
use crate::error::{StoreError, StoreResult};

/// A named, whole-file-persisted ordered sequence of `T`.
///
/// Reads are permissive: a missing, empty, `null` or malformed collection loads
/// as an empty sequence, and array entries that fail to decode are skipped.
/// Mutations go through [`Collection::update`], which serializes
/// read-modify-write cycles on this collection behind a mutex.
pub struct Collection<T> {
    name: String,
    backend: Arc<dyn CollectionBackend>,
    update_lock: Mutex<()>,
    _record: PhantomData<fn() -> T>,
}

impl<T> Collection<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(name: impl Into<String>, backend: Arc<dyn CollectionBackend>) -> Self {
        Self {
            name: name.into(),
            backend,
            update_lock: Mutex::new(()),
            _record: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Create the collection as `[]` if it has never been written.
    pub fn ensure(&self) -> StoreResult<()> {
        if !self.backend.exists(&self.name)? {
            debug!("Initialising empty collection {}", self.name);
            self.replace(&[])?;
        }
        Ok(())
    }

    /// Load every decodable record in stored order.
    pub fn load(&self) -> Vec<T> {
        self.read_entries().records
    }

    fn read_entries(&self) -> Entries<T> {
        let mut entries = Entries {
            records: Vec::new(),
            undecodable: Vec::new(),
        };

        let bytes = match self.backend.read(&self.name) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return entries,
            Err(e) => {
                warn!("Reading collection {} failed, treating as empty: {}", self.name, e);
                return entries;
            }
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return entries;
        }

        let items = match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Array(items)) => items,
            Ok(Value::Null) => return entries,
            Ok(other) => {
                warn!(
                    "Collection {} holds a JSON {} instead of an array, treating as empty",
                    self.name,
                    json_kind(&other)
                );
                return entries;
            }
            Err(e) => {
                warn!("Collection {} is malformed, treating as empty: {}", self.name, e);
                return entries;
            }
        };

        for (index, item) in items.into_iter().enumerate() {
            match T::deserialize(&item) {
                Ok(record) => entries.records.push(record),
                Err(e) => {
                    warn!("Skipping undecodable record {} in {}: {}", index, self.name, e);
                    entries.undecodable.push(item);
                }
            }
        }
        entries
    }

    /// Overwrite the collection with `records`, pretty-printed.
    pub fn replace(&self, records: &[T]) -> StoreResult<()> {
        let bytes = serde_json::to_vec_pretty(records)?;
        self.backend.write(&self.name, &bytes)
    }

    /// Load, hand the records to `f`, and write them back if `f` succeeds.
    ///
    /// The collection's update lock is held for the whole cycle, so two
    /// concurrent updates cannot lose each other's changes. When `f` returns an
    /// error nothing is written. Entries that failed to decode are written back
    /// verbatim after the decoded records.
    pub fn update<R, E, F>(&self, f: F) -> Result<R, E>
    where
        F: FnOnce(&mut Vec<T>) -> Result<R, E>,
        E: From<StoreError>,
    {
        let _guard = self
            .update_lock
            .lock()
            .map_err(|_| StoreError::LockPoisoned(self.name.clone()))?;

        let Entries {
            mut records,
            undecodable,
        } = self.read_entries();
        let out = f(&mut records)?;

        if undecodable.is_empty() {
            self.replace(&records)?;
        } else {
            warn!(
                "Keeping {} undecodable record(s) in {} as stored",
                undecodable.len(),
                self.name
            );
            let mut values = records
                .iter()
                .map(serde_json::to_value)
                .collect::<Result<Vec<_>, _>>()
                .map_err(StoreError::from)?;
            values.extend(undecodable);
            let bytes = serde_json::to_vec_pretty(&values).map_err(StoreError::from)?;
            self.backend.write(&self.name, &bytes)?;
        }
        Ok(out)
    }
}

/// One read of a collection: decoded records plus the raw entries that did
/// not decode.
struct Entries<T> {
    records: Vec<T>,
    undecodable: Vec<Value>,
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
