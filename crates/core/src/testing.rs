//! In-memory object store for tests
//!
//! Lists keys in lexical order with a configurable page size, records every
//! call, and can be told to fail a specific put or get call.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Mutex;

use crate::error::{Error, Result};
use crate::traits::{ListOptions, ListingPage, ObjectStore};

#[derive(Debug, Default)]
struct State {
    objects: BTreeMap<(String, String), Vec<u8>>,
    markers: Vec<Option<String>>,
    puts: Vec<String>,
    gets: Vec<String>,
    deletes: Vec<Vec<String>>,
    failing_puts: HashSet<usize>,
    failing_gets: HashSet<usize>,
}

/// Paginating in-memory [`ObjectStore`]
#[derive(Debug)]
pub struct MemoryStore {
    page_size: usize,
    state: Mutex<State>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::with_page_size(1000)
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            state: Mutex::new(State::default()),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn insert(&self, bucket: &str, key: &str, data: &[u8]) {
        self.state()
            .objects
            .insert((bucket.to_string(), key.to_string()), data.to_vec());
    }

    /// Make the n-th put call (1-based) fail
    pub fn fail_put(&self, call: usize) {
        self.state().failing_puts.insert(call);
    }

    /// Make the n-th get call (1-based) fail
    pub fn fail_get(&self, call: usize) {
        self.state().failing_gets.insert(call);
    }

    /// Keys currently stored in `bucket`, sorted
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.state()
            .objects
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect()
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.state()
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// Markers passed to every list request, in call order
    pub fn markers(&self) -> Vec<Option<String>> {
        self.state().markers.clone()
    }

    /// Keys of every attempted put, in call order
    pub fn put_calls(&self) -> Vec<String> {
        self.state().puts.clone()
    }

    /// Keys of every attempted get, in call order
    pub fn get_calls(&self) -> Vec<String> {
        self.state().gets.clone()
    }

    /// Batches passed to every delete request
    pub fn delete_calls(&self) -> Vec<Vec<String>> {
        self.state().deletes.clone()
    }
}

impl ObjectStore for MemoryStore {
    fn list_objects(&self, bucket: &str, options: ListOptions) -> Result<ListingPage> {
        let mut state = self.state();
        state.markers.push(options.marker.clone());

        let prefix = options.prefix.unwrap_or_default();
        let page_size = self.page_size;

        let mut matching = state
            .objects
            .keys()
            .filter(|(b, k)| b == bucket && k.starts_with(&prefix))
            .filter(|(_, k)| options.marker.as_ref().is_none_or(|m| k > m))
            .map(|(_, k)| k.clone());

        let keys: Vec<String> = matching.by_ref().take(page_size).collect();
        if matching.next().is_some() {
            Ok(ListingPage::partial(keys))
        } else {
            Ok(ListingPage::last(keys))
        }
    }

    fn delete_objects(&self, bucket: &str, keys: &[String]) -> Result<Vec<String>> {
        let mut state = self.state();
        state.deletes.push(keys.to_vec());
        let deleted = keys
            .iter()
            .filter(|k| {
                state
                    .objects
                    .remove(&(bucket.to_string(), k.to_string()))
                    .is_some()
            })
            .cloned()
            .collect();
        Ok(deleted)
    }

    fn put_object(&self, bucket: &str, key: &str, local_path: &Path) -> Result<u64> {
        let mut state = self.state();
        state.puts.push(key.to_string());
        if state.failing_puts.contains(&state.puts.len()) {
            return Err(Error::Network(format!("injected put failure for {key}")));
        }

        let data = std::fs::read(local_path)?;
        let size = data.len() as u64;
        state
            .objects
            .insert((bucket.to_string(), key.to_string()), data);
        Ok(size)
    }

    fn get_object(&self, bucket: &str, key: &str, local_path: &Path) -> Result<u64> {
        let mut state = self.state();
        state.gets.push(key.to_string());
        if state.failing_gets.contains(&state.gets.len()) {
            return Err(Error::Network(format!("injected get failure for {key}")));
        }

        let data = state
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .ok_or_else(|| Error::NotFound(format!("{bucket}/{key}")))?;
        std::fs::write(local_path, data)?;
        Ok(data.len() as u64)
    }
}
