//! Lazy paginated key listing
//!
//! [`KeyListing`] requests pages on demand. Each request after the first
//! passes the last key seen as marker; the listing ends once a page is
//! reported as not truncated. A listing cannot be resumed after an error or
//! across processes; create a new one for every logical listing.

use std::collections::VecDeque;

use crate::error::Result;
use crate::traits::{ListOptions, ObjectStore};

/// Iterator over every key under a prefix
pub struct KeyListing<'a, S: ?Sized> {
    store: &'a S,
    bucket: String,
    prefix: String,
    marker: Option<String>,
    buffer: VecDeque<String>,
    pages: usize,
    exhausted: bool,
}

impl<'a, S: ObjectStore + ?Sized> KeyListing<'a, S> {
    pub fn new(store: &'a S, bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            prefix: prefix.into(),
            marker: None,
            buffer: VecDeque::new(),
            pages: 0,
            exhausted: false,
        }
    }

    /// Number of pages requested so far
    pub fn pages(&self) -> usize {
        self.pages
    }

    fn fetch_page(&mut self) -> Result<()> {
        let options = ListOptions {
            prefix: Some(self.prefix.clone()),
            marker: self.marker.clone(),
        };
        let page = self.store.list_objects(&self.bucket, options)?;
        self.pages += 1;

        match page.next_marker() {
            Some(marker) => self.marker = Some(marker.to_string()),
            None => {
                if page.truncated {
                    tracing::warn!(
                        "Truncated empty page while listing '{}' in bucket '{}', stopping",
                        self.prefix,
                        self.bucket
                    );
                }
                self.exhausted = true;
            }
        }

        self.buffer.extend(page.keys);
        Ok(())
    }
}

impl<S: ObjectStore + ?Sized> Iterator for KeyListing<'_, S> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(key) = self.buffer.pop_front() {
                return Some(Ok(key));
            }
            if self.exhausted {
                return None;
            }
            if let Err(e) = self.fetch_page() {
                self.exhausted = true;
                return Some(Err(e));
            }
        }
    }
}
