//! Paged, forward-only enumeration of index records.
//!
//! A [`Listing`] is a lazy walk over the local index starting strictly after
//! a cursor key. It reads nothing from the remote store, so paging works
//! even when the store is down. Dropping it early is always safe: it only
//! holds a read cursor.

use serde::Serialize;
use weedblob_index::{DecodeError, IndexCursor, IndexRecord};

use crate::error::{ClientError, ClientResult};

/// A key with the record stored for it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ListedBlob {
    pub key: String,
    pub file_id: String,
    pub size: u64,
}

/// Lazy iterator over at most `limit` records with keys greater than `after`.
///
/// Yields records in ascending key order. Stops at the end of the index or
/// after `limit` records. After yielding an error it yields nothing more.
pub struct Listing<'a> {
    cursor: IndexCursor<'a>,
    after: String,
    remaining: usize,
    done: bool,
}

impl<'a> Listing<'a> {
    /// Wrap a cursor positioned at the first key `>= after`.
    pub(crate) fn new(cursor: IndexCursor<'a>, after: &str, limit: usize) -> Self {
        Self {
            cursor,
            after: after.to_string(),
            remaining: limit,
            done: limit == 0,
        }
    }

    /// How many more records this listing may still yield.
    pub fn remaining(&self) -> usize {
        if self.done {
            0
        } else {
            self.remaining
        }
    }

    fn decode(key: Vec<u8>, value: &[u8]) -> ClientResult<ListedBlob> {
        let key = String::from_utf8(key).map_err(|e| {
            let lossy = String::from_utf8_lossy(e.as_bytes()).into_owned();
            ClientError::corrupt(&lossy, DecodeError::Malformed("key is not valid UTF-8".into()))
        })?;
        let record = IndexRecord::decode(value).map_err(|e| ClientError::corrupt(&key, e))?;
        Ok(ListedBlob {
            key,
            file_id: record.file_id,
            size: record.size,
        })
    }
}

impl Iterator for Listing<'_> {
    type Item = ClientResult<ListedBlob>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let (key, value) = match self.cursor.next() {
                None => {
                    self.done = true;
                    return None;
                }
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(ClientError::index("list", &self.after, e)));
                }
                Some(Ok(entry)) => entry,
            };

            // The cursor starts at `after` itself when that key exists.
            if !self.after.is_empty() && key == self.after.as_bytes() {
                continue;
            }

            self.remaining -= 1;
            if self.remaining == 0 {
                self.done = true;
            }
            let item = Self::decode(key, &value);
            if item.is_err() {
                self.done = true;
            }
            return Some(item);
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining()))
    }
}
