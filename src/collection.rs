//! In-memory index of documents
//!
//! [`Collection`] keeps documents in a single vector guarded by one mutex together
//! with a `sorted` flag. Lookups use binary search while the flag is set and fall
//! back to a linear scan otherwise; both paths return the same answer.
//!
//! The flag is set by [`Collection::load`] (persisted indexes are written sorted)
//! and [`Collection::sort`], and cleared by [`Collection::add`] as soon as an
//! insertion breaks the ordering. Duplicate ids are not rejected here; callers
//! check [`Collection::contains`] before adding.

use crate::types::{Document, DocumentId};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Concurrency-safe ordered container of [`Document`]s
///
/// Every operation takes the guard for its whole duration and releases it before
/// returning; nothing handed back to the caller borrows the guarded state.
#[derive(Debug, Default)]
pub struct Collection {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    documents: Vec<Document>,
    sorted: bool,
}

impl Inner {
    fn find(&self, id: DocumentId) -> Option<usize> {
        if self.sorted {
            binary_search(&self.documents, id)
        } else {
            linear_search(&self.documents, id)
        }
    }
}

impl Collection {
    /// Create an empty, unsorted collection
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic while holding the guard cannot leave the vector half-written,
        // so a poisoned lock is still safe to use.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Populate an empty collection with already-sorted documents
    ///
    /// Only the first load takes effect: on a non-empty collection this is a no-op
    /// and returns `false`. The input is trusted to be in ascending id order.
    pub fn load(&self, documents: Vec<Document>) -> bool {
        let mut inner = self.lock();
        if !inner.documents.is_empty() {
            return false;
        }
        inner.documents = documents;
        inner.sorted = true;
        true
    }

    /// Append a document
    ///
    /// Clears the sorted flag when the previous last document has a larger id.
    pub fn add(&self, document: Document) {
        let mut inner = self.lock();
        if let Some(last) = inner.documents.last()
            && last.id > document.id
        {
            inner.sorted = false;
        }
        inner.documents.push(document);
    }

    /// Whether a document with `id` is present
    pub fn contains(&self, id: DocumentId) -> bool {
        self.lock().find(id).is_some()
    }

    /// Position and a copy of the document with `id`
    pub fn get(&self, id: DocumentId) -> Option<(usize, Document)> {
        let inner = self.lock();
        inner
            .find(id)
            .map(|index| (index, inner.documents[index].clone()))
    }

    /// Position of the document with `id`
    pub fn index(&self, id: DocumentId) -> Option<usize> {
        self.lock().find(id)
    }

    /// Snapshot of all documents in their current order
    pub fn get_all(&self) -> Vec<Document> {
        self.lock().documents.clone()
    }

    /// Ids in their current order
    pub fn ids(&self) -> Vec<DocumentId> {
        self.lock().documents.iter().map(|d| d.id).collect()
    }

    /// Remove the document at `index`, shifting later documents left
    ///
    /// Returns `false` without touching the collection when `index` is out of range.
    pub fn remove(&self, index: usize) -> bool {
        let mut inner = self.lock();
        if index >= inner.documents.len() {
            return false;
        }
        inner.documents.remove(index);
        true
    }

    /// Stable ascending sort by id; always leaves the collection marked sorted
    pub fn sort(&self) {
        let mut inner = self.lock();
        inner.documents.sort_by_key(|d| d.id);
        inner.sorted = true;
    }

    /// Number of documents
    pub fn len(&self) -> usize {
        self.lock().documents.len()
    }

    /// Whether the collection holds no documents
    pub fn is_empty(&self) -> bool {
        self.lock().documents.is_empty()
    }

    /// Current value of the sorted flag
    pub fn is_sorted(&self) -> bool {
        self.lock().sorted
    }

    /// Highest id present
    pub fn latest(&self) -> Option<DocumentId> {
        let inner = self.lock();
        if inner.sorted {
            inner.documents.last().map(|d| d.id)
        } else {
            inner.documents.iter().map(|d| d.id).max()
        }
    }

    /// Ids in `1..=upper` that are not present, ascending
    pub fn missing(&self, upper: DocumentId) -> Vec<DocumentId> {
        let inner = self.lock();
        (1..=upper).filter(|id| inner.find(*id).is_none()).collect()
    }

    /// Run `f` over the documents without copying them
    pub fn with_documents<R>(&self, f: impl FnOnce(&[Document]) -> R) -> R {
        f(&self.lock().documents)
    }
}

/// Binary search over the closed interval `[lo, hi]`
///
/// `documents` must be in non-decreasing id order.
pub(crate) fn binary_search(documents: &[Document], id: DocumentId) -> Option<usize> {
    let mut lo: isize = 0;
    let mut hi: isize = documents.len() as isize - 1;

    while lo <= hi {
        let mid = (lo + hi) / 2;
        let current = documents[mid as usize].id;
        if current == id {
            return Some(mid as usize);
        }
        if current < id {
            lo = mid + 1;
        } else {
            hi = mid - 1;
        }
    }

    None
}

/// Front-to-back scan
pub(crate) fn linear_search(documents: &[Document], id: DocumentId) -> Option<usize> {
    documents.iter().position(|d| d.id == id)
}
