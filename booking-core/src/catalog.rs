//! Collaborator lookup seams
//!
//! Listings and customers are owned by the catalog and user subsystems;
//! this core only ever reads them. The traits keep those collaborators
//! behind a seam so the ledger can be wired to a real backend or to the
//! in-memory implementations used by tests and the server stub.

use crate::types::{CustomerId, Listing, ListingId};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Read-only listing lookup (catalog collaborator)
pub trait ListingCatalog: Send + Sync {
    /// Get a listing by id, if it exists
    fn get(&self, listing_id: &ListingId) -> Option<Listing>;
}

/// Read-only customer lookup (user collaborator)
pub trait CustomerDirectory: Send + Sync {
    /// Check whether a customer exists
    fn exists(&self, customer_id: &CustomerId) -> bool;

    /// Resolve a customer id from an email address
    fn find_by_email(&self, email: &str) -> Option<CustomerId>;
}

/// In-memory listing catalog
#[derive(Default)]
pub struct InMemoryCatalog {
    listings: RwLock<HashMap<ListingId, Listing>>,
}

impl InMemoryCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a listing
    pub fn insert(&self, listing: Listing) {
        self.listings.write().insert(listing.id, listing);
    }
}

impl ListingCatalog for InMemoryCatalog {
    fn get(&self, listing_id: &ListingId) -> Option<Listing> {
        self.listings.read().get(listing_id).cloned()
    }
}

/// In-memory customer directory
#[derive(Default)]
pub struct InMemoryDirectory {
    emails: RwLock<HashMap<CustomerId, String>>,
}

impl InMemoryDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a customer
    pub fn insert(&self, customer_id: CustomerId, email: impl Into<String>) {
        self.emails.write().insert(customer_id, email.into());
    }
}

impl CustomerDirectory for InMemoryDirectory {
    fn exists(&self, customer_id: &CustomerId) -> bool {
        self.emails.read().contains_key(customer_id)
    }

    fn find_by_email(&self, email: &str) -> Option<CustomerId> {
        self.emails
            .read()
            .iter()
            .find(|(_, e)| e.as_str() == email)
            .map(|(id, _)| *id)
    }
}
