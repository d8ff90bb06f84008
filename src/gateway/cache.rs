/// Listing and document cache in front of the workflow gateway
///
/// Reads are lock-free snapshots through ArcSwap. Entries are never patched in
/// place: a successful mutation invalidates them and the next read refetches.

use crate::{
    gateway::{GatewayError, WorkflowGateway, TRACING_TARGET},
    workflow::types::{WorkflowDocument, WorkflowId, WorkflowSummary},
};
use arc_swap::{ArcSwap, ArcSwapOption};
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

/// Fetch-on-miss cache of the workflow listing and of individual documents
pub struct WorkflowCache {
    gateway: Arc<dyn WorkflowGateway>,
    /// Last fetched listing, `None` when stale
    listing: ArcSwapOption<Vec<WorkflowSummary>>,
    /// Documents by id; an absent key means stale
    documents: ArcSwap<HashMap<WorkflowId, Arc<WorkflowDocument>>>,
    /// Bumped by every invalidation so a fetch that raced one is not stored
    generation: AtomicU64,
}

impl WorkflowCache {
    pub fn new(gateway: Arc<dyn WorkflowGateway>) -> Self {
        Self {
            gateway,
            listing: ArcSwapOption::empty(),
            documents: ArcSwap::from_pointee(HashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    /// Underlying gateway, for calls that bypass the cache
    pub fn gateway(&self) -> &Arc<dyn WorkflowGateway> {
        &self.gateway
    }

    /// Workflow listing, fetched if stale
    pub async fn list(&self) -> Result<Arc<Vec<WorkflowSummary>>, GatewayError> {
        if let Some(listing) = self.listing.load_full() {
            return Ok(listing);
        }

        let generation = self.generation.load(Ordering::Acquire);
        let listing = Arc::new(self.gateway.list().await?);
        if self.generation.load(Ordering::Acquire) == generation {
            self.listing.store(Some(Arc::clone(&listing)));
        }

        tracing::debug!(target: TRACING_TARGET, "📋 Fetched listing with {} workflows", listing.len());
        Ok(listing)
    }

    /// Full document for one workflow, fetched if stale
    pub async fn document(&self, id: WorkflowId) -> Result<Arc<WorkflowDocument>, GatewayError> {
        if let Some(document) = self.documents.load().get(&id) {
            return Ok(Arc::clone(document));
        }

        let generation = self.generation.load(Ordering::Acquire);
        let document = Arc::new(self.gateway.get(id).await?);
        if self.generation.load(Ordering::Acquire) == generation {
            self.documents.rcu(|current| {
                let mut next = HashMap::clone(current);
                next.insert(id, Arc::clone(&document));
                next
            });
        }

        tracing::debug!(target: TRACING_TARGET, "📄 Fetched workflow document {}", id);
        Ok(document)
    }

    pub fn invalidate_listing(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.listing.store(None);
        tracing::debug!(target: TRACING_TARGET, "🧹 Listing cache invalidated");
    }

    pub fn invalidate_document(&self, id: WorkflowId) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.documents.rcu(|current| {
            let mut next = HashMap::clone(current);
            next.remove(&id);
            next
        });
        tracing::debug!(target: TRACING_TARGET, "🧹 Document cache invalidated for {}", id);
    }

    pub fn invalidate_all(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.listing.store(None);
        self.documents.store(Arc::new(HashMap::new()));
    }

    pub fn is_listing_cached(&self) -> bool {
        self.listing.load().is_some()
    }

    pub fn is_document_cached(&self, id: WorkflowId) -> bool {
        self.documents.load().contains_key(&id)
    }
}
