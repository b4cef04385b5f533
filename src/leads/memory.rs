use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use uuid::Uuid;

use super::lead::Lead;
use super::traits::LeadSink;

/// Default number of leads retained.
pub const DEFAULT_CAPACITY: usize = 1024;

#[derive(Debug, Default)]
struct Store {
    leads: VecDeque<Lead>,
    ids: HashSet<Uuid>,
}

/// Bounded in-memory lead store. The oldest lead is evicted once full.
#[derive(Debug)]
pub struct MemoryLeadSink {
    capacity: usize,
    store: Mutex<Store>,
}

impl MemoryLeadSink {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        MemoryLeadSink {
            capacity: capacity.max(1),
            store: Mutex::new(Store::default()),
        }
    }

    /// Get stored leads, oldest first (for assertions).
    pub fn leads(&self) -> Vec<Lead> {
        self.store.lock().leads.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.store.lock().leads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.lock().leads.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for MemoryLeadSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LeadSink for MemoryLeadSink {
    fn name(&self) -> &str {
        "memory"
    }

    async fn deliver(&self, lead: &Lead) -> anyhow::Result<()> {
        let mut store = self.store.lock();
        if !store.ids.insert(lead.id) {
            return Ok(());
        }

        if store.leads.len() == self.capacity {
            if let Some(evicted) = store.leads.pop_front() {
                store.ids.remove(&evicted.id);
            }
        }
        store.leads.push_back(lead.clone());
        Ok(())
    }
}
