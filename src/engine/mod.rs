mod availability;
mod conflict;
mod error;
mod mutations;
mod queries;

pub use availability::free_slots_for_day;
pub use conflict::conflicts;
pub use error::EngineError;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::RwLock;

use crate::model::{FacilityId, FacilityState};

pub type SharedFacilityState = Arc<RwLock<FacilityState>>;

/// The booking store. One lock per facility: booking mutations serialize
/// per facility, so no two conflicting bookings can be admitted by
/// concurrent submissions.
pub struct Engine {
    facilities: DashMap<FacilityId, SharedFacilityState>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self {
            facilities: DashMap::new(),
        }
    }

    pub fn facility_count(&self) -> usize {
        self.facilities.len()
    }

    pub fn get_state(&self, id: &FacilityId) -> Option<SharedFacilityState> {
        self.facilities.get(id).map(|e| e.value().clone())
    }

    /// Catalog order: facility ids ascending.
    pub fn facility_ids(&self) -> Vec<FacilityId> {
        let mut ids: Vec<FacilityId> = self.facilities.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Snapshot the shared states without holding map shards across awaits.
    fn all_states(&self) -> Vec<SharedFacilityState> {
        self.facilities.iter().map(|e| e.value().clone()).collect()
    }
}
