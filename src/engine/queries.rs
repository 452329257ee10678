use chrono::NaiveDate;

use crate::model::{booking_order, Booking, Facility, FacilityId, TimeSlot};

use super::availability::free_slots_for_day;
use super::{Engine, EngineError};

impl Engine {
    pub async fn get_facility(&self, id: &FacilityId) -> Result<Facility, EngineError> {
        let state = self
            .get_state(id)
            .ok_or_else(|| EngineError::FacilityNotFound(id.clone()))?;
        let guard = state.read().await;
        Ok(guard.facility.clone())
    }

    /// All facilities in catalog (id) order.
    pub async fn list_facilities(&self) -> Vec<Facility> {
        let mut out = Vec::with_capacity(self.facility_count());
        for id in self.facility_ids() {
            if let Some(state) = self.get_state(&id) {
                out.push(state.read().await.facility.clone());
            }
        }
        out
    }

    /// One facility's bookings, ordered by (start, end).
    pub async fn bookings_for_facility(
        &self,
        id: &FacilityId,
    ) -> Result<Vec<Booking>, EngineError> {
        let state = self
            .get_state(id)
            .ok_or_else(|| EngineError::FacilityNotFound(id.clone()))?;
        let guard = state.read().await;
        Ok(guard.bookings.clone())
    }

    /// A user's bookings across all facilities, in canonical order.
    pub async fn bookings_for_user(&self, login: &str) -> Vec<Booking> {
        let mut out = Vec::new();
        for state in self.all_states() {
            let guard = state.read().await;
            out.extend(
                guard
                    .bookings
                    .iter()
                    .filter(|b| b.user.as_deref() == Some(login))
                    .cloned(),
            );
        }
        out.sort_by(booking_order);
        out
    }

    /// Global listing in canonical order.
    pub async fn all_bookings(&self) -> Vec<Booking> {
        let mut out = Vec::new();
        for state in self.all_states() {
            let guard = state.read().await;
            out.extend(guard.bookings.iter().cloned());
        }
        out.sort_by(booking_order);
        out
    }

    /// Free slots of one facility for a calendar day.
    pub async fn free_slots(
        &self,
        id: &FacilityId,
        date: NaiveDate,
    ) -> Result<Vec<TimeSlot>, EngineError> {
        let state = self
            .get_state(id)
            .ok_or_else(|| EngineError::FacilityNotFound(id.clone()))?;
        let guard = state.read().await;
        Ok(free_slots_for_day(
            &guard.bookings,
            date,
            guard.facility.gap_minutes,
            guard.facility.min_interior_minutes(),
        ))
    }

    /// Free slots for every facility, keyed by facility in catalog order.
    pub async fn day_free_slots(&self, date: NaiveDate) -> Vec<(Facility, Vec<TimeSlot>)> {
        let mut out = Vec::with_capacity(self.facility_count());
        for id in self.facility_ids() {
            if let Some(state) = self.get_state(&id) {
                let guard = state.read().await;
                let slots = free_slots_for_day(
                    &guard.bookings,
                    date,
                    guard.facility.gap_minutes,
                    guard.facility.min_interior_minutes(),
                );
                out.push((guard.facility.clone(), slots));
            }
        }
        out
    }
}
