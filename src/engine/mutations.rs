use std::sync::Arc;

use chrono::NaiveDateTime;
use dashmap::mapref::entry::Entry;
use tokio::sync::RwLock;

use crate::limits::*;
use crate::model::{
    Booking, Facility, FacilityChange, FacilityId, FacilityKind, FacilityState, TimeSlot, User,
};

use super::conflict::{find_conflict, validate_slot};
use super::{Engine, EngineError};

impl Engine {
    // ── Facility catalog ─────────────────────────────────────

    pub fn add_facility(&self, facility: Facility) -> Result<(), EngineError> {
        if self.facilities.len() >= MAX_FACILITIES {
            return Err(EngineError::LimitExceeded("too many facilities"));
        }
        if facility.id.as_str().is_empty() {
            return Err(EngineError::LimitExceeded("empty facility id"));
        }
        if facility.id.as_str().len() > MAX_ID_LEN {
            return Err(EngineError::LimitExceeded("facility id too long"));
        }
        if let FacilityKind::Workstation { description } = &facility.kind
            && description.len() > MAX_DESCRIPTION_LEN
        {
            return Err(EngineError::LimitExceeded("description too long"));
        }
        validate_gap(facility.gap_minutes)?;

        match self.facilities.entry(facility.id.clone()) {
            Entry::Occupied(_) => Err(EngineError::AlreadyExists(facility.id)),
            Entry::Vacant(v) => {
                v.insert(Arc::new(RwLock::new(FacilityState::new(facility))));
                Ok(())
            }
        }
    }

    /// Remove a facility from the catalog. Its bookings go with it.
    pub fn remove_facility(&self, id: &FacilityId) -> Result<(), EngineError> {
        self.facilities
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| EngineError::FacilityNotFound(id.clone()))
    }

    pub async fn update_facility(
        &self,
        id: &FacilityId,
        change: FacilityChange,
    ) -> Result<Facility, EngineError> {
        let state = self
            .get_state(id)
            .ok_or_else(|| EngineError::FacilityNotFound(id.clone()))?;
        let mut guard = state.write().await;
        match change {
            FacilityChange::Description(text) => {
                if text.len() > MAX_DESCRIPTION_LEN {
                    return Err(EngineError::LimitExceeded("description too long"));
                }
                match &mut guard.facility.kind {
                    FacilityKind::Workstation { description } => *description = text,
                    _ => {
                        return Err(EngineError::KindMismatch {
                            facility: id.clone(),
                            expected: "workstation",
                        });
                    }
                }
            }
            FacilityChange::Seats(n) => match &mut guard.facility.kind {
                FacilityKind::ConferenceRoom { seats } => *seats = n,
                _ => {
                    return Err(EngineError::KindMismatch {
                        facility: id.clone(),
                        expected: "conference room",
                    });
                }
            },
            FacilityChange::Gap(minutes) => {
                validate_gap(minutes)?;
                guard.facility.gap_minutes = minutes;
            }
        }
        Ok(guard.facility.clone())
    }

    // ── Bookings ─────────────────────────────────────────────

    /// Place a booking. `Ok(false)` is the normal "slot unavailable"
    /// outcome: any stored booking within the facility's gap refuses the
    /// insertion, leaving the store untouched.
    pub async fn add_booking(
        &self,
        user: &User,
        facility_id: &FacilityId,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<bool, EngineError> {
        let slot = TimeSlot::new(start, end)?;
        validate_slot(&slot)?;
        let state = self
            .get_state(facility_id)
            .ok_or_else(|| EngineError::FacilityNotFound(facility_id.clone()))?;
        let mut guard = state.write().await;
        if guard.bookings.len() >= MAX_BOOKINGS_PER_FACILITY {
            return Err(EngineError::LimitExceeded("too many bookings on facility"));
        }
        if find_conflict(&guard, &slot).is_some() {
            return Ok(false);
        }
        guard.insert_booking(Booking {
            facility: facility_id.clone(),
            slot,
            user: Some(user.login.clone()),
        });
        Ok(true)
    }

    /// Remove the booking matching (facility, start, end) exactly.
    /// Only the owner or an admin may remove it; a refused removal leaves
    /// the store unchanged.
    pub async fn remove_booking(
        &self,
        facility_id: &FacilityId,
        start: NaiveDateTime,
        end: NaiveDateTime,
        requester: &User,
    ) -> Result<(), EngineError> {
        let slot = TimeSlot::new(start, end)?;
        let state = self
            .get_state(facility_id)
            .ok_or_else(|| EngineError::FacilityNotFound(facility_id.clone()))?;
        let mut guard = state.write().await;
        let booking = guard
            .bookings
            .iter()
            .find(|b| b.slot == slot)
            .ok_or_else(|| EngineError::BookingNotFound {
                facility: facility_id.clone(),
                slot,
            })?;
        let is_owner = booking.user.as_deref() == Some(requester.login.as_str());
        if !is_owner && !requester.is_admin {
            return Err(EngineError::Forbidden {
                login: requester.login.clone(),
            });
        }
        let removed = guard.remove_exact(&slot);
        debug_assert!(removed.is_some());
        Ok(())
    }
}

fn validate_gap(minutes: i64) -> Result<(), EngineError> {
    if !(0..=MAX_GAP_MINUTES).contains(&minutes) {
        return Err(EngineError::LimitExceeded("gap out of range"));
    }
    Ok(())
}
