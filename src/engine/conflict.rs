use crate::limits::*;
use crate::model::{Booking, FacilityState, TimeSlot};

use super::EngineError;

/// Whether two slots on the same facility may not coexist.
///
/// Conflict iff the idle time between them (in either order) is strictly
/// less than `gap_minutes`, or they overlap outright. Touching at exactly
/// the gap distance is not a conflict.
pub fn conflicts(a: &TimeSlot, b: &TimeSlot, gap_minutes: i64) -> bool {
    let gap = chrono::Duration::minutes(gap_minutes);
    a.end + gap > b.start && b.end + gap > a.start
}

pub(crate) fn validate_slot(slot: &TimeSlot) -> Result<(), EngineError> {
    if slot.duration_minutes() > MAX_SLOT_DURATION_MINUTES {
        return Err(EngineError::LimitExceeded("slot too wide"));
    }
    Ok(())
}

/// First stored booking whose buffered footprint collides with `slot`.
/// The probe window is widened by the gap on both sides so bookings that
/// merely bleed into buffer range are examined too.
pub(crate) fn find_conflict<'a>(
    state: &'a FacilityState,
    slot: &TimeSlot,
) -> Option<&'a Booking> {
    let gap = state.facility.gap_minutes;
    let probe = slot.widen(gap);
    state
        .intersecting(&probe)
        .find(|b| conflicts(&b.slot, slot, gap))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Facility, FacilityId};
    use chrono::{NaiveDate, NaiveDateTime};

    fn dt(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 7, 7)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn slot(h1: u32, m1: u32, h2: u32, m2: u32) -> TimeSlot {
        TimeSlot::new(dt(h1, m1), dt(h2, m2)).unwrap()
    }

    #[test]
    fn overlapping_slots_conflict() {
        let a = slot(10, 0, 12, 0);
        let b = slot(11, 0, 13, 0);
        assert!(conflicts(&a, &b, 15));
        assert!(conflicts(&b, &a, 15));
    }

    #[test]
    fn identical_slots_conflict() {
        let a = slot(10, 0, 12, 0);
        assert!(conflicts(&a, &a, 0));
    }

    #[test]
    fn closer_than_gap_conflicts() {
        let a = slot(10, 0, 11, 0);
        let b = slot(11, 14, 12, 0); // 14 min apart, gap 15
        assert!(conflicts(&a, &b, 15));
        assert!(conflicts(&b, &a, 15));
    }

    #[test]
    fn exactly_gap_apart_does_not_conflict() {
        let a = slot(10, 0, 11, 0);
        let b = slot(11, 15, 12, 0); // exactly 15 min apart
        assert!(!conflicts(&a, &b, 15));
        assert!(!conflicts(&b, &a, 15));
    }

    #[test]
    fn beyond_gap_does_not_conflict() {
        let a = slot(10, 0, 11, 0);
        let b = slot(13, 0, 14, 0);
        assert!(!conflicts(&a, &b, 15));
    }

    #[test]
    fn zero_gap_touching_does_not_conflict() {
        let a = slot(10, 0, 11, 0);
        let b = slot(11, 0, 12, 0);
        assert!(!conflicts(&a, &b, 0));
    }

    #[test]
    fn find_conflict_respects_facility_gap() {
        let mut fs = FacilityState::new(Facility::workstation(
            FacilityId::new("ws001"),
            "Celeron",
            30,
        ));
        fs.insert_booking(Booking {
            facility: fs.facility.id.clone(),
            slot: slot(10, 0, 11, 0),
            user: None,
        });
        // 20 min apart: fine for gap 15, conflict for this facility's 30.
        assert!(find_conflict(&fs, &slot(11, 20, 12, 0)).is_some());
        assert!(find_conflict(&fs, &slot(11, 30, 12, 0)).is_none());
    }

    #[test]
    fn validate_slot_rejects_month_long_booking() {
        let start = dt(0, 0);
        let end = start + chrono::Duration::minutes(MAX_SLOT_DURATION_MINUTES + 1);
        let s = TimeSlot::new(start, end).unwrap();
        assert!(matches!(
            validate_slot(&s),
            Err(EngineError::LimitExceeded(_))
        ));
    }
}
