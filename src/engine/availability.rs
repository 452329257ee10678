use chrono::{Duration, NaiveDate};

use crate::model::{day_window, Booking, TimeSlot};

// ── Free-Slot Algorithm ──────────────────────────────────────────

/// Compute the maximal free slots of one facility's day: the complement
/// of its bookings within `date`, with the gap subtracted on both sides
/// of every booking.
///
/// Pure function of its inputs. `bookings` may be any slice for the
/// facility; selection against the day and ordering happen here.
/// Interior slots shorter than `min_interior_minutes` are suppressed;
/// the trailing remainder of the day is always emitted when non-empty.
pub fn free_slots_for_day(
    bookings: &[Booking],
    date: NaiveDate,
    gap_minutes: i64,
    min_interior_minutes: i64,
) -> Vec<TimeSlot> {
    let window = day_window(date);
    let gap = Duration::minutes(gap_minutes);

    // Widened probe: a booking from the previous day that bleeds into the
    // buffer range of this one must be accounted for.
    let probe = window.widen(gap_minutes);
    let mut booked: Vec<&Booking> = bookings
        .iter()
        .filter(|b| b.slot.intersects(&probe))
        .collect();
    booked.sort_by(|a, b| a.slot.cmp(&b.slot));

    if booked.is_empty() {
        return vec![window];
    }

    // Day opens and closes inside the first booking's buffered footprint:
    // no free time at all.
    let first = &booked[0].slot;
    if first.start < window.start + gap && first.end > window.end - gap {
        return Vec::new();
    }

    // The cursor starts at midnight unless the day opens mid-booking, in
    // which case the opening booking is consumed before the walk.
    let mut begin = window.start;
    let mut rest = &booked[..];
    if first.start < window.start - gap {
        begin = first.end + gap;
        rest = &booked[1..];
    }

    let mut free = Vec::new();
    for b in rest {
        // Candidate between the cursor and this booking's buffer. Two
        // bookings closer than the gap make it degenerate: skip, not fail.
        if let Ok(candidate) = TimeSlot::new(begin, b.slot.start - gap) {
            if candidate.duration_minutes() >= min_interior_minutes {
                free.push(candidate);
            }
        }
        begin = b.slot.end + gap;
    }

    // Trailing remainder: no minimum-duration filter, by policy.
    if begin < window.end {
        free.push(TimeSlot { start: begin, end: window.end });
    }

    free
}
