use std::cmp::Ordering;
use std::fmt;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Default inter-booking gap in minutes, used when a facility is created
/// without an explicit one.
pub const DEFAULT_GAP_MINUTES: i64 = 15;

/// Closed time range `[start, end]` at whole-minute granularity, naive
/// local time. Invariant: `end > start`, enforced at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// Construction failure: slot end not strictly after start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl fmt::Display for InvalidRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid range: end {} not after start {}", self.end, self.start)
    }
}

impl std::error::Error for InvalidRange {}

impl TimeSlot {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, InvalidRange> {
        if end <= start {
            return Err(InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Inclusive intersection test: endpoints touching count as intersecting.
    /// Used for probe-window selection, not for conflict decisions.
    pub fn intersects(&self, other: &TimeSlot) -> bool {
        self.end >= other.start && other.end >= self.start
    }

    /// The slot widened by `minutes` on both ends.
    pub fn widen(&self, minutes: i64) -> TimeSlot {
        let pad = Duration::minutes(minutes);
        TimeSlot {
            start: self.start - pad,
            end: self.end + pad,
        }
    }
}

/// The day window for a calendar date: midnight to 23:59:59.999.
pub fn day_window(date: NaiveDate) -> TimeSlot {
    TimeSlot {
        start: date.and_time(NaiveTime::MIN),
        end: date
            .and_hms_milli_opt(23, 59, 59, 999)
            .expect("end of day is a valid time"),
    }
}

// ── Facilities ───────────────────────────────────────────────────

/// Facility identifier. Unique case-insensitively; normalized to
/// lowercase at construction so lookups and ordering ignore case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FacilityId(String);

impl FacilityId {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FacilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The closed set of bookable facility kinds. The kind-specific attribute
/// is display-only; the engine reads nothing from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FacilityKind {
    Workstation { description: String },
    ConferenceRoom { seats: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facility {
    pub id: FacilityId,
    pub kind: FacilityKind,
    /// Minimum idle minutes required between two bookings, applied
    /// symmetrically before and after each booking.
    pub gap_minutes: i64,
    /// Minimum duration for an interior free slot to be reported.
    /// `None` means "equal to the gap".
    pub min_slot_minutes: Option<i64>,
}

impl Facility {
    pub fn workstation(id: FacilityId, description: impl Into<String>, gap_minutes: i64) -> Self {
        Self {
            id,
            kind: FacilityKind::Workstation { description: description.into() },
            gap_minutes,
            min_slot_minutes: None,
        }
    }

    pub fn conference_room(id: FacilityId, seats: u32, gap_minutes: i64) -> Self {
        Self {
            id,
            kind: FacilityKind::ConferenceRoom { seats },
            gap_minutes,
            min_slot_minutes: None,
        }
    }

    pub fn min_interior_minutes(&self) -> i64 {
        self.min_slot_minutes.unwrap_or(self.gap_minutes)
    }
}

/// A single edit to a facility. Kind-specific edits fail on the wrong kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FacilityChange {
    Description(String),
    Seats(u32),
    Gap(i64),
}

// ── Bookings ─────────────────────────────────────────────────────

/// A placed booking. `user` is `None` only for internally constructed
/// slots. Bookings created through the engine always carry the owner.
///
/// Equality is structural. Whether two bookings can coexist is the
/// engine's explicit `conflicts` predicate, never `==`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub facility: FacilityId,
    pub slot: TimeSlot,
    pub user: Option<String>,
}

/// Canonical listing order: start, then end, then facility id.
pub fn booking_order(a: &Booking, b: &Booking) -> Ordering {
    a.slot
        .cmp(&b.slot)
        .then_with(|| a.facility.cmp(&b.facility))
}

// ── Per-facility state ───────────────────────────────────────────

/// A facility plus its bookings, sorted by slot (start, then end).
#[derive(Debug, Clone)]
pub struct FacilityState {
    pub facility: Facility,
    pub bookings: Vec<Booking>,
}

impl FacilityState {
    pub fn new(facility: Facility) -> Self {
        Self {
            facility,
            bookings: Vec::new(),
        }
    }

    /// Insert a booking maintaining sort order by slot.
    pub fn insert_booking(&mut self, booking: Booking) {
        let pos = self
            .bookings
            .binary_search_by(|b| b.slot.cmp(&booking.slot))
            .unwrap_or_else(|e| e);
        self.bookings.insert(pos, booking);
    }

    /// Remove the booking whose slot matches exactly.
    pub fn remove_exact(&mut self, slot: &TimeSlot) -> Option<Booking> {
        let pos = self.bookings.iter().position(|b| b.slot == *slot)?;
        Some(self.bookings.remove(pos))
    }

    /// Bookings whose slot intersects the probe window (inclusive ends).
    /// Uses binary search to skip bookings starting after `probe.end`.
    pub fn intersecting(&self, probe: &TimeSlot) -> impl Iterator<Item = &Booking> {
        let right_bound = self
            .bookings
            .partition_point(|b| b.slot.start <= probe.end);
        self.bookings[..right_bound]
            .iter()
            .filter(move |b| b.slot.end >= probe.start)
    }
}

// ── Users ────────────────────────────────────────────────────────

#[derive(Clone, PartialEq, Eq)]
pub struct User {
    pub login: String,
    pub password: String,
    pub is_admin: bool,
}

impl User {
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
            is_admin: false,
        }
    }

    pub fn admin(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            is_admin: true,
            ..Self::new(login, password)
        }
    }
}

// Password stays out of debug output.
impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("login", &self.login)
            .field("is_admin", &self.is_admin)
            .finish()
    }
}
