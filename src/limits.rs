//! Hard bounds on inputs. Everything here is a guard against unbounded
//! growth from a misbehaving client, not a tuning knob.

/// Max facilities in the catalog.
pub const MAX_FACILITIES: usize = 4096;

/// Max bookings held for a single facility.
pub const MAX_BOOKINGS_PER_FACILITY: usize = 65_536;

/// Max registered users.
pub const MAX_USERS: usize = 65_536;

/// Max length of a facility id.
pub const MAX_ID_LEN: usize = 64;

/// Max length of a user login.
pub const MAX_LOGIN_LEN: usize = 64;

/// Max length of a workstation description.
pub const MAX_DESCRIPTION_LEN: usize = 256;

/// Max booking length in minutes (31 days).
pub const MAX_SLOT_DURATION_MINUTES: i64 = 31 * 24 * 60;

/// Max inter-booking gap in minutes (a full day).
pub const MAX_GAP_MINUTES: i64 = 24 * 60;
