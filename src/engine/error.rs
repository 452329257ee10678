use crate::model::{FacilityId, InvalidRange, TimeSlot};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    FacilityNotFound(FacilityId),
    BookingNotFound {
        facility: FacilityId,
        slot: TimeSlot,
    },
    Forbidden {
        login: String,
    },
    InvalidRange(InvalidRange),
    AlreadyExists(FacilityId),
    KindMismatch {
        facility: FacilityId,
        expected: &'static str,
    },
    LimitExceeded(&'static str),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::FacilityNotFound(id) => write!(f, "facility not found: {id}"),
            EngineError::BookingNotFound { facility, slot } => {
                write!(
                    f,
                    "booking not found: {facility} [{}, {}]",
                    slot.start, slot.end
                )
            }
            EngineError::Forbidden { login } => {
                write!(f, "user {login} may not remove this booking")
            }
            EngineError::InvalidRange(e) => write!(f, "{e}"),
            EngineError::AlreadyExists(id) => write!(f, "facility already exists: {id}"),
            EngineError::KindMismatch { facility, expected } => {
                write!(f, "facility {facility} is not a {expected}")
            }
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<InvalidRange> for EngineError {
    fn from(e: InvalidRange) -> Self {
        EngineError::InvalidRange(e)
    }
}
