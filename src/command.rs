use chrono::{NaiveDate, NaiveDateTime};

use crate::model::{FacilityChange, FacilityId, FacilityKind};

/// Wire datetime format, e.g. `24-07-07 11:00`.
pub const DATE_TIME_FORMAT: &str = "%y-%m-%d %H:%M";

/// Wire date format, e.g. `24-07-07`.
pub const DATE_FORMAT: &str = "%y-%m-%d";

/// Parsed command from one input line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Register { login: String, password: String },
    Login { login: String, password: String },
    Logout,
    Quit,
    Facilities,
    Free {
        date: NaiveDate,
        facility: Option<FacilityId>,
    },
    Book {
        facility: FacilityId,
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    Cancel {
        facility: FacilityId,
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    Bookings(BookingFilter),
    FacilityAdd {
        id: FacilityId,
        kind: FacilityKind,
    },
    FacilityEdit {
        id: FacilityId,
        change: FacilityChange,
    },
    FacilityRemove {
        id: FacilityId,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingFilter {
    Own,
    All,
    User(String),
    Facility(FacilityId),
}

pub fn parse_line(line: &str) -> Result<Command, CommandError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(CommandError::Empty);
    }
    let (verb, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((v, r)) => (v, r.trim()),
        None => (trimmed, ""),
    };

    match verb.to_uppercase().as_str() {
        "REGISTER" => parse_credentials(rest, "REGISTER")
            .map(|(login, password)| Command::Register { login, password }),
        "LOGIN" => parse_credentials(rest, "LOGIN")
            .map(|(login, password)| Command::Login { login, password }),
        "LOGOUT" => parse_bare(rest, Command::Logout),
        "QUIT" => parse_bare(rest, Command::Quit),
        "FACILITIES" => parse_bare(rest, Command::Facilities),
        "FREE" => parse_free(rest),
        "BOOK" => {
            let (facility, start, end) = parse_booking_details(rest)?;
            Ok(Command::Book { facility, start, end })
        }
        "CANCEL" => {
            let (facility, start, end) = parse_booking_details(rest)?;
            Ok(Command::Cancel { facility, start, end })
        }
        "BOOKINGS" => parse_bookings(rest),
        "FACILITY" => parse_facility(rest),
        other => Err(CommandError::Unknown(other.to_string())),
    }
}

fn parse_bare(rest: &str, cmd: Command) -> Result<Command, CommandError> {
    if rest.is_empty() {
        Ok(cmd)
    } else {
        Err(CommandError::TrailingInput(rest.to_string()))
    }
}

fn parse_credentials(rest: &str, what: &'static str) -> Result<(String, String), CommandError> {
    let parts: Vec<&str> = rest.split_whitespace().collect();
    if parts.len() != 2 {
        return Err(CommandError::WrongArity(what, 2, parts.len()));
    }
    Ok((parts[0].to_string(), parts[1].to_string()))
}

fn parse_free(rest: &str) -> Result<Command, CommandError> {
    let parts: Vec<&str> = rest.split_whitespace().collect();
    match parts.as_slice() {
        [date] => Ok(Command::Free {
            date: parse_date(date)?,
            facility: None,
        }),
        [date, facility] => Ok(Command::Free {
            date: parse_date(date)?,
            facility: Some(FacilityId::new(facility)),
        }),
        _ => Err(CommandError::WrongArity("FREE", 1, parts.len())),
    }
}

/// `<facility>, <start>, <end>`, the comma-separated booking triple.
fn parse_booking_details(
    rest: &str,
) -> Result<(FacilityId, NaiveDateTime, NaiveDateTime), CommandError> {
    let parts: Vec<&str> = rest.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(CommandError::WrongArity("booking details", 3, parts.len()));
    }
    if parts[0].is_empty() {
        return Err(CommandError::Missing("facility"));
    }
    Ok((
        FacilityId::new(parts[0]),
        parse_date_time(parts[1])?,
        parse_date_time(parts[2])?,
    ))
}

fn parse_bookings(rest: &str) -> Result<Command, CommandError> {
    let parts: Vec<&str> = rest.split_whitespace().collect();
    let filter = match parts.as_slice() {
        [] => BookingFilter::Own,
        [all] if all.eq_ignore_ascii_case("all") => BookingFilter::All,
        [kw, login] if kw.eq_ignore_ascii_case("user") => BookingFilter::User(login.to_string()),
        [kw, id] if kw.eq_ignore_ascii_case("facility") => {
            BookingFilter::Facility(FacilityId::new(id))
        }
        _ => return Err(CommandError::BadFilter(rest.to_string())),
    };
    Ok(Command::Bookings(filter))
}

fn parse_facility(rest: &str) -> Result<Command, CommandError> {
    let (action, args) = match rest.split_once(char::is_whitespace) {
        Some((a, r)) => (a, r.trim()),
        None => (rest, ""),
    };
    match action.to_uppercase().as_str() {
        "ADD" => parse_facility_add(args),
        "EDIT" => parse_facility_edit(args),
        "REMOVE" => {
            if args.is_empty() || args.contains(char::is_whitespace) {
                return Err(CommandError::Missing("facility id"));
            }
            Ok(Command::FacilityRemove {
                id: FacilityId::new(args),
            })
        }
        other => Err(CommandError::Unknown(format!("FACILITY {other}"))),
    }
}

fn parse_facility_add(args: &str) -> Result<Command, CommandError> {
    let (kind_word, rest) = args
        .split_once(char::is_whitespace)
        .ok_or(CommandError::Missing("facility kind"))?;
    let (id, attr) = rest
        .split_once(',')
        .ok_or(CommandError::Missing("facility attribute"))?;
    let id = id.trim();
    let attr = attr.trim();
    if id.is_empty() {
        return Err(CommandError::Missing("facility id"));
    }
    let kind = match kind_word.to_uppercase().as_str() {
        "WORKSTATION" => FacilityKind::Workstation {
            description: attr.to_string(),
        },
        "ROOM" => FacilityKind::ConferenceRoom {
            seats: parse_number(attr)?,
        },
        other => return Err(CommandError::Unknown(format!("FACILITY ADD {other}"))),
    };
    Ok(Command::FacilityAdd {
        id: FacilityId::new(id),
        kind,
    })
}

fn parse_facility_edit(args: &str) -> Result<Command, CommandError> {
    let (id, change_part) = args
        .split_once(',')
        .ok_or(CommandError::Missing("facility change"))?;
    let id = id.trim();
    if id.is_empty() {
        return Err(CommandError::Missing("facility id"));
    }
    let (field, value) = match change_part.trim().split_once(char::is_whitespace) {
        Some((f, v)) => (f, v.trim()),
        None => (change_part.trim(), ""),
    };
    let change = match field.to_uppercase().as_str() {
        "DESCRIPTION" => FacilityChange::Description(value.to_string()),
        "SEATS" => FacilityChange::Seats(parse_number(value)?),
        "GAP" => FacilityChange::Gap(parse_number(value)?),
        other => return Err(CommandError::Unknown(format!("FACILITY EDIT {other}"))),
    };
    Ok(Command::FacilityEdit {
        id: FacilityId::new(id),
        change,
    })
}

fn parse_date(s: &str) -> Result<NaiveDate, CommandError> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|_| CommandError::BadDate(s.to_string()))
}

fn parse_date_time(s: &str) -> Result<NaiveDateTime, CommandError> {
    NaiveDateTime::parse_from_str(s, DATE_TIME_FORMAT)
        .map_err(|_| CommandError::BadDateTime(s.to_string()))
}

fn parse_number<T: std::str::FromStr>(s: &str) -> Result<T, CommandError> {
    s.parse().map_err(|_| CommandError::BadNumber(s.to_string()))
}

// ── Errors ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    Empty,
    Unknown(String),
    WrongArity(&'static str, usize, usize),
    TrailingInput(String),
    BadDate(String),
    BadDateTime(String),
    BadNumber(String),
    BadFilter(String),
    Missing(&'static str),
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandError::Empty => write!(f, "empty command"),
            CommandError::Unknown(verb) => write!(f, "unknown command: {verb}"),
            CommandError::WrongArity(what, expected, got) => {
                write!(f, "{what}: expected {expected} arguments, got {got}")
            }
            CommandError::TrailingInput(rest) => write!(f, "unexpected input: {rest}"),
            CommandError::BadDate(s) => write!(f, "bad date (want YY-MM-DD): {s}"),
            CommandError::BadDateTime(s) => {
                write!(f, "bad datetime (want YY-MM-DD HH:MM): {s}")
            }
            CommandError::BadNumber(s) => write!(f, "bad number: {s}"),
            CommandError::BadFilter(s) => write!(f, "bad filter: {s}"),
            CommandError::Missing(what) => write!(f, "missing {what}"),
        }
    }
}

impl std::error::Error for CommandError {}
