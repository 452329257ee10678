use std::sync::Arc;
use std::time::Instant;

use futures::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_rustls::TlsAcceptor;
use tokio_util::codec::{Framed, LinesCodec};
use tracing::debug;

use crate::auth::Authenticator;
use crate::command::{self, BookingFilter, Command};
use crate::directory::Directory;
use crate::engine::Engine;
use crate::model::{Booking, Facility, FacilityId, TimeSlot, User};
use crate::observability;

const MAX_LINE_LEN: usize = 8192;

/// Shared handles one connection needs to serve commands.
pub struct Handler {
    engine: Arc<Engine>,
    directory: Arc<Directory>,
    auth: Arc<dyn Authenticator>,
    default_gap_minutes: i64,
}

impl Handler {
    pub fn new(engine: Arc<Engine>, directory: Arc<Directory>, default_gap_minutes: i64) -> Self {
        let auth: Arc<dyn Authenticator> = directory.clone();
        Self {
            engine,
            directory,
            auth,
            default_gap_minutes,
        }
    }
}

/// Per-connection session state: the logged-in user, if any.
struct Session {
    user: Option<User>,
}

enum Outcome {
    Reply(Vec<String>),
    Close(String),
}

pub async fn process_connection(
    socket: TcpStream,
    handler: Arc<Handler>,
    tls: Option<TlsAcceptor>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let codec = LinesCodec::new_with_max_length(MAX_LINE_LEN);
    match tls {
        Some(acceptor) => {
            let stream = acceptor.accept(socket).await?;
            run_session(Framed::new(stream, codec), handler).await
        }
        None => run_session(Framed::new(socket, codec), handler).await,
    }
}

async fn run_session<S>(
    mut framed: Framed<S, LinesCodec>,
    handler: Arc<Handler>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    framed.send("OK hotdesk ready".to_string()).await?;
    let mut session = Session { user: None };

    while let Some(line) = framed.next().await {
        let line = line?;
        let cmd = match command::parse_line(&line) {
            Ok(cmd) => cmd,
            Err(e) => {
                debug!("unparseable command: {e}");
                framed.send(format!("ERR {e}")).await?;
                continue;
            }
        };

        let label = observability::command_label(&cmd);
        metrics::counter!(observability::COMMANDS_TOTAL, "command" => label).increment(1);
        let started = Instant::now();
        let outcome = handler.execute(&mut session, cmd).await;
        metrics::histogram!(observability::COMMAND_DURATION_SECONDS, "command" => label)
            .record(started.elapsed().as_secs_f64());

        match outcome {
            Outcome::Reply(lines) => {
                for l in lines {
                    framed.send(l).await?;
                }
            }
            Outcome::Close(reply) => {
                framed.send(reply).await?;
                break;
            }
        }
    }
    Ok(())
}

impl Handler {
    async fn execute(&self, session: &mut Session, cmd: Command) -> Outcome {
        match cmd {
            Command::Quit => Outcome::Close("OK bye".into()),
            Command::Register { login, password } => {
                match self.directory.register(&login, &password) {
                    Ok(()) => ok(format!("OK registered {login}")),
                    Err(e) => err(e),
                }
            }
            Command::Login { login, password } => {
                match self.auth.authenticate(&login, &password).await {
                    Ok(user) => {
                        let role = if user.is_admin { "admin" } else { "user" };
                        debug!("login: {} ({role})", user.login);
                        session.user = Some(user);
                        ok(format!("OK logged in as {role}"))
                    }
                    Err(e) => {
                        metrics::counter!(observability::AUTH_FAILURES_TOTAL).increment(1);
                        err(e)
                    }
                }
            }
            Command::Logout => {
                session.user = None;
                ok("OK logged out")
            }
            // Everything else requires a session.
            cmd => {
                let Some(user) = session.user.clone() else {
                    return err("login required");
                };
                self.execute_authed(&user, cmd).await
            }
        }
    }

    async fn execute_authed(&self, user: &User, cmd: Command) -> Outcome {
        match cmd {
            Command::Facilities => {
                let facilities = self.engine.list_facilities().await;
                listing(facilities.iter())
            }
            Command::Free { date, facility } => match facility {
                Some(id) => {
                    let slots = match self.engine.free_slots(&id, date).await {
                        Ok(slots) => slots,
                        Err(e) => return err(e),
                    };
                    let row = FreeSlotsRow { facility: &id, slots: &slots };
                    listing(std::iter::once(&row))
                }
                None => {
                    let per_facility = self.engine.day_free_slots(date).await;
                    let rows: Vec<FreeSlotsRow<'_>> = per_facility
                        .iter()
                        .map(|(f, slots)| FreeSlotsRow { facility: &f.id, slots })
                        .collect();
                    listing(rows.iter())
                }
            },
            Command::Book { facility, start, end } => {
                match self.engine.add_booking(user, &facility, start, end).await {
                    Ok(true) => {
                        metrics::counter!(observability::BOOKINGS_PLACED_TOTAL).increment(1);
                        ok("OK booked")
                    }
                    Ok(false) => {
                        metrics::counter!(observability::BOOKINGS_REJECTED_TOTAL).increment(1);
                        err("conflict: slot unavailable")
                    }
                    Err(e) => err(e),
                }
            }
            Command::Cancel { facility, start, end } => {
                match self.engine.remove_booking(&facility, start, end, user).await {
                    Ok(()) => ok("OK cancelled"),
                    Err(e) => err(e),
                }
            }
            Command::Bookings(filter) => self.list_bookings(user, filter).await,
            Command::FacilityAdd { id, kind } => {
                if let Some(refusal) = require_admin(user) {
                    return refusal;
                }
                let facility = Facility {
                    id,
                    kind,
                    gap_minutes: self.default_gap_minutes,
                    min_slot_minutes: None,
                };
                match self.engine.add_facility(facility) {
                    Ok(()) => ok("OK facility added"),
                    Err(e) => err(e),
                }
            }
            Command::FacilityEdit { id, change } => {
                if let Some(refusal) = require_admin(user) {
                    return refusal;
                }
                match self.engine.update_facility(&id, change).await {
                    Ok(_) => ok("OK facility updated"),
                    Err(e) => err(e),
                }
            }
            Command::FacilityRemove { id } => {
                if let Some(refusal) = require_admin(user) {
                    return refusal;
                }
                match self.engine.remove_facility(&id) {
                    Ok(()) => ok("OK facility removed"),
                    Err(e) => err(e),
                }
            }
            Command::Register { .. } | Command::Login { .. } | Command::Logout | Command::Quit => {
                unreachable!("handled before authentication")
            }
        }
    }

    async fn list_bookings(&self, user: &User, filter: BookingFilter) -> Outcome {
        let bookings: Vec<Booking> = match filter {
            BookingFilter::Own => self.engine.bookings_for_user(&user.login).await,
            BookingFilter::All => {
                if let Some(refusal) = require_admin(user) {
                    return refusal;
                }
                self.engine.all_bookings().await
            }
            BookingFilter::User(login) => {
                if let Some(refusal) = require_admin(user) {
                    return refusal;
                }
                self.engine.bookings_for_user(&login).await
            }
            BookingFilter::Facility(id) => {
                if let Some(refusal) = require_admin(user) {
                    return refusal;
                }
                match self.engine.bookings_for_facility(&id).await {
                    Ok(bookings) => bookings,
                    Err(e) => return err(e),
                }
            }
        };
        listing(bookings.iter())
    }
}

// ── Response shapes ──────────────────────────────────────────────

#[derive(Serialize)]
struct FreeSlotsRow<'a> {
    facility: &'a FacilityId,
    slots: &'a [TimeSlot],
}

fn ok(msg: impl Into<String>) -> Outcome {
    Outcome::Reply(vec![msg.into()])
}

fn err(e: impl std::fmt::Display) -> Outcome {
    Outcome::Reply(vec![format!("ERR {e}")])
}

fn require_admin(user: &User) -> Option<Outcome> {
    if user.is_admin {
        None
    } else {
        Some(err("forbidden: admin only"))
    }
}

/// `ROW <json>` per item, closed by `OK <count>`.
fn listing<'a, T: Serialize + 'a>(items: impl Iterator<Item = &'a T>) -> Outcome {
    let mut lines = Vec::new();
    for item in items {
        match serde_json::to_string(item) {
            Ok(json) => lines.push(format!("ROW {json}")),
            Err(e) => return err(format!("serialize: {e}")),
        }
    }
    let count = lines.len();
    lines.push(format!("OK {count}"));
    Outcome::Reply(lines)
}
