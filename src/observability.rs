use std::net::SocketAddr;

use crate::command::Command;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: total commands executed. Labels: command.
pub const COMMANDS_TOTAL: &str = "hotdesk_commands_total";

/// Histogram: command latency in seconds. Labels: command.
pub const COMMAND_DURATION_SECONDS: &str = "hotdesk_command_duration_seconds";

/// Counter: bookings placed.
pub const BOOKINGS_PLACED_TOTAL: &str = "hotdesk_bookings_placed_total";

/// Counter: bookings refused due to conflict.
pub const BOOKINGS_REJECTED_TOTAL: &str = "hotdesk_bookings_rejected_total";

// ── USE metrics (resource utilization) ──────────────────────────

/// Gauge: active TCP connections.
pub const CONNECTIONS_ACTIVE: &str = "hotdesk_connections_active";

/// Counter: total connections accepted.
pub const CONNECTIONS_TOTAL: &str = "hotdesk_connections_total";

/// Counter: connections rejected due to limit.
pub const CONNECTIONS_REJECTED_TOTAL: &str = "hotdesk_connections_rejected_total";

/// Counter: failed login attempts.
pub const AUTH_FAILURES_TOTAL: &str = "hotdesk_auth_failures_total";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}

/// Map a Command variant to a short label for metrics.
pub fn command_label(cmd: &Command) -> &'static str {
    match cmd {
        Command::Register { .. } => "register",
        Command::Login { .. } => "login",
        Command::Logout => "logout",
        Command::Quit => "quit",
        Command::Facilities => "facilities",
        Command::Free { .. } => "free",
        Command::Book { .. } => "book",
        Command::Cancel { .. } => "cancel",
        Command::Bookings(_) => "bookings",
        Command::FacilityAdd { .. } => "facility_add",
        Command::FacilityEdit { .. } => "facility_edit",
        Command::FacilityRemove { .. } => "facility_remove",
    }
}
