use chrono::{NaiveDate, NaiveDateTime};
use tracing::{info, warn};

use crate::directory::Directory;
use crate::engine::Engine;
use crate::model::{Facility, FacilityId, User};

fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .and_then(|date| date.and_hms_opt(h, mi, 0))
        .expect("valid seed datetime")
}

/// Populate the demo catalog: a few workstations, two conference rooms,
/// a regular user and some bookings to make availability queries
/// interesting out of the box.
pub async fn populate(engine: &Engine, directory: &Directory, gap_minutes: i64) {
    let facilities = [
        Facility::workstation(FacilityId::new("ws001"), "Celeron", gap_minutes),
        Facility::workstation(FacilityId::new("ws002"), "Core i5", gap_minutes),
        Facility::workstation(FacilityId::new("ws003"), "Core i7", gap_minutes),
        Facility::conference_room(FacilityId::new("cr001"), 17, gap_minutes),
        Facility::conference_room(FacilityId::new("cr002"), 11, gap_minutes),
    ];
    for facility in facilities {
        if let Err(e) = engine.add_facility(facility) {
            warn!("seed facility skipped: {e}");
        }
    }

    if let Err(e) = directory.register("u1", "pwd1") {
        warn!("seed user skipped: {e}");
    }
    let u1 = User::new("u1", "pwd1");

    let bookings = [
        ("ws002", dt(2024, 7, 7, 11, 0), dt(2024, 7, 7, 13, 0)),
        ("ws002", dt(2024, 7, 7, 15, 0), dt(2024, 7, 7, 17, 0)),
        ("cr002", dt(2024, 7, 6, 11, 0), dt(2024, 7, 7, 17, 0)),
    ];
    for (id, start, end) in bookings {
        match engine.add_booking(&u1, &FacilityId::new(id), start, end).await {
            Ok(true) => {}
            Ok(false) => warn!("seed booking on {id} conflicts, skipped"),
            Err(e) => warn!("seed booking on {id} failed: {e}"),
        }
    }

    info!("seeded demo data: {} facilities", engine.facility_count());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seed_is_idempotent_enough() {
        let engine = Engine::new();
        let directory = Directory::new();
        populate(&engine, &directory, 15).await;
        assert_eq!(engine.facility_count(), 5);
        assert_eq!(engine.all_bookings().await.len(), 3);

        // Running twice must not duplicate or panic.
        populate(&engine, &directory, 15).await;
        assert_eq!(engine.facility_count(), 5);
        assert_eq!(engine.all_bookings().await.len(), 3);
    }

    #[tokio::test]
    async fn seeded_day_has_expected_free_slots() {
        let engine = Engine::new();
        let directory = Directory::new();
        populate(&engine, &directory, 15).await;

        let date = NaiveDate::from_ymd_opt(2024, 7, 7).unwrap();
        let cr002 = engine
            .free_slots(&FacilityId::new("cr002"), date)
            .await
            .unwrap();
        // The room is taken from the day before until 17:00.
        assert_eq!(cr002.len(), 1);
        assert_eq!(cr002[0].start, dt(2024, 7, 7, 17, 15));

        let ws001 = engine
            .free_slots(&FacilityId::new("ws001"), date)
            .await
            .unwrap();
        assert_eq!(ws001.len(), 1); // untouched facility: whole day
    }
}
