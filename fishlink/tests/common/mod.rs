#![allow(dead_code)]

use diesel::QueryableByName;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Integer, Text};
use fishlink::db::{connection, migrate};
use fishlink::domain::{DeliveryMethod, FishCondition, TimeSlot};
use fishlink::models::{NewFarm, NewListing, NewRequest, RestaurantProfile};
use fishlink::repo::{FishlinkRepo, SqliteRepo};
use std::path::PathBuf;
use tempfile::TempDir;

#[derive(QueryableByName)]
struct JournalMode {
    #[diesel(sql_type = Text)]
    journal_mode: String,
}
#[derive(QueryableByName)]
struct ForeignKeys {
    #[diesel(sql_type = Integer)]
    foreign_keys: i32,
}
#[derive(QueryableByName)]
struct BusyTimeout {
    #[diesel(sql_type = Integer, column_name = "timeout")]
    busy_timeout: i32,
}
#[derive(QueryableByName)]
struct Count {
    #[diesel(sql_type = BigInt)]
    cnt: i64,
}

pub struct TestDb {
    pub dir: TempDir,   // keep alive for the life of the test
    pub path: PathBuf, // <tmpdir>/test.db
}

pub fn setup_db() -> (TestDb, SqliteConnection) {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("test.db");

    migrate::run_sqlite(&path).expect("migrations");

    // open a connection with PRAGMAs applied
    let conn = connection::connect_sqlite(&path).expect("connect");
    (TestDb { dir, path }, conn)
}

pub fn assert_sqlite_pragmas(conn: &mut SqliteConnection) {
    use diesel::sql_query;

    let jm: JournalMode = sql_query("PRAGMA journal_mode;").get_result(conn).unwrap();
    assert_eq!(jm.journal_mode.to_lowercase(), "wal"); // WAL is persistent per DB file

    let fk: ForeignKeys = sql_query("PRAGMA foreign_keys;").get_result(conn).unwrap();
    assert_eq!(fk.foreign_keys, 1);

    let bt: BusyTimeout = sql_query("PRAGMA busy_timeout;").get_result(conn).unwrap();
    assert_eq!(bt.busy_timeout, 5000);
}

pub fn count_rows(conn: &mut SqliteConnection, table: &str) -> i64 {
    let c: Count = diesel::sql_query(format!("SELECT COUNT(*) AS cnt FROM {table}"))
        .get_result(conn)
        .unwrap();
    c.cnt
}

// Phnom Penh riverside and a farm ~12 km up the Tonle Sap.
pub const RESTAURANT_LAT: f64 = 11.5564;
pub const RESTAURANT_LNG: f64 = 104.9282;

pub fn seed_restaurant(conn: &mut SqliteConnection) -> i32 {
    SqliteRepo::new()
        .upsert_restaurant(
            conn,
            &RestaurantProfile {
                name: "Riverside Kitchen",
                location_text: "Sisowath Quay",
                lat: Some(RESTAURANT_LAT),
                lng: Some(RESTAURANT_LNG),
                maps_url: None,
                contact: Some("+855 12 000 000"),
            },
        )
        .expect("restaurant")
}

pub fn seed_farm(conn: &mut SqliteConnection, name: &str, coords: Option<(f64, f64)>) -> i32 {
    SqliteRepo::new()
        .create_farm(
            conn,
            &NewFarm {
                name,
                location_text: "Tonle Sap",
                lat: coords.map(|c| c.0),
                lng: coords.map(|c| c.1),
                maps_url: None,
                contact: None,
            },
        )
        .expect("farm")
}

pub fn listing_for(farm_id: i32) -> NewListing<'static> {
    NewListing {
        farm_id,
        fish_name: Some("Snakehead"),
        quantity_kg: 40.0,
        price_per_kg: 4.25,
        slot_today_morning: true,
        slot_today_evening: false,
        slot_next_morning: true,
        slot_next_evening: false,
        allow_delivery: true,
        allow_pickup: false,
        allow_live: true,
        allow_fresh: false,
        approx_time: Some("06:30"),
    }
}

pub fn seed_listing(conn: &mut SqliteConnection, farm_id: i32) -> i32 {
    SqliteRepo::new()
        .create_listing(conn, &listing_for(farm_id))
        .expect("listing")
}

pub fn request_for(listing_id: i32) -> NewRequest<'static> {
    NewRequest {
        listing_id,
        quantity_kg: 5.0,
        preferred_size: None,
        fish_condition: FishCondition::Live,
        time_slot: TimeSlot::TodayMorning,
        delivery_method: DeliveryMethod::Delivery,
        preferred_time_window: Some("7–8"),
        notes: None,
        distance_km: None,
    }
}

pub fn seed_request(conn: &mut SqliteConnection, listing_id: i32) -> i32 {
    SqliteRepo::new()
        .create_request(conn, &request_for(listing_id))
        .expect("request")
}
