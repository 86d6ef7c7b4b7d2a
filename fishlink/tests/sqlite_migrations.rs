mod common;
use common::{assert_sqlite_pragmas, setup_db};

use diesel::QueryableByName;
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{Integer, Text};

#[derive(QueryableByName)]
struct TblCnt {
    #[diesel(sql_type = Integer)]
    cnt: i32,
}
#[derive(QueryableByName)]
struct TimeStr {
    #[diesel(sql_type = Text)]
    t: String,
}

fn seed_request_sql(conn: &mut SqliteConnection) {
    sql_query("INSERT INTO farms (name, location_text) VALUES ('Mekong Ponds', 'Kandal');")
        .execute(conn)
        .unwrap();
    sql_query(
        "INSERT INTO listings (
            farm_id, fish_name, quantity_kg, price_per_kg,
            slot_today_morning, slot_today_evening, slot_next_morning, slot_next_evening,
            allow_delivery, allow_pickup, allow_live, allow_fresh
        ) VALUES (1, 'Catfish', 10, 3, 1, 0, 0, 0, 1, 0, 1, 0);",
    )
    .execute(conn)
    .unwrap();
    sql_query(
        "INSERT INTO requests (
            listing_id, restaurant_id, status, quantity_kg,
            fish_condition, time_slot, delivery_method
        ) VALUES (1, 1, 'Requested', 2, 'Live', 'Today Morning', 'Delivery');",
    )
    .execute(conn)
    .unwrap();
}

#[test]
fn migrations_apply_and_pragmas_are_set() {
    let (_db, mut conn) = setup_db();

    // PRAGMAs (WAL is a persistent property of the .db file; FKs/timeout are per-connection)
    assert_sqlite_pragmas(&mut conn);

    let tbls: TblCnt = sql_query(
        "SELECT COUNT(*) AS cnt
            FROM sqlite_master
            WHERE type='table'
            AND name IN ('farms','restaurants','listings','requests','reviews');",
    )
    .get_result(&mut conn)
    .unwrap();
    assert_eq!(tbls.cnt, 5, "expected five tables to be present");
}

#[test]
fn status_update_touches_updated_at() {
    let (_db, mut conn) = setup_db();
    seed_request_sql(&mut conn);

    let before: TimeStr = sql_query("SELECT updated_at AS t FROM requests WHERE id = 1;")
        .get_result(&mut conn)
        .unwrap();
    assert!(before.t.ends_with('Z'), "{}", before.t);

    sql_query("UPDATE requests SET status = 'Accepted' WHERE id = 1;")
        .execute(&mut conn)
        .unwrap();

    let after: TimeStr = sql_query("SELECT updated_at AS t FROM requests WHERE id = 1;")
        .get_result(&mut conn)
        .unwrap();
    assert!(after.t > before.t, "updated_at should move on status change");

    // other columns do not touch it
    sql_query("UPDATE requests SET notes = 'x' WHERE id = 1;")
        .execute(&mut conn)
        .unwrap();
    let untouched: TimeStr = sql_query("SELECT updated_at AS t FROM requests WHERE id = 1;")
        .get_result(&mut conn)
        .unwrap();
    assert_eq!(untouched.t, after.t);
}

#[test]
fn store_rejects_values_outside_the_closed_sets() {
    let (_db, mut conn) = setup_db();
    seed_request_sql(&mut conn);

    assert!(
        sql_query("UPDATE requests SET status = 'Shipped' WHERE id = 1;")
            .execute(&mut conn)
            .is_err()
    );
    assert!(
        sql_query(
            "INSERT INTO reviews (request_id, farm_id, restaurant_id, stars) VALUES (1, 1, 1, 6);"
        )
        .execute(&mut conn)
        .is_err()
    );
    assert!(
        sql_query("INSERT INTO restaurants (id, name, location_text) VALUES (2, 'Other', 'x');")
            .execute(&mut conn)
            .is_err()
    );
}

#[test]
fn one_review_per_request() {
    let (_db, mut conn) = setup_db();
    seed_request_sql(&mut conn);

    let insert =
        "INSERT INTO reviews (request_id, farm_id, restaurant_id, stars) VALUES (1, 1, 1, 4);";
    sql_query(insert).execute(&mut conn).unwrap();
    assert!(sql_query(insert).execute(&mut conn).is_err());
}

#[test]
fn foreign_keys_are_enforced() {
    let (_db, mut conn) = setup_db();
    let res = sql_query(
        "INSERT INTO listings (
            farm_id, quantity_kg, price_per_kg,
            slot_today_morning, slot_today_evening, slot_next_morning, slot_next_evening,
            allow_delivery, allow_pickup, allow_live, allow_fresh
        ) VALUES (77, 1, 1, 1, 0, 0, 0, 1, 0, 1, 0);",
    )
    .execute(&mut conn);
    assert!(res.is_err());
}
