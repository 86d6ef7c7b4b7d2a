use chrono_tz::Asia::Phnom_Penh;
use diesel::prelude::*;
use fishlink::domain::estimated_delivery_fee;
use fishlink::geo::haversine_km;
use fishlink::matching::{self, ListingSort, Proximity};
use fishlink::models::RequestFilter;
use fishlink::repo::{FishlinkRepo, SqliteRepo};
use fishlink::status::RequestStatus;

mod common;
use common::*;

const NEAR: (f64, f64) = (11.60, 104.90);
const FAR: (f64, f64) = (12.00, 104.50);

struct World {
    near_farm: i32,
    far_listing: i32,
    blank_listing: i32,
    near_listing: i32,
}

fn world(conn: &mut SqliteConnection) -> World {
    seed_restaurant(conn);
    let far_farm = seed_farm(conn, "Far Ponds", Some(FAR));
    let blank_farm = seed_farm(conn, "No Pin Farm", None);
    let near_farm = seed_farm(conn, "Near Ponds", Some(NEAR));
    World {
        near_farm,
        far_listing: seed_listing(conn, far_farm),
        blank_listing: seed_listing(conn, blank_farm),
        near_listing: seed_listing(conn, near_farm),
    }
}

fn near_km() -> f64 {
    haversine_km(NEAR.0, NEAR.1, RESTAURANT_LAT, RESTAURANT_LNG)
}

#[test]
fn listings_view_keeps_id_order_by_default() {
    let (_db, mut conn) = setup_db();
    let w = world(&mut conn);

    let views = matching::listings_view(&SqliteRepo::new(), &mut conn, ListingSort::Id).unwrap();
    let ids: Vec<i32> = views.iter().map(|v| v.listing.id).collect();
    assert_eq!(ids, vec![w.far_listing, w.blank_listing, w.near_listing]);

    let blank = &views[1];
    assert_eq!(blank.farm.name, "No Pin Farm");
    assert_eq!(blank.proximity, Proximity::Unknown);
    assert_eq!(blank.estimated_fee, None);
    assert_eq!(blank.farm_rating, None);
}

#[test]
fn distance_sort_puts_unknown_last() {
    let (_db, mut conn) = setup_db();
    let w = world(&mut conn);

    let views =
        matching::listings_view(&SqliteRepo::new(), &mut conn, ListingSort::Distance).unwrap();
    let ids: Vec<i32> = views.iter().map(|v| v.listing.id).collect();
    assert_eq!(ids, vec![w.near_listing, w.far_listing, w.blank_listing]);

    let near = &views[0];
    let km = near.proximity.km().expect("known distance");
    assert!((km - near_km()).abs() < 1e-9);
    assert_eq!(near.estimated_fee, Some(estimated_delivery_fee(km)));
}

#[test]
fn restaurant_without_coordinates_makes_every_distance_unknown() {
    let (_db, mut conn) = setup_db();
    world(&mut conn);
    diesel::sql_query("UPDATE restaurants SET lat = NULL")
        .execute(&mut conn)
        .unwrap();

    let views = matching::listings_view(&SqliteRepo::new(), &mut conn, ListingSort::Distance)
        .unwrap();
    assert!(views.iter().all(|v| v.proximity == Proximity::Unknown));
}

#[test]
fn place_request_records_distance_memo() {
    let (_db, mut conn) = setup_db();
    let w = world(&mut conn);
    let repo = SqliteRepo::new();

    let mut new = request_for(w.near_listing);
    new.distance_km = Some(999.0);
    let id = matching::place_request(&repo, &mut conn, &new).unwrap();
    let memo = repo.get_request(&mut conn, id).unwrap().unwrap().distance_km;
    assert!((memo.unwrap() - near_km()).abs() < 1e-9);

    let id = matching::place_request(&repo, &mut conn, &request_for(w.blank_listing)).unwrap();
    assert_eq!(repo.get_request(&mut conn, id).unwrap().unwrap().distance_km, None);
}

#[test]
fn views_recompute_after_coordinate_correction() {
    let (_db, mut conn) = setup_db();
    let w = world(&mut conn);
    let repo = SqliteRepo::new();
    let id = matching::place_request(&repo, &mut conn, &request_for(w.near_listing)).unwrap();

    // farm pin moved onto the restaurant
    diesel::sql_query("UPDATE farms SET lat = ?, lng = ? WHERE id = ?")
        .bind::<diesel::sql_types::Double, _>(RESTAURANT_LAT)
        .bind::<diesel::sql_types::Double, _>(RESTAURANT_LNG)
        .bind::<diesel::sql_types::Integer, _>(w.near_farm)
        .execute(&mut conn)
        .unwrap();

    let views = matching::request_views(&repo, &mut conn, &RequestFilter::default(), Phnom_Penh)
        .unwrap();
    assert_eq!(views.len(), 1);
    let view = &views[0];
    assert_eq!(view.request.id, id);
    assert_eq!(view.proximity, Proximity::Known { km: 0.0 });
    // the memo keeps the distance recorded at placement
    assert!((view.request.distance_km.unwrap() - near_km()).abs() < 1e-9);
}

#[test]
fn request_views_carry_local_times_and_next_step() {
    let (_db, mut conn) = setup_db();
    let w = world(&mut conn);
    let repo = SqliteRepo::new();
    let id = matching::place_request(&repo, &mut conn, &request_for(w.far_listing)).unwrap();
    repo.update_request_status(&mut conn, id, RequestStatus::Accepted)
        .unwrap();

    let views = matching::request_views(
        &repo,
        &mut conn,
        &RequestFilter {
            farm_id: Some(w.near_farm),
            ..Default::default()
        },
        Phnom_Penh,
    )
    .unwrap();
    assert!(views.is_empty());

    let views = matching::request_views(&repo, &mut conn, &RequestFilter::default(), Phnom_Penh)
        .unwrap();
    let view = &views[0];
    assert_eq!(view.farm.name, "Far Ponds");
    assert_eq!(view.next_status, Some(RequestStatus::Preparing));
    assert!(view.updated_local.ends_with("(UTC+07:00)"), "{}", view.updated_local);
    assert_eq!(
        view.created_local,
        fishlink::tz::to_local_display(&view.request.created_at, Phnom_Penh)
    );
}

#[test]
fn status_summary_counts_every_status() {
    let (_db, mut conn) = setup_db();
    let w = world(&mut conn);
    let repo = SqliteRepo::new();

    let a = seed_request(&mut conn, w.near_listing);
    seed_request(&mut conn, w.near_listing);
    seed_request(&mut conn, w.far_listing);
    repo.update_request_status(&mut conn, a, RequestStatus::Accepted)
        .unwrap();

    let summary = matching::status_summary(&repo, &mut conn, &RequestFilter::default()).unwrap();
    assert_eq!(summary.len(), 5);
    assert_eq!(summary[&RequestStatus::Requested], 2);
    assert_eq!(summary[&RequestStatus::Accepted], 1);
    assert_eq!(summary[&RequestStatus::Completed], 0);

    let near_only = matching::status_summary(
        &repo,
        &mut conn,
        &RequestFilter {
            farm_id: Some(w.near_farm),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(near_only.values().sum::<usize>(), 2);
}

#[test]
fn listing_view_serializes_for_presentation() {
    let (_db, mut conn) = setup_db();
    world(&mut conn);

    let views = matching::listings_view(&SqliteRepo::new(), &mut conn, ListingSort::Id).unwrap();
    let json = serde_json::to_value(&views[1]).unwrap();
    assert_eq!(json["proximity"], serde_json::json!({ "kind": "unknown" }));
    assert_eq!(json["farm"]["name"], "No Pin Farm");
    assert_eq!(json["listing"]["allow_live"], true);
}
