//! Diesel models mapping to the database schema.
//!
//! These types mirror the tables defined in the embedded migrations and in
//! [`crate::schema`]:
//! - [`crate::schema::farms`]: suppliers publishing listings
//! - [`crate::schema::restaurants`]: the single consuming party (one row, id 1)
//! - [`crate::schema::listings`]: a farm's offer with slot/delivery/condition flags
//! - [`crate::schema::requests`]: orders against a listing, with status and store timestamps
//! - [`crate::schema::reviews`]: at most one rating per completed request
//!
//! Read models are plain serde-serializable records. Enum-valued request columns
//! are TEXT in the store and typed here; a stored value outside its vocabulary is
//! reported as a constraint violation when the row is read.

use diesel::prelude::*;
use serde::Serialize;

use crate::{
    domain::{DeliveryMethod, FishCondition, PreferredSize, Stars, TimeSlot},
    geo::Coordinates,
    repo::RepoError,
    schema::*,
    status::RequestStatus,
};

/// Fixed identifier of the single restaurant row.
pub const RESTAURANT_ID: i32 = 1;

/// A row in [`crate::schema::farms`].
#[derive(Debug, Clone, PartialEq, Queryable, Identifiable, Selectable, Serialize)]
#[diesel(table_name = farms, check_for_backend(diesel::sqlite::Sqlite))]
pub struct Farm {
    /// Database primary key.
    pub id: i32,
    /// Display name.
    pub name: String,
    /// Free-text location.
    pub location_text: String,
    /// Latitude in signed decimal degrees.
    pub lat: Option<f64>,
    /// Longitude in signed decimal degrees.
    pub lng: Option<f64>,
    /// Map link.
    pub maps_url: Option<String>,
    /// Opaque contact text.
    pub contact: Option<String>,
}

impl Farm {
    /// Both coordinates, if present.
    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::from_parts(self.lat, self.lng)
    }
}

/// Insertable form of [`Farm`].
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = farms)]
pub struct NewFarm<'a> {
    /// Display name.
    pub name: &'a str,
    /// Free-text location.
    pub location_text: &'a str,
    /// Latitude.
    pub lat: Option<f64>,
    /// Longitude.
    pub lng: Option<f64>,
    /// Map link.
    pub maps_url: Option<&'a str>,
    /// Contact text.
    pub contact: Option<&'a str>,
}

/// The singleton row in [`crate::schema::restaurants`].
#[derive(Debug, Clone, PartialEq, Queryable, Identifiable, Selectable, Serialize)]
#[diesel(table_name = restaurants, check_for_backend(diesel::sqlite::Sqlite))]
pub struct Restaurant {
    /// Always [`RESTAURANT_ID`].
    pub id: i32,
    /// Display name.
    pub name: String,
    /// Free-text location.
    pub location_text: String,
    /// Latitude.
    pub lat: Option<f64>,
    /// Longitude.
    pub lng: Option<f64>,
    /// Map link.
    pub maps_url: Option<String>,
    /// Contact text.
    pub contact: Option<String>,
}

impl Restaurant {
    /// Both coordinates, if present.
    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::from_parts(self.lat, self.lng)
    }
}

/// Save payload for the restaurant profile.
///
/// Carries no identifier: there is exactly one restaurant and every save
/// replaces all of its fields, `None` included.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RestaurantProfile<'a> {
    /// Display name.
    pub name: &'a str,
    /// Free-text location.
    pub location_text: &'a str,
    /// Latitude.
    pub lat: Option<f64>,
    /// Longitude.
    pub lng: Option<f64>,
    /// Map link.
    pub maps_url: Option<&'a str>,
    /// Contact text.
    pub contact: Option<&'a str>,
}

// `id` is the primary key, so AsChangeset leaves it out of the UPDATE.
#[derive(Insertable, AsChangeset)]
#[diesel(table_name = restaurants, treat_none_as_null = true)]
pub(crate) struct RestaurantRow<'a> {
    pub(crate) id: i32,
    pub(crate) name: &'a str,
    pub(crate) location_text: &'a str,
    pub(crate) lat: Option<f64>,
    pub(crate) lng: Option<f64>,
    pub(crate) maps_url: Option<&'a str>,
    pub(crate) contact: Option<&'a str>,
}

impl<'a> From<&RestaurantProfile<'a>> for RestaurantRow<'a> {
    fn from(p: &RestaurantProfile<'a>) -> Self {
        Self {
            id: RESTAURANT_ID,
            name: p.name,
            location_text: p.location_text,
            lat: p.lat,
            lng: p.lng,
            maps_url: p.maps_url,
            contact: p.contact,
        }
    }
}

/// A row in [`crate::schema::listings`]. Flags are stored as INTEGER 0/1.
#[derive(Debug, Clone, PartialEq, Queryable, Identifiable, Selectable, Serialize)]
#[diesel(table_name = listings, check_for_backend(diesel::sqlite::Sqlite))]
pub struct Listing {
    /// Database primary key.
    pub id: i32,
    /// FK to [`Farm::id`].
    pub farm_id: i32,
    /// Fish name; NULL in some adopted stores.
    pub fish_name: Option<String>,
    /// Available quantity in kg (> 0).
    pub quantity_kg: f64,
    /// Price per kg (> 0).
    pub price_per_kg: f64,
    /// Offers [`TimeSlot::TodayMorning`].
    pub slot_today_morning: bool,
    /// Offers [`TimeSlot::TodayEvening`].
    pub slot_today_evening: bool,
    /// Offers [`TimeSlot::NextDayMorning`].
    pub slot_next_morning: bool,
    /// Offers [`TimeSlot::NextDayEvening`].
    pub slot_next_evening: bool,
    /// Farm delivers.
    pub allow_delivery: bool,
    /// Restaurant may collect.
    pub allow_pickup: bool,
    /// Live fish.
    pub allow_live: bool,
    /// Chilled or frozen.
    pub allow_fresh: bool,
    /// Free-text approximate ready time.
    pub approx_time: Option<String>,
}

impl Listing {
    /// Offered time slots, in vocabulary order.
    pub fn time_slots(&self) -> Vec<TimeSlot> {
        [
            (self.slot_today_morning, TimeSlot::TodayMorning),
            (self.slot_today_evening, TimeSlot::TodayEvening),
            (self.slot_next_morning, TimeSlot::NextDayMorning),
            (self.slot_next_evening, TimeSlot::NextDayEvening),
        ]
        .into_iter()
        .filter_map(|(on, slot)| on.then_some(slot))
        .collect()
    }

    /// Offered delivery methods.
    pub fn delivery_methods(&self) -> Vec<DeliveryMethod> {
        [
            (self.allow_delivery, DeliveryMethod::Delivery),
            (self.allow_pickup, DeliveryMethod::Pickup),
        ]
        .into_iter()
        .filter_map(|(on, method)| on.then_some(method))
        .collect()
    }

    /// Offered conditions; the fresh flag covers both Chilled and Frozen.
    pub fn fish_conditions(&self) -> Vec<FishCondition> {
        FishCondition::ALL
            .iter()
            .copied()
            .filter(|c| if c.is_fresh() { self.allow_fresh } else { self.allow_live })
            .collect()
    }

    /// At least one slot, one delivery method and one condition are offered.
    ///
    /// Not enforced by the repository; callers validate before creating.
    pub fn is_orderable(&self) -> bool {
        !self.time_slots().is_empty()
            && !self.delivery_methods().is_empty()
            && !self.fish_conditions().is_empty()
    }
}

/// Insertable form of [`Listing`].
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = listings)]
#[allow(missing_docs)]
pub struct NewListing<'a> {
    pub farm_id: i32,
    pub fish_name: Option<&'a str>,
    pub quantity_kg: f64,
    pub price_per_kg: f64,
    pub slot_today_morning: bool,
    pub slot_today_evening: bool,
    pub slot_next_morning: bool,
    pub slot_next_evening: bool,
    pub allow_delivery: bool,
    pub allow_pickup: bool,
    pub allow_live: bool,
    pub allow_fresh: bool,
    pub approx_time: Option<&'a str>,
}

// Raw request row; enum columns are still text.
#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = requests, check_for_backend(diesel::sqlite::Sqlite))]
pub(crate) struct RequestRow {
    pub(crate) id: i32,
    pub(crate) listing_id: i32,
    pub(crate) restaurant_id: i32,
    pub(crate) status: String,
    pub(crate) quantity_kg: f64,
    pub(crate) preferred_size_text: Option<String>,
    pub(crate) fish_condition: String,
    pub(crate) time_slot: String,
    pub(crate) delivery_method: String,
    pub(crate) preferred_time_window: Option<String>,
    pub(crate) notes: Option<String>,
    pub(crate) distance_km: Option<f64>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

/// A request placed against a listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Request {
    /// Database primary key.
    pub id: i32,
    /// FK to [`Listing::id`].
    pub listing_id: i32,
    /// Always [`RESTAURANT_ID`] for requests created here.
    pub restaurant_id: i32,
    /// Lifecycle position.
    pub status: RequestStatus,
    /// Requested kg (> 0).
    pub quantity_kg: f64,
    /// Stored preferred-size text, e.g. `"600-800"`.
    pub preferred_size_text: Option<String>,
    /// Requested condition.
    pub fish_condition: FishCondition,
    /// Requested slot.
    pub time_slot: TimeSlot,
    /// Delivery or pickup.
    pub delivery_method: DeliveryMethod,
    /// e.g. `"7–8"` or `"Any evening"`.
    pub preferred_time_window: Option<String>,
    /// Free text from the restaurant.
    pub notes: Option<String>,
    /// Distance memo recorded at creation. Not authoritative.
    pub distance_km: Option<f64>,
    /// Store-assigned RFC-3339 UTC.
    pub created_at: String,
    /// Store-assigned RFC-3339 UTC; refreshed on every status change.
    pub updated_at: String,
}

impl Request {
    /// Parsed preferred size; `None` when absent or not parseable.
    pub fn preferred_size(&self) -> Option<PreferredSize> {
        self.preferred_size_text
            .as_deref()
            .and_then(|text| PreferredSize::parse_optional(text).ok().flatten())
    }
}

fn stored<T, E: std::fmt::Display>(parsed: Result<T, E>) -> Result<T, RepoError> {
    parsed.map_err(|e| RepoError::ConstraintViolation(format!("stored value: {e}")))
}

impl TryFrom<RequestRow> for Request {
    type Error = RepoError;

    fn try_from(row: RequestRow) -> Result<Self, Self::Error> {
        Ok(Request {
            id: row.id,
            listing_id: row.listing_id,
            restaurant_id: row.restaurant_id,
            status: stored(row.status.parse())?,
            quantity_kg: row.quantity_kg,
            preferred_size_text: row.preferred_size_text,
            fish_condition: stored(row.fish_condition.parse())?,
            time_slot: stored(row.time_slot.parse())?,
            delivery_method: stored(row.delivery_method.parse())?,
            preferred_time_window: row.preferred_time_window,
            notes: row.notes,
            distance_km: row.distance_km,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Caller input for a new request.
///
/// The restaurant is implicit and the status always starts at
/// [`RequestStatus::Requested`]; timestamps come from the store.
#[derive(Debug, Clone, Copy, PartialEq)]
#[allow(missing_docs)]
pub struct NewRequest<'a> {
    pub listing_id: i32,
    pub quantity_kg: f64,
    pub preferred_size: Option<PreferredSize>,
    pub fish_condition: FishCondition,
    pub time_slot: TimeSlot,
    pub delivery_method: DeliveryMethod,
    pub preferred_time_window: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub distance_km: Option<f64>,
}

#[derive(Insertable)]
#[diesel(table_name = requests)]
pub(crate) struct RequestInsert<'a> {
    pub(crate) listing_id: i32,
    pub(crate) restaurant_id: i32,
    pub(crate) status: &'static str,
    pub(crate) quantity_kg: f64,
    pub(crate) preferred_size_text: Option<String>,
    pub(crate) fish_condition: &'static str,
    pub(crate) time_slot: &'static str,
    pub(crate) delivery_method: &'static str,
    pub(crate) preferred_time_window: Option<&'a str>,
    pub(crate) notes: Option<&'a str>,
    pub(crate) distance_km: Option<f64>,
}

impl<'a> From<&NewRequest<'a>> for RequestInsert<'a> {
    fn from(r: &NewRequest<'a>) -> Self {
        Self {
            listing_id: r.listing_id,
            restaurant_id: RESTAURANT_ID,
            status: RequestStatus::Requested.as_str(),
            quantity_kg: r.quantity_kg,
            preferred_size_text: r.preferred_size.map(|s| s.to_string()),
            fish_condition: r.fish_condition.as_str(),
            time_slot: r.time_slot.as_str(),
            delivery_method: r.delivery_method.as_str(),
            preferred_time_window: r.preferred_time_window,
            notes: r.notes,
            distance_km: r.distance_km,
        }
    }
}

/// Optional `list_requests` filters, combined with AND.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestFilter {
    /// Only requests from this restaurant.
    pub restaurant_id: Option<i32>,
    /// Only requests against listings of this farm.
    pub farm_id: Option<i32>,
    /// Only requests in exactly this status.
    pub status: Option<RequestStatus>,
}

/// A row in [`crate::schema::reviews`].
#[derive(Debug, Clone, PartialEq, Queryable, Identifiable, Selectable, Serialize)]
#[diesel(table_name = reviews, check_for_backend(diesel::sqlite::Sqlite))]
pub struct Review {
    /// Database primary key.
    pub id: i32,
    /// FK to [`Request::id`]; unique.
    pub request_id: i32,
    /// Farm that fulfilled the request.
    pub farm_id: i32,
    /// Reviewing restaurant.
    pub restaurant_id: i32,
    /// 1..=5.
    pub stars: i32,
    /// Optional free text.
    pub comment: Option<String>,
}

/// Caller input for a review. Farm and restaurant are derived from the request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewReview<'a> {
    /// The completed request being reviewed.
    pub request_id: i32,
    /// Rating.
    pub stars: Stars,
    /// Optional free text.
    pub comment: Option<&'a str>,
}

#[derive(Insertable)]
#[diesel(table_name = reviews)]
pub(crate) struct ReviewInsert<'a> {
    pub(crate) request_id: i32,
    pub(crate) farm_id: i32,
    pub(crate) restaurant_id: i32,
    pub(crate) stars: i32,
    pub(crate) comment: Option<&'a str>,
}
