use diesel::prelude::*;
use tracing::{debug, info};

use crate::{
    models::{
        Farm, Listing, NewFarm, NewListing, NewRequest, NewReview, RESTAURANT_ID, Request,
        RequestFilter, RequestInsert, RequestRow, Restaurant, RestaurantProfile, RestaurantRow,
        Review, ReviewInsert,
    },
    repo::{FishlinkRepo, RepoError, RepoResult},
    schema::{farms, listings, requests, restaurants, reviews},
    status::RequestStatus,
};

/// Repository over the FishLink tables in a SQLite database.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteRepo;

impl SqliteRepo {
    /// Stateless; every call takes the connection explicitly.
    pub fn new() -> Self {
        Self
    }
}

fn stored_status(text: &str) -> RepoResult<RequestStatus> {
    text.parse()
        .map_err(|e| RepoError::ConstraintViolation(format!("stored value: {e}")))
}

fn ensure_exists(found: Option<i32>, entity: &'static str, id: i32) -> RepoResult<()> {
    match found {
        Some(_) => Ok(()),
        None => Err(RepoError::NotFound { entity, id }),
    }
}

fn load_request(conn: &mut SqliteConnection, id: i32) -> RepoResult<Option<Request>> {
    requests::table
        .find(id)
        .select(RequestRow::as_select())
        .first(conn)
        .optional()?
        .map(Request::try_from)
        .transpose()
}

impl FishlinkRepo for SqliteRepo {
    fn create_farm(&self, conn: &mut SqliteConnection, farm: &NewFarm<'_>) -> RepoResult<i32> {
        let id = conn.immediate_transaction::<_, RepoError, _>(|conn| {
            Ok(diesel::insert_into(farms::table)
                .values(farm)
                .returning(farms::id)
                .get_result(conn)?)
        })?;
        debug!(farm_id = id, name = farm.name, "farm created");
        Ok(id)
    }

    fn get_farm(&self, conn: &mut SqliteConnection, id: i32) -> RepoResult<Option<Farm>> {
        Ok(farms::table
            .find(id)
            .select(Farm::as_select())
            .first(conn)
            .optional()?)
    }

    fn list_farms(&self, conn: &mut SqliteConnection) -> RepoResult<Vec<Farm>> {
        Ok(farms::table
            .order(farms::id.asc())
            .select(Farm::as_select())
            .load(conn)?)
    }

    fn upsert_restaurant(
        &self,
        conn: &mut SqliteConnection,
        profile: &RestaurantProfile<'_>,
    ) -> RepoResult<i32> {
        let row = RestaurantRow::from(profile);

        // INSERT .. ON CONFLICT (id) DO UPDATE: full replace, NULLs included
        let id = conn.immediate_transaction::<_, RepoError, _>(|conn| {
            Ok(diesel::insert_into(restaurants::table)
                .values(&row)
                .on_conflict(restaurants::id)
                .do_update()
                .set(&row)
                .returning(restaurants::id)
                .get_result(conn)?)
        })?;
        debug!(restaurant_id = id, "restaurant saved");
        Ok(id)
    }

    fn get_restaurant(&self, conn: &mut SqliteConnection) -> RepoResult<Option<Restaurant>> {
        Ok(restaurants::table
            .find(RESTAURANT_ID)
            .select(Restaurant::as_select())
            .first(conn)
            .optional()?)
    }

    fn create_listing(
        &self,
        conn: &mut SqliteConnection,
        listing: &NewListing<'_>,
    ) -> RepoResult<i32> {
        let id = conn.immediate_transaction::<_, RepoError, _>(|conn| {
            let farm = farms::table
                .find(listing.farm_id)
                .select(farms::id)
                .first::<i32>(conn)
                .optional()?;
            ensure_exists(farm, "farm", listing.farm_id)?;

            Ok(diesel::insert_into(listings::table)
                .values(listing)
                .returning(listings::id)
                .get_result(conn)?)
        })?;
        debug!(listing_id = id, farm_id = listing.farm_id, "listing created");
        Ok(id)
    }

    fn get_listing(&self, conn: &mut SqliteConnection, id: i32) -> RepoResult<Option<Listing>> {
        Ok(listings::table
            .find(id)
            .select(Listing::as_select())
            .first(conn)
            .optional()?)
    }

    fn list_listings(&self, conn: &mut SqliteConnection) -> RepoResult<Vec<Listing>> {
        Ok(listings::table
            .order(listings::id.asc())
            .select(Listing::as_select())
            .load(conn)?)
    }

    fn create_request(
        &self,
        conn: &mut SqliteConnection,
        request: &NewRequest<'_>,
    ) -> RepoResult<i32> {
        let row = RequestInsert::from(request);

        let id = conn.immediate_transaction::<_, RepoError, _>(|conn| {
            let listing = listings::table
                .find(request.listing_id)
                .select(listings::id)
                .first::<i32>(conn)
                .optional()?;
            ensure_exists(listing, "listing", request.listing_id)?;

            let restaurant = restaurants::table
                .find(RESTAURANT_ID)
                .select(restaurants::id)
                .first::<i32>(conn)
                .optional()?;
            ensure_exists(restaurant, "restaurant", RESTAURANT_ID)?;

            Ok(diesel::insert_into(requests::table)
                .values(&row)
                .returning(requests::id)
                .get_result(conn)?)
        })?;
        info!(request_id = id, listing_id = request.listing_id, "request placed");
        Ok(id)
    }

    fn get_request(&self, conn: &mut SqliteConnection, id: i32) -> RepoResult<Option<Request>> {
        load_request(conn, id)
    }

    fn list_requests(
        &self,
        conn: &mut SqliteConnection,
        filter: &RequestFilter,
    ) -> RepoResult<Vec<Request>> {
        let mut query = requests::table
            .inner_join(listings::table)
            .select(RequestRow::as_select())
            .order((requests::updated_at.desc(), requests::id.desc()))
            .into_boxed();

        if let Some(restaurant) = filter.restaurant_id {
            query = query.filter(requests::restaurant_id.eq(restaurant));
        }
        if let Some(farm) = filter.farm_id {
            query = query.filter(listings::farm_id.eq(farm));
        }
        if let Some(status) = filter.status {
            query = query.filter(requests::status.eq(status.as_str()));
        }

        query
            .load::<RequestRow>(conn)?
            .into_iter()
            .map(Request::try_from)
            .collect()
    }

    fn update_request_status(
        &self,
        conn: &mut SqliteConnection,
        id: i32,
        target: RequestStatus,
    ) -> RepoResult<Request> {
        let updated = conn.immediate_transaction::<_, RepoError, _>(|conn| {
            let current = requests::table
                .find(id)
                .select(requests::status)
                .first::<String>(conn)
                .optional()?
                .ok_or(RepoError::NotFound {
                    entity: "request",
                    id,
                })?;
            let current = stored_status(&current)?;
            current.transition(target)?;

            // updated_at is refreshed by the requests_touch_updated_at trigger;
            // RETURNING would not see the trigger's write, so read the row back
            diesel::update(requests::table.find(id))
                .set(requests::status.eq(target.as_str()))
                .execute(conn)?;

            load_request(conn, id)?.ok_or(RepoError::NotFound {
                entity: "request",
                id,
            })
        })?;
        info!(request_id = id, status = %target, "request status updated");
        Ok(updated)
    }

    fn create_review(&self, conn: &mut SqliteConnection, review: &NewReview<'_>) -> RepoResult<i32> {
        let request_id = review.request_id;

        let id = conn.immediate_transaction::<_, RepoError, _>(|conn| {
            let (status, listing_id, restaurant_id) = requests::table
                .find(request_id)
                .select((requests::status, requests::listing_id, requests::restaurant_id))
                .first::<(String, i32, i32)>(conn)
                .optional()?
                .ok_or(RepoError::NotFound {
                    entity: "request",
                    id: request_id,
                })?;

            let status = stored_status(&status)?;
            if status != RequestStatus::Completed {
                return Err(RepoError::RequestNotCompleted { request_id, status });
            }

            let existing = reviews::table
                .filter(reviews::request_id.eq(request_id))
                .select(reviews::id)
                .first::<i32>(conn)
                .optional()?;
            if existing.is_some() {
                return Err(RepoError::ReviewExists { request_id });
            }

            let farm_id = listings::table
                .find(listing_id)
                .select(listings::farm_id)
                .first::<i32>(conn)
                .optional()?
                .ok_or(RepoError::NotFound {
                    entity: "listing",
                    id: listing_id,
                })?;

            let row = ReviewInsert {
                request_id,
                farm_id,
                restaurant_id,
                stars: i32::from(review.stars),
                comment: review.comment,
            };
            Ok(diesel::insert_into(reviews::table)
                .values(&row)
                .returning(reviews::id)
                .get_result(conn)?)
        })?;
        info!(review_id = id, request_id, stars = review.stars.get(), "review recorded");
        Ok(id)
    }

    fn get_review_by_request(
        &self,
        conn: &mut SqliteConnection,
        request_id: i32,
    ) -> RepoResult<Option<Review>> {
        Ok(reviews::table
            .filter(reviews::request_id.eq(request_id))
            .select(Review::as_select())
            .first(conn)
            .optional()?)
    }

    fn avg_rating_for_farm(
        &self,
        conn: &mut SqliteConnection,
        farm_id: i32,
    ) -> RepoResult<Option<f64>> {
        let stars: Vec<i32> = reviews::table
            .filter(reviews::farm_id.eq(farm_id))
            .select(reviews::stars)
            .load(conn)?;

        if stars.is_empty() {
            return Ok(None);
        }
        let total: i64 = stars.iter().map(|&s| i64::from(s)).sum();
        Ok(Some(total as f64 / stars.len() as f64))
    }
}
