//! Farm / restaurant / listing / request / review repository (SQLite).
//!
//! Every write runs as one `BEGIN IMMEDIATE` transaction on the caller's
//! connection: either all fields land or nothing is visible.
use diesel::result::{DatabaseErrorKind, Error as DieselError};

use crate::{
    models::{
        Farm, Listing, NewFarm, NewListing, NewRequest, NewReview, Request, RequestFilter,
        Restaurant, RestaurantProfile, Review,
    },
    status::{InvalidTransition, RequestStatus},
};

mod sqlite;

pub use sqlite::SqliteRepo;

#[derive(thiserror::Error, Debug)]
/// Errors that can occur while interacting with the repository.
pub enum RepoError {
    #[error("{entity} {id} not found")]
    /// A referenced entity does not exist.
    NotFound {
        /// Entity kind, e.g. `"listing"`.
        entity: &'static str,
        /// Identifier that was looked up.
        id: i32,
    },
    #[error(transparent)]
    /// Status change outside the single legal successor. Nothing was written.
    InvalidTransition(#[from] InvalidTransition),
    #[error("request {request_id} is {status}, only completed requests can be reviewed")]
    /// Reviews require a completed request.
    RequestNotCompleted {
        /// The request.
        request_id: i32,
        /// Its current status.
        status: RequestStatus,
    },
    #[error("request {request_id} already has a review")]
    /// At most one review per request.
    ReviewExists {
        /// The request.
        request_id: i32,
    },
    #[error("constraint violation: {0}")]
    /// The store rejected a write, or holds a value outside a closed vocabulary.
    ConstraintViolation(String),
    #[error("storage error: {0}")]
    /// Any other storage failure.
    Storage(#[source] DieselError),
}

impl From<DieselError> for RepoError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::DatabaseError(kind, info)
                if matches!(
                    kind,
                    DatabaseErrorKind::UniqueViolation
                        | DatabaseErrorKind::ForeignKeyViolation
                        | DatabaseErrorKind::CheckViolation
                        | DatabaseErrorKind::NotNullViolation
                ) =>
            {
                RepoError::ConstraintViolation(info.message().to_string())
            }
            other => RepoError::Storage(other),
        }
    }
}

/// Result type used throughout the repository.
pub type RepoResult<T> = Result<T, RepoError>;

/// Portable surface, SQLite implementation lives in `sqlite.rs`.
pub trait FishlinkRepo {
    /// Inserts a farm and returns its identifier.
    fn create_farm(&self, conn: &mut diesel::SqliteConnection, farm: &NewFarm<'_>)
    -> RepoResult<i32>;

    /// Farm by id, if any.
    fn get_farm(&self, conn: &mut diesel::SqliteConnection, id: i32) -> RepoResult<Option<Farm>>;

    /// All farms, ascending id.
    fn list_farms(&self, conn: &mut diesel::SqliteConnection) -> RepoResult<Vec<Farm>>;

    /// Creates or fully replaces the single restaurant; returns its fixed id.
    fn upsert_restaurant(
        &self,
        conn: &mut diesel::SqliteConnection,
        profile: &RestaurantProfile<'_>,
    ) -> RepoResult<i32>;

    /// The restaurant, once saved.
    fn get_restaurant(&self, conn: &mut diesel::SqliteConnection) -> RepoResult<Option<Restaurant>>;

    /// Inserts a listing for an existing farm.
    fn create_listing(
        &self,
        conn: &mut diesel::SqliteConnection,
        listing: &NewListing<'_>,
    ) -> RepoResult<i32>;

    /// Listing by id, if any.
    fn get_listing(
        &self,
        conn: &mut diesel::SqliteConnection,
        id: i32,
    ) -> RepoResult<Option<Listing>>;

    /// All listings, ascending id.
    fn list_listings(&self, conn: &mut diesel::SqliteConnection) -> RepoResult<Vec<Listing>>;

    /// Inserts a request in status `Requested` for an existing listing and restaurant.
    fn create_request(
        &self,
        conn: &mut diesel::SqliteConnection,
        request: &NewRequest<'_>,
    ) -> RepoResult<i32>;

    /// Request by id, if any.
    fn get_request(
        &self,
        conn: &mut diesel::SqliteConnection,
        id: i32,
    ) -> RepoResult<Option<Request>>;

    /// Requests matching every set filter, most recently updated first (ties: id desc).
    fn list_requests(
        &self,
        conn: &mut diesel::SqliteConnection,
        filter: &RequestFilter,
    ) -> RepoResult<Vec<Request>>;

    /// Moves a request to `target` if that is its single legal successor.
    ///
    /// Refreshes `updated_at` and returns the updated request.
    fn update_request_status(
        &self,
        conn: &mut diesel::SqliteConnection,
        id: i32,
        target: RequestStatus,
    ) -> RepoResult<Request>;

    /// Inserts the review of a completed request.
    fn create_review(
        &self,
        conn: &mut diesel::SqliteConnection,
        review: &NewReview<'_>,
    ) -> RepoResult<i32>;

    /// The review of a request, if any.
    fn get_review_by_request(
        &self,
        conn: &mut diesel::SqliteConnection,
        request_id: i32,
    ) -> RepoResult<Option<Review>>;

    /// Mean stars across the farm's reviews; `None` without reviews.
    fn avg_rating_for_farm(
        &self,
        conn: &mut diesel::SqliteConnection,
        farm_id: i32,
    ) -> RepoResult<Option<f64>>;
}
