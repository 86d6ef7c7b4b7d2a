//! Read-side views composing repository reads with distance.
//!
//! Distances are always recomputed from the current farm and restaurant
//! coordinates. The `distance_km` memo stored on a request is only written at
//! placement time ([`place_request`]) and is never read back as truth, so a
//! corrected farm location shows up in every view immediately while old
//! memos stay as they were recorded.

use std::{cmp::Ordering, collections::BTreeMap, collections::HashMap, fmt};

use chrono_tz::Tz;
use diesel::SqliteConnection;
use serde::Serialize;
use tracing::debug;

use crate::{
    domain::estimated_delivery_fee,
    geo::Coordinates,
    models::{Farm, Listing, NewRequest, Request, RequestFilter},
    repo::{FishlinkRepo, RepoError, RepoResult},
    status::RequestStatus,
    tz,
};

/// Farm-to-restaurant distance, or an explicit "unknown".
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Proximity {
    /// Both sides have coordinates.
    Known {
        /// Great-circle kilometers.
        km: f64,
    },
    /// A latitude or longitude is missing on either side.
    Unknown,
}

impl Proximity {
    /// Distance between two optional points.
    pub fn between(a: Option<Coordinates>, b: Option<Coordinates>) -> Self {
        match (a, b) {
            (Some(a), Some(b)) => Proximity::Known {
                km: a.distance_km(&b),
            },
            _ => Proximity::Unknown,
        }
    }

    /// Kilometers when known.
    pub fn km(self) -> Option<f64> {
        match self {
            Proximity::Known { km } => Some(km),
            Proximity::Unknown => None,
        }
    }

    /// Estimated fee; unknown distance means unknown fee.
    pub fn delivery_fee(self) -> Option<f64> {
        self.km().map(estimated_delivery_fee)
    }

    // Known distances ascending, unknown last.
    fn sort_cmp(self, other: Self) -> Ordering {
        match (self.km(), other.km()) {
            (Some(a), Some(b)) => a.total_cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

impl fmt::Display for Proximity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Proximity::Known { km } => write!(f, "{km:.1} km"),
            Proximity::Unknown => f.write_str("unknown"),
        }
    }
}

/// Listing order for [`listings_view`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListingSort {
    /// Ascending listing id.
    #[default]
    Id,
    /// Nearest first; unknown distances last, ties by id.
    Distance,
}

/// A listing annotated with its farm and distance to the restaurant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingView {
    /// The listing itself.
    pub listing: Listing,
    /// Publishing farm.
    pub farm: Farm,
    /// Live farm-to-restaurant distance.
    pub proximity: Proximity,
    /// Delivery fee for [`proximity`](Self::proximity); `None` when unknown.
    pub estimated_fee: Option<f64>,
    /// Mean review stars for the farm.
    pub farm_rating: Option<f64>,
}

/// A request annotated with its listing, farm, live distance and local times.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestView {
    /// The request itself.
    pub request: Request,
    /// Listing it was placed against.
    pub listing: Listing,
    /// Farm owning the listing.
    pub farm: Farm,
    /// Live distance; the request's `distance_km` memo may differ.
    pub proximity: Proximity,
    /// Delivery fee for the live distance.
    pub estimated_fee: Option<f64>,
    /// `created_at` in the display zone.
    pub created_local: String,
    /// `updated_at` in the display zone.
    pub updated_local: String,
    /// Status the farm can move the request to next.
    pub next_status: Option<RequestStatus>,
}

fn farms_by_id<R: FishlinkRepo>(
    repo: &R,
    conn: &mut SqliteConnection,
) -> RepoResult<HashMap<i32, Farm>> {
    Ok(repo
        .list_farms(conn)?
        .into_iter()
        .map(|farm| (farm.id, farm))
        .collect())
}

fn restaurant_coordinates<R: FishlinkRepo>(
    repo: &R,
    conn: &mut SqliteConnection,
) -> RepoResult<Option<Coordinates>> {
    Ok(repo
        .get_restaurant(conn)?
        .and_then(|restaurant| restaurant.coordinates()))
}

fn farm_of(farms: &HashMap<i32, Farm>, farm_id: i32) -> RepoResult<Farm> {
    farms.get(&farm_id).cloned().ok_or(RepoError::NotFound {
        entity: "farm",
        id: farm_id,
    })
}

/// Every listing with farm, live distance, fee estimate and farm rating.
pub fn listings_view<R: FishlinkRepo>(
    repo: &R,
    conn: &mut SqliteConnection,
    sort: ListingSort,
) -> RepoResult<Vec<ListingView>> {
    let farms = farms_by_id(repo, conn)?;
    let home = restaurant_coordinates(repo, conn)?;

    let mut ratings = HashMap::new();
    let mut views = Vec::new();
    for listing in repo.list_listings(conn)? {
        let farm = farm_of(&farms, listing.farm_id)?;
        let farm_rating = match ratings.get(&farm.id) {
            Some(rating) => *rating,
            None => {
                let rating = repo.avg_rating_for_farm(conn, farm.id)?;
                ratings.insert(farm.id, rating);
                rating
            }
        };
        let proximity = Proximity::between(farm.coordinates(), home);
        views.push(ListingView {
            listing,
            farm,
            proximity,
            estimated_fee: proximity.delivery_fee(),
            farm_rating,
        });
    }

    // stable: equal distances keep ascending id
    if sort == ListingSort::Distance {
        views.sort_by(|a, b| a.proximity.sort_cmp(b.proximity));
    }
    Ok(views)
}

/// Filtered requests with listing, farm, live distance and local timestamps.
pub fn request_views<R: FishlinkRepo>(
    repo: &R,
    conn: &mut SqliteConnection,
    filter: &RequestFilter,
    display_tz: Tz,
) -> RepoResult<Vec<RequestView>> {
    let farms = farms_by_id(repo, conn)?;
    let home = restaurant_coordinates(repo, conn)?;

    let listings: HashMap<i32, Listing> = repo
        .list_listings(conn)?
        .into_iter()
        .map(|listing| (listing.id, listing))
        .collect();

    repo.list_requests(conn, filter)?
        .into_iter()
        .map(|request| {
            let listing = listings.get(&request.listing_id).cloned().ok_or(
                RepoError::NotFound {
                    entity: "listing",
                    id: request.listing_id,
                },
            )?;
            let farm = farm_of(&farms, listing.farm_id)?;
            let proximity = Proximity::between(farm.coordinates(), home);
            Ok(RequestView {
                created_local: tz::to_local_display(&request.created_at, display_tz),
                updated_local: tz::to_local_display(&request.updated_at, display_tz),
                next_status: request.status.successor(),
                estimated_fee: proximity.delivery_fee(),
                proximity,
                listing,
                farm,
                request,
            })
        })
        .collect()
}

/// Creates a request, recording the current farm-to-restaurant distance as its memo.
///
/// Any `distance_km` already on `request` is replaced; it is `None` when a
/// coordinate is missing.
pub fn place_request<R: FishlinkRepo>(
    repo: &R,
    conn: &mut SqliteConnection,
    request: &NewRequest<'_>,
) -> RepoResult<i32> {
    let listing = repo
        .get_listing(conn, request.listing_id)?
        .ok_or(RepoError::NotFound {
            entity: "listing",
            id: request.listing_id,
        })?;
    let farm = repo
        .get_farm(conn, listing.farm_id)?
        .ok_or(RepoError::NotFound {
            entity: "farm",
            id: listing.farm_id,
        })?;
    let home = restaurant_coordinates(repo, conn)?;

    let proximity = Proximity::between(farm.coordinates(), home);
    debug!(listing_id = listing.id, %proximity, "placing request");

    let request = NewRequest {
        distance_km: proximity.km(),
        ..*request
    };
    repo.create_request(conn, &request)
}

/// Count of matching requests per status; every status is present, zero included.
pub fn status_summary<R: FishlinkRepo>(
    repo: &R,
    conn: &mut SqliteConnection,
    filter: &RequestFilter,
) -> RepoResult<BTreeMap<RequestStatus, usize>> {
    let mut summary: BTreeMap<RequestStatus, usize> =
        RequestStatus::ALL.into_iter().map(|s| (s, 0)).collect();
    for request in repo.list_requests(conn, filter)? {
        *summary.entry(request.status).or_default() += 1;
    }
    Ok(summary)
}
