//! `/api/resto` endpoints.

use chrono::{DateTime, Utc};
use foody_core::{MenuId, MenuKind, RestaurantId, ReviewId, Rupiah, UserId};
use serde::Deserialize;
use tracing::{debug, instrument};

use super::{ApiClient, ApiError, Pagination};
use crate::filters::RestaurantFilters;

/// Default page size for restaurant lists.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// A restaurant as it appears in lists.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub id: RestaurantId,
    pub name: String,
    #[serde(default)]
    pub star: f64,
    #[serde(default)]
    pub place: String,
    #[serde(default)]
    pub logo: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub review_count: u32,
    #[serde(default)]
    pub menu_count: u32,
    #[serde(default)]
    pub is_frequently_ordered: bool,
    #[serde(default)]
    pub price_range: Option<PriceRange>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PriceRange {
    pub min: Rupiah,
    pub max: Rupiah,
}

/// One page of a restaurant list.
///
/// The recommendation endpoint names its list `recommendations`; every other
/// list endpoint uses `restaurants`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RestaurantPage {
    #[serde(default, alias = "recommendations")]
    pub restaurants: Vec<Restaurant>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

impl RestaurantPage {
    /// Next page to request, given how many pages are loaded so far.
    #[must_use]
    pub fn next_page(&self, pages_loaded: u32, limit: u32) -> Option<u32> {
        Pagination::next_page(
            self.pagination.as_ref(),
            pages_loaded,
            self.restaurants.len(),
            limit,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub long: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: MenuId,
    pub food_name: String,
    pub price: Rupiah,
    #[serde(rename = "type", default)]
    pub kind: MenuKind,
    #[serde(default)]
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Reviewer {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// A review shown on a restaurant page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantReview {
    pub id: ReviewId,
    pub star: u8,
    #[serde(default)]
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub user: Reviewer,
}

/// Full restaurant page with menus and reviews.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantDetail {
    pub id: RestaurantId,
    pub name: String,
    #[serde(default)]
    pub star: f64,
    #[serde(default)]
    pub average_rating: f64,
    #[serde(default)]
    pub place: String,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub logo: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub total_menus: u32,
    #[serde(default)]
    pub total_reviews: u32,
    #[serde(default)]
    pub menus: Vec<MenuItem>,
    #[serde(default)]
    pub reviews: Vec<RestaurantReview>,
}

impl RestaurantDetail {
    /// A menu item on this page.
    #[must_use]
    pub fn menu(&self, menu_id: MenuId) -> Option<&MenuItem> {
        self.menus.iter().find(|m| m.id == menu_id)
    }

    /// Menu items of one kind, or all of them.
    pub fn menus_of(&self, kind: Option<MenuKind>) -> impl Iterator<Item = &MenuItem> {
        self.menus
            .iter()
            .filter(move |m| kind.is_none_or(|k| m.kind == k))
    }
}

/// Parameters for `GET /api/resto`.
#[derive(Debug, Clone, PartialEq)]
pub struct RestaurantQuery {
    pub page: u32,
    pub limit: u32,
    pub filters: RestaurantFilters,
}

impl Default for RestaurantQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            filters: RestaurantFilters::default(),
        }
    }
}

impl RestaurantQuery {
    fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("page", self.page.to_string()), ("limit", self.limit.to_string())];
        pairs.extend(self.filters.to_query());
        pairs
    }
}

impl ApiClient {
    /// List restaurants, optionally filtered.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn restaurants(&self, query: &RestaurantQuery) -> Result<RestaurantPage, ApiError> {
        let page: RestaurantPage = self
            .get("/api/resto", &query.to_pairs())
            .await?
            .data
            .unwrap_or_default();
        debug!(count = page.restaurants.len(), "Fetched restaurants");
        Ok(page)
    }

    /// Restaurants recommended for the current user.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn recommended_restaurants(&self) -> Result<RestaurantPage, ApiError> {
        Ok(self
            .get("/api/resto/recommended", &[])
            .await?
            .data
            .unwrap_or_default())
    }

    /// Best-selling restaurants.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn best_seller_restaurants(
        &self,
        page: u32,
        limit: u32,
    ) -> Result<RestaurantPage, ApiError> {
        let query = [("page", page.to_string()), ("limit", limit.to_string())];
        Ok(self
            .get("/api/resto/best-seller", &query)
            .await?
            .data
            .unwrap_or_default())
    }

    /// Search restaurants by keyword. A blank keyword returns an empty page
    /// without a request.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn search_restaurants(
        &self,
        keyword: &str,
        page: u32,
        limit: u32,
    ) -> Result<RestaurantPage, ApiError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Ok(RestaurantPage::default());
        }
        let query = [
            ("q", keyword.to_string()),
            ("page", page.to_string()),
            ("limit", limit.to_string()),
        ];
        Ok(self
            .get("/api/resto/search", &query)
            .await?
            .data
            .unwrap_or_default())
    }

    /// A restaurant with up to `limit_menu` menus and `limit_review` reviews.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the restaurant is unknown.
    #[instrument(skip(self))]
    pub async fn restaurant_detail(
        &self,
        id: RestaurantId,
        limit_menu: u32,
        limit_review: u32,
    ) -> Result<RestaurantDetail, ApiError> {
        let query = [
            ("limitMenu", limit_menu.to_string()),
            ("limitReview", limit_review.to_string()),
        ];
        self.get(&format!("/api/resto/{id}"), &query)
            .await?
            .into_data("restaurant detail")
    }
}
