//! `/api/review` endpoints.

use foody_core::{MenuId, RestaurantId, ReviewId};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{ApiClient, ApiError, Pagination};

/// A review written by the current user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MyReview {
    pub id: ReviewId,
    pub star: u8,
    #[serde(default)]
    pub comment: String,
    pub transaction_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReviewPage {
    #[serde(default)]
    pub reviews: Vec<MyReview>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

impl ReviewPage {
    /// The review left for an order, if any.
    #[must_use]
    pub fn for_transaction(&self, transaction_id: &str) -> Option<&MyReview> {
        self.reviews
            .iter()
            .find(|review| review.transaction_id == transaction_id)
    }
}

/// Body of `POST /api/review`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub transaction_id: String,
    pub restaurant_id: RestaurantId,
    pub star: u8,
    pub comment: String,
    pub menu_ids: Vec<MenuId>,
}

/// Body of `PUT /api/review/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewEdit {
    pub star: u8,
    pub comment: String,
}

impl ApiClient {
    /// Reviews written by the current user.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the user is not logged in.
    #[instrument(skip(self))]
    pub async fn my_reviews(&self, page: u32, limit: u32) -> Result<ReviewPage, ApiError> {
        let query = [("page", page.to_string()), ("limit", limit.to_string())];
        Ok(self
            .get("/api/review/my-reviews", &query)
            .await?
            .data
            .unwrap_or_default())
    }

    /// Post a new review. Returns the server's message.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the review.
    #[instrument(skip(self, review), fields(transaction_id = %review.transaction_id))]
    pub async fn create_review(&self, review: &NewReview) -> Result<String, ApiError> {
        let envelope = self
            .post::<_, serde_json::Value>("/api/review", review)
            .await?;
        Ok(envelope.message)
    }

    /// Edit an existing review. Returns the server's message.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the edit.
    #[instrument(skip(self, edit))]
    pub async fn update_review(&self, id: ReviewId, edit: &ReviewEdit) -> Result<String, ApiError> {
        let envelope = self
            .put::<_, serde_json::Value>(&format!("/api/review/{id}"), edit)
            .await?;
        Ok(envelope.message)
    }
}
