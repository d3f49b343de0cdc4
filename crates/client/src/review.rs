//! Reviewing a past order.
//!
//! One review per order. Submitting again for the same transaction edits
//! the existing review instead of creating a second one.

use thiserror::Error;
use tracing::{info, instrument};

use crate::api::orders::Order;
use crate::api::reviews::{NewReview, ReviewEdit};
use crate::api::{ApiClient, ApiError};

const CREATED: &str = "Review submitted successfully";
const UPDATED: &str = "Review successfully updated";

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("Please select a rating first")]
    RatingRequired,

    #[error("Please fill in the comments first")]
    CommentRequired,

    #[error("Order has no restaurant to review")]
    NoRestaurant,

    #[error("{0}")]
    Api(#[from] ApiError),
}

/// A validated star rating and comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewInput {
    star: u8,
    comment: String,
}

impl ReviewInput {
    /// # Errors
    ///
    /// Returns an error unless `star` is 1 to 5 and the comment has text.
    pub fn new(star: u8, comment: &str) -> Result<Self, ReviewError> {
        if !(1..=5).contains(&star) {
            return Err(ReviewError::RatingRequired);
        }
        if comment.trim().is_empty() {
            return Err(ReviewError::CommentRequired);
        }
        Ok(Self {
            star,
            comment: comment.to_string(),
        })
    }
}

/// Create or update the review for `order`. Returns the message to show.
///
/// # Errors
///
/// Returns a validation error before any request, or the server error.
#[instrument(skip(api, order), fields(transaction_id = %order.transaction_id))]
pub async fn submit_review(
    api: &ApiClient,
    order: &Order,
    star: u8,
    comment: &str,
) -> Result<String, ReviewError> {
    let input = ReviewInput::new(star, comment)?;

    let mine = api.my_reviews(1, 50).await?;
    if let Some(existing) = mine.for_transaction(&order.transaction_id) {
        let edit = ReviewEdit {
            star: input.star,
            comment: input.comment,
        };
        let message = api.update_review(existing.id, &edit).await?;
        info!(review_id = %existing.id, "Review updated");
        return Ok(non_empty(message, UPDATED));
    }

    let restaurant = order.primary_restaurant().ok_or(ReviewError::NoRestaurant)?;
    let review = NewReview {
        transaction_id: order.transaction_id.clone(),
        restaurant_id: restaurant.id,
        star: input.star,
        comment: input.comment,
        menu_ids: order.menu_ids(),
    };
    let message = api.create_review(&review).await?;
    info!("Review created");
    Ok(non_empty(message, CREATED))
}

fn non_empty(message: String, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_validation() {
        assert!(matches!(ReviewInput::new(0, "Enak"), Err(ReviewError::RatingRequired)));
        assert!(matches!(ReviewInput::new(6, "Enak"), Err(ReviewError::RatingRequired)));
        assert!(matches!(ReviewInput::new(4, "  "), Err(ReviewError::CommentRequired)));
        assert!(ReviewInput::new(5, "Sambalnya mantap").is_ok());
    }
}
