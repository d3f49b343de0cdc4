//! Unified error handling with Sentry integration.
//!
//! Each concern has its own error type; [`ClientError`] wraps them for
//! callers that drive several flows. Server-side failures are reported to
//! Sentry through [`report`]; user-caused failures are not.

use thiserror::Error;

use crate::api::ApiError;
use crate::checkout::CheckoutError;
use crate::config::ConfigError;
use crate::review::ReviewError;
use crate::session::{AuthError, ProfileError};
use crate::storage::StorageError;
use crate::sync::CartError;

/// Crate-level error type.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Profile error: {0}")]
    Profile(#[from] ProfileError),

    #[error("Review error: {0}")]
    Review(#[from] ReviewError),
}

impl ClientError {
    /// The API failure underneath this error, if there is one.
    #[must_use]
    pub fn api(&self) -> Option<&ApiError> {
        match self {
            Self::Api(e)
            | Self::Cart(CartError::Api(e))
            | Self::Checkout(CheckoutError::Api(e))
            | Self::Auth(AuthError::Api(e))
            | Self::Profile(ProfileError::Api(e))
            | Self::Review(ReviewError::Api(e)) => Some(e),
            _ => None,
        }
    }

    /// Returns true if the view should show the login affordance.
    #[must_use]
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            Self::Cart(CartError::LoginRequired) | Self::Checkout(CheckoutError::LoginRequired)
        ) || self.api().is_some_and(ApiError::requires_login)
    }
}

/// Result type alias for `ClientError`.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Report a failed API call.
///
/// Server-class failures go to Sentry with a tracing error event; anything
/// else is logged at debug level only.
pub fn report(context: &str, error: &ApiError) {
    if error.is_server_error() {
        let event_id = sentry::capture_error(error);
        tracing::error!(
            error = %error,
            sentry_event_id = %event_id,
            context,
            "Backend request failed"
        );
    } else {
        tracing::debug!(error = %error, context, "Backend request rejected");
    }
}

/// Set the Sentry user context.
///
/// Call this after login to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for a user action.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added item", Some(&[("menu_id", "12")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
