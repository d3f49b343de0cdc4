//! The remote cart seen by the synchroniser.
//!
//! [`CartRemote`] is the seam between cart synchronisation and HTTP. The
//! production implementation is [`ApiClient`]; tests substitute an
//! in-memory fake.

use std::future::Future;

use foody_core::{CartLineId, RemoteCartSnapshot};

use crate::api::ApiClient;
use crate::api::ApiError;
use crate::api::cart::{AddCartLine, CartItemAck};

/// Cart operations of the backend.
pub trait CartRemote: Send + Sync {
    /// Returns true if requests carry a user token. When false the cart is
    /// guest-only and no method below is called.
    fn is_authenticated(&self) -> bool;

    fn fetch_cart(&self) -> impl Future<Output = Result<RemoteCartSnapshot, ApiError>> + Send;

    fn add_line(
        &self,
        line: AddCartLine,
    ) -> impl Future<Output = Result<Option<CartItemAck>, ApiError>> + Send;

    fn update_line(
        &self,
        line_id: CartLineId,
        quantity: u32,
    ) -> impl Future<Output = Result<Option<CartItemAck>, ApiError>> + Send;

    fn delete_line(&self, line_id: CartLineId) -> impl Future<Output = Result<(), ApiError>> + Send;
}

impl CartRemote for ApiClient {
    fn is_authenticated(&self) -> bool {
        Self::is_authenticated(self)
    }

    async fn fetch_cart(&self) -> Result<RemoteCartSnapshot, ApiError> {
        self.cart().await
    }

    async fn add_line(&self, line: AddCartLine) -> Result<Option<CartItemAck>, ApiError> {
        self.add_cart_line(line).await
    }

    async fn update_line(
        &self,
        line_id: CartLineId,
        quantity: u32,
    ) -> Result<Option<CartItemAck>, ApiError> {
        self.update_cart_line(line_id, quantity).await
    }

    async fn delete_line(&self, line_id: CartLineId) -> Result<(), ApiError> {
        self.delete_cart_line(line_id).await
    }
}
