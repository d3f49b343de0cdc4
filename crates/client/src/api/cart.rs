//! `/api/cart` endpoints.

use foody_core::{CartLineId, MenuId, RemoteCartSnapshot, RestaurantId};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{ApiClient, ApiError};

/// Body of `POST /api/cart`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCartLine {
    pub restaurant_id: RestaurantId,
    pub menu_id: MenuId,
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
struct UpdateQuantity {
    quantity: u32,
}

/// The server's echo of a created or updated line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CartItemAck {
    pub id: CartLineId,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CartItemData {
    #[serde(default)]
    cart_item: Option<CartItemAck>,
}

impl ApiClient {
    /// Fetch the current user's cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the user is not logged in.
    #[instrument(skip(self))]
    pub async fn cart(&self) -> Result<RemoteCartSnapshot, ApiError> {
        let snapshot: RemoteCartSnapshot = self
            .get("/api/cart", &[])
            .await?
            .data
            .unwrap_or_default();
        debug!(lines = snapshot.items().count(), "Fetched remote cart");
        Ok(snapshot)
    }

    /// Add a menu item to the remote cart.
    ///
    /// Returns the created line when the server echoes it.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(menu_id = %line.menu_id))]
    pub async fn add_cart_line(&self, line: AddCartLine) -> Result<Option<CartItemAck>, ApiError> {
        let envelope = self.post::<_, CartItemData>("/api/cart", &line).await?;
        Ok(envelope.data.and_then(|d| d.cart_item))
    }

    /// Change the quantity of a remote cart line.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn update_cart_line(
        &self,
        line_id: CartLineId,
        quantity: u32,
    ) -> Result<Option<CartItemAck>, ApiError> {
        let envelope = self
            .put::<_, CartItemData>(&format!("/api/cart/{line_id}"), &UpdateQuantity { quantity })
            .await?;
        Ok(envelope.data.and_then(|d| d.cart_item))
    }

    /// Delete a remote cart line.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn delete_cart_line(&self, line_id: CartLineId) -> Result<(), ApiError> {
        self.delete::<serde_json::Value>(&format!("/api/cart/{line_id}"))
            .await?;
        Ok(())
    }
}
