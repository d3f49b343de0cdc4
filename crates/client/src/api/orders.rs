//! `/api/order` endpoints.

use chrono::{DateTime, Utc};
use foody_core::{MenuId, OrderId, OrderStatus, RestaurantRef, Rupiah};
use serde::Deserialize;
use tracing::{info, instrument};

use super::{ApiClient, ApiError, Pagination};
use crate::checkout::CheckoutRequest;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub menu_id: MenuId,
    pub menu_name: String,
    pub price: Rupiah,
    #[serde(default)]
    pub image: String,
    pub quantity: u32,
    #[serde(default)]
    pub item_total: Rupiah,
}

/// Items of an order from one restaurant.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrderRestaurant {
    pub restaurant: RestaurantRef,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub subtotal: Rupiah,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPricing {
    pub subtotal: Rupiah,
    pub service_fee: Rupiah,
    pub delivery_fee: Rupiah,
    pub total_price: Rupiah,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub transaction_id: String,
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_method: String,
    #[serde(default)]
    pub delivery_address: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub pricing: OrderPricing,
    #[serde(default)]
    pub restaurants: Vec<OrderRestaurant>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Restaurant the order is reviewed against: the first one.
    #[must_use]
    pub fn primary_restaurant(&self) -> Option<&RestaurantRef> {
        self.restaurants.first().map(|group| &group.restaurant)
    }

    /// Every menu id in the order, in order.
    #[must_use]
    pub fn menu_ids(&self) -> Vec<MenuId> {
        self.restaurants
            .iter()
            .flat_map(|group| group.items.iter().map(|item| item.menu_id))
            .collect()
    }

    /// Case-insensitive match against restaurant and menu names.
    #[must_use]
    pub fn matches(&self, keyword: &str) -> bool {
        let keyword = keyword.trim().to_lowercase();
        if keyword.is_empty() {
            return true;
        }
        self.restaurants.iter().any(|group| {
            group.restaurant.name.to_lowercase().contains(&keyword)
                || group
                    .items
                    .iter()
                    .any(|item| item.menu_name.to_lowercase().contains(&keyword))
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OrderPage {
    #[serde(default)]
    pub orders: Vec<Order>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

impl ApiClient {
    /// Place an order for the given request.
    ///
    /// Returns the server's confirmation message.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects the order.
    #[instrument(skip(self, request), fields(restaurants = request.restaurants.len()))]
    pub async fn checkout(&self, request: &CheckoutRequest) -> Result<String, ApiError> {
        let envelope = self
            .post::<_, serde_json::Value>("/api/order/checkout", request)
            .await?;
        info!("Order placed");
        Ok(envelope.message)
    }

    /// The current user's orders with a given status.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the user is not logged in.
    #[instrument(skip(self))]
    pub async fn my_orders(
        &self,
        status: OrderStatus,
        page: u32,
        limit: u32,
    ) -> Result<OrderPage, ApiError> {
        let query = [
            ("status", status.as_str().to_string()),
            ("page", page.to_string()),
            ("limit", limit.to_string()),
        ];
        Ok(self
            .get("/api/order/my-order", &query)
            .await?
            .data
            .unwrap_or_default())
    }
}
