//! Checkout.
//!
//! Checkout always covers the whole cart. On success the cart is emptied
//! and a receipt is persisted for the confirmation screen; on failure the
//! cart is left exactly as it was.

use std::future::Future;

use chrono::{DateTime, Utc};
use foody_core::{CartState, MenuId, RestaurantId, Rupiah};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::api::{ApiClient, ApiError};
use crate::error::{self, add_breadcrumb};
use crate::notify::{Notification, Notifier};
use crate::remote::CartRemote;
use crate::storage::{SharedStorage, keys};
use crate::sync::CartSync;

pub const DELIVERY_FEE: i64 = 15_000;
pub const SERVICE_FEE: i64 = 5_000;
pub const DEFAULT_PAYMENT_METHOD: &str = "BCA Virtual Account";

const FALLBACK_PAYMENT_METHOD: &str = "Bank Negara Indonesia";
const PLACED: &str = "Order placed successfully!";
const FAILED: &str = "Checkout failed";
const FAILED_DETAIL: &str = "Checkout failed. Please try again.";

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Login required")]
    LoginRequired,

    #[error("{0}")]
    Api(#[from] ApiError),
}

impl CheckoutError {
    /// Text for the failure dialog.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyCart => "Your cart is empty.".to_string(),
            Self::LoginRequired => "Please log in to place an order.".to_string(),
            Self::Api(e) => e.user_message(FAILED_DETAIL),
        }
    }
}

/// Where and how to deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryDetails {
    pub address: String,
    pub phone: String,
    pub payment_method: String,
    pub notes: String,
}

impl DeliveryDetails {
    /// Delivery to `address`, paid by the default method.
    #[must_use]
    pub fn new(address: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            phone: phone.into(),
            payment_method: DEFAULT_PAYMENT_METHOD.to_string(),
            notes: String::new(),
        }
    }

    #[must_use]
    pub fn payment_method(mut self, method: impl Into<String>) -> Self {
        self.payment_method = method.into();
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutItem {
    pub menu_id: MenuId,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRestaurant {
    pub restaurant_id: RestaurantId,
    pub items: Vec<CheckoutItem>,
}

/// Body of `POST /api/order/checkout`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub restaurants: Vec<CheckoutRestaurant>,
    pub delivery_address: String,
    pub phone: String,
    pub payment_method: String,
    pub notes: String,
}

impl CheckoutRequest {
    /// Order every line of the cart, grouped by restaurant in order of first
    /// appearance.
    #[must_use]
    pub fn from_cart(cart: &CartState, details: DeliveryDetails) -> Self {
        let mut restaurants: Vec<CheckoutRestaurant> = Vec::new();
        for line in cart.lines() {
            let item = CheckoutItem {
                menu_id: line.menu_id,
                quantity: line.quantity.get(),
            };
            match restaurants
                .iter_mut()
                .find(|r| r.restaurant_id == line.restaurant_id)
            {
                Some(group) => group.items.push(item),
                None => restaurants.push(CheckoutRestaurant {
                    restaurant_id: line.restaurant_id,
                    items: vec![item],
                }),
            }
        }

        Self {
            restaurants,
            delivery_address: details.address,
            phone: details.phone,
            payment_method: details.payment_method,
            notes: details.notes,
        }
    }
}

/// Amounts shown on the checkout page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutTotals {
    pub total_items: u32,
    pub price: Rupiah,
    pub delivery_fee: Rupiah,
    pub service_fee: Rupiah,
    pub total: Rupiah,
}

impl CheckoutTotals {
    #[must_use]
    pub fn from_cart(cart: &CartState) -> Self {
        let price = cart.subtotal();
        let delivery_fee = Rupiah::from(DELIVERY_FEE);
        let service_fee = Rupiah::from(SERVICE_FEE);
        Self {
            total_items: cart.total_quantity(),
            price,
            delivery_fee,
            service_fee,
            total: price + delivery_fee + service_fee,
        }
    }
}

/// Summary of a placed order, kept for the confirmation screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutReceipt {
    pub date: DateTime<Utc>,
    pub payment_method: String,
    pub total_items: u32,
    pub price: Rupiah,
    pub delivery_fee: Rupiah,
    pub service_fee: Rupiah,
    pub total: Rupiah,
}

impl CheckoutReceipt {
    fn new(totals: CheckoutTotals, payment_method: String) -> Self {
        Self {
            date: Utc::now(),
            payment_method,
            total_items: totals.total_items,
            price: totals.price,
            delivery_fee: totals.delivery_fee,
            service_fee: totals.service_fee,
            total: totals.total,
        }
    }

    /// Shown when no receipt was stored.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            date: Utc::now(),
            payment_method: FALLBACK_PAYMENT_METHOD.to_string(),
            total_items: 0,
            price: Rupiah::ZERO,
            delivery_fee: Rupiah::from(DELIVERY_FEE),
            service_fee: Rupiah::from(SERVICE_FEE),
            total: Rupiah::ZERO,
        }
    }
}

/// Backend that accepts orders.
pub trait OrderRemote: CartRemote {
    fn place_order(
        &self,
        request: &CheckoutRequest,
    ) -> impl Future<Output = Result<String, ApiError>> + Send;
}

impl OrderRemote for ApiClient {
    async fn place_order(&self, request: &CheckoutRequest) -> Result<String, ApiError> {
        self.checkout(request).await
    }
}

/// Place an order for the whole cart.
///
/// # Errors
///
/// Returns an error for an empty cart, a guest session, or a rejected
/// order. The cart is untouched in every error case.
#[instrument(skip_all)]
pub async fn checkout<R: OrderRemote, N: Notifier>(
    sync: &mut CartSync<R, N>,
    storage: &SharedStorage,
    details: DeliveryDetails,
) -> Result<CheckoutReceipt, CheckoutError> {
    if sync.state().is_empty() {
        return Err(CheckoutError::EmptyCart);
    }
    if !sync.remote().is_authenticated() {
        return Err(CheckoutError::LoginRequired);
    }

    let totals = CheckoutTotals::from_cart(sync.state());
    let request = CheckoutRequest::from_cart(sync.state(), details);
    let payment_method = request.payment_method.clone();
    add_breadcrumb("checkout", "Place order", None);

    if let Err(e) = sync.remote().place_order(&request).await {
        error::report("checkout", &e);
        sync.notifier().notify(Notification::error(FAILED));
        return Err(e.into());
    }

    sync.clear_local().await;
    let receipt = CheckoutReceipt::new(totals, payment_method);
    store_receipt(storage, &receipt);

    info!(total = %receipt.total, items = receipt.total_items, "Order placed");
    sync.notifier().notify(Notification::success(PLACED));
    Ok(receipt)
}

fn store_receipt(storage: &SharedStorage, receipt: &CheckoutReceipt) {
    match serde_json::to_string(receipt) {
        Ok(raw) => {
            if let Err(e) = storage.set(keys::CHECKOUT_SUCCESS, &raw) {
                warn!(error = %e, "Failed to persist checkout receipt");
            }
        }
        Err(e) => warn!(error = %e, "Failed to serialize checkout receipt"),
    }
}

/// The last stored receipt, or [`CheckoutReceipt::fallback`].
#[must_use]
pub fn last_receipt(storage: &SharedStorage) -> CheckoutReceipt {
    storage
        .get(keys::CHECKOUT_SUCCESS)
        .ok()
        .flatten()
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or_else(CheckoutReceipt::fallback)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::num::NonZeroU32;
    use std::sync::Arc;

    use foody_core::CartLine;

    use super::*;
    use crate::storage::{KeyValueStore, MemoryStorage};

    fn cart() -> CartState {
        let line = |menu: i64, restaurant: i64, qty: u32| CartLine {
            menu_id: MenuId::new(menu),
            remote_line_id: None,
            name: format!("Menu {menu}"),
            unit_price: Rupiah::from(25_000),
            image_ref: String::new(),
            restaurant_id: RestaurantId::new(restaurant),
            restaurant_name: format!("Resto {restaurant}"),
            quantity: NonZeroU32::new(qty).unwrap(),
        };
        CartState::from_lines([line(1, 4, 2), line(2, 8, 1), line(3, 4, 1)])
    }

    #[test]
    fn test_request_groups_by_restaurant() {
        let request = CheckoutRequest::from_cart(
            &cart(),
            DeliveryDetails::new("Jl. Sudirman No. 25", "081234567890"),
        );
        assert_eq!(request.restaurants.len(), 2);
        assert_eq!(request.restaurants[0].restaurant_id, RestaurantId::new(4));
        assert_eq!(request.restaurants[0].items.len(), 2);
        assert_eq!(request.payment_method, DEFAULT_PAYMENT_METHOD);

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["deliveryAddress"], "Jl. Sudirman No. 25");
        assert_eq!(json["restaurants"][0]["items"][0]["menuId"], 1);
    }

    #[test]
    fn test_totals_include_fees() {
        let totals = CheckoutTotals::from_cart(&cart());
        assert_eq!(totals.total_items, 4);
        assert_eq!(totals.price, Rupiah::from(100_000));
        assert_eq!(totals.total, Rupiah::from(120_000));
    }

    #[test]
    fn test_last_receipt_fallback() {
        let storage: SharedStorage = Arc::new(MemoryStorage::new());
        let receipt = last_receipt(&storage);
        assert_eq!(receipt.total, Rupiah::ZERO);
        assert_eq!(receipt.delivery_fee, Rupiah::from(DELIVERY_FEE));

        storage.set(keys::CHECKOUT_SUCCESS, "garbage").unwrap();
        assert_eq!(last_receipt(&storage).total_items, 0);
    }

    #[test]
    fn test_receipt_roundtrip_through_storage() {
        let storage: SharedStorage = Arc::new(MemoryStorage::new());
        let receipt = CheckoutReceipt::new(CheckoutTotals::from_cart(&cart()), "Gopay".to_string());
        store_receipt(&storage, &receipt);
        assert_eq!(last_receipt(&storage), receipt);
    }

    #[test]
    fn test_user_message() {
        let err = CheckoutError::Api(ApiError::Status {
            status: 500,
            message: String::new(),
        });
        assert_eq!(err.user_message(), "Checkout failed. Please try again.");
    }
}
