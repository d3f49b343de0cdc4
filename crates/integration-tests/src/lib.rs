//! Integration tests for the Foody client.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p foody-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_*` - Cart persistence, reconciliation and optimistic updates
//!   against [`FakeRemote`]
//! - `guest_mode` - Guest sessions never reach the network
//! - `checkout_flow` - Checkout success and failure
//! - `api_client` - The HTTP client against a `wiremock` server
//!
//! [`FakeRemote`] is an in-memory backend that records every call and can
//! be told to fail the next one.

use std::num::NonZeroU32;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use foody_client::api::ApiError;
use foody_client::api::cart::{AddCartLine, CartItemAck};
use foody_client::checkout::{CheckoutRequest, OrderRemote};
use foody_client::{CartRemote, CartStore, CartSync, MenuSelection, QueryCache, SharedStorage, Toasts};
use foody_core::{
    CartLineId, CartMenu, MenuId, MenuKind, RemoteCartItem, RemoteCartSnapshot, RestaurantCart,
    RestaurantId, RestaurantRef, Rupiah,
};
use tokio::sync::Notify;

/// Unit price of every menu item the fake creates.
pub const FAKE_PRICE: i64 = 10_000;

/// A call the fake backend received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Fetch,
    Add(AddCartLine),
    Update(CartLineId, u32),
    Delete(CartLineId),
    PlaceOrder,
}

/// In-memory cart backend. Clones share state.
#[derive(Debug, Clone)]
pub struct FakeRemote {
    inner: Arc<FakeInner>,
}

#[derive(Debug)]
struct FakeInner {
    authenticated: AtomicBool,
    next_line_id: AtomicI64,
    failure: Mutex<Option<ApiError>>,
    fetch_gate: Mutex<Option<Arc<Notify>>>,
    snapshot: Mutex<RemoteCartSnapshot>,
    calls: Mutex<Vec<Call>>,
    orders: Mutex<Vec<CheckoutRequest>>,
}

impl FakeRemote {
    fn new(authenticated: bool, snapshot: RemoteCartSnapshot) -> Self {
        Self {
            inner: Arc::new(FakeInner {
                authenticated: AtomicBool::new(authenticated),
                next_line_id: AtomicI64::new(1_000),
                failure: Mutex::new(None),
                fetch_gate: Mutex::new(None),
                snapshot: Mutex::new(snapshot),
                calls: Mutex::new(Vec::new()),
                orders: Mutex::new(Vec::new()),
            }),
        }
    }

    /// No token: the client must not call any method.
    #[must_use]
    pub fn guest() -> Self {
        Self::new(false, RemoteCartSnapshot::default())
    }

    /// Logged in with an empty server cart.
    #[must_use]
    pub fn logged_in() -> Self {
        Self::new(true, RemoteCartSnapshot::default())
    }

    /// Logged in with the given server cart.
    #[must_use]
    pub fn with_cart(snapshot: RemoteCartSnapshot) -> Self {
        Self::new(true, snapshot)
    }

    pub fn set_authenticated(&self, authenticated: bool) {
        self.inner.authenticated.store(authenticated, Ordering::SeqCst);
    }

    /// Fail the next call with a server error.
    pub fn fail_next(&self) {
        self.fail_next_with(ApiError::Status {
            status: 500,
            message: "Internal Server Error".to_string(),
        });
    }

    /// Fail the next call with `error`.
    pub fn fail_next_with(&self, error: ApiError) {
        *lock(&self.inner.failure) = Some(error);
    }

    /// Hold the next cart fetch until the returned handle is notified.
    #[must_use]
    pub fn hold_next_fetch(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *lock(&self.inner.fetch_gate) = Some(Arc::clone(&gate));
        gate
    }

    /// Every call received so far.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        lock(&self.inner.calls).clone()
    }

    /// Every order placed so far.
    #[must_use]
    pub fn orders(&self) -> Vec<CheckoutRequest> {
        lock(&self.inner.orders).clone()
    }

    /// The server cart as it stands.
    #[must_use]
    pub fn snapshot(&self) -> RemoteCartSnapshot {
        lock(&self.inner.snapshot).clone()
    }

    fn record(&self, call: Call) -> Result<(), ApiError> {
        lock(&self.inner.calls).push(call);
        lock(&self.inner.failure).take().map_or(Ok(()), Err)
    }

    fn insert_line(&self, line: AddCartLine) -> CartItemAck {
        let mut snapshot = lock(&self.inner.snapshot);
        if let Some(item) = snapshot
            .cart
            .iter_mut()
            .flat_map(|group| group.items.iter_mut())
            .find(|item| item.menu.id == line.menu_id)
        {
            item.quantity += line.quantity;
            return CartItemAck {
                id: item.id,
                quantity: item.quantity,
            };
        }

        let id = CartLineId::new(self.inner.next_line_id.fetch_add(1, Ordering::SeqCst));
        let item = remote_item(id.as_i64(), line.menu_id.as_i64(), line.quantity);
        match snapshot
            .cart
            .iter_mut()
            .find(|group| group.restaurant.id == line.restaurant_id)
        {
            Some(group) => group.items.push(item),
            None => snapshot.cart.push(RestaurantCart {
                restaurant: restaurant_ref(line.restaurant_id.as_i64()),
                items: vec![item],
                subtotal: Rupiah::ZERO,
            }),
        }
        CartItemAck {
            id,
            quantity: line.quantity,
        }
    }
}

impl CartRemote for FakeRemote {
    fn is_authenticated(&self) -> bool {
        self.inner.authenticated.load(Ordering::SeqCst)
    }

    async fn fetch_cart(&self) -> Result<RemoteCartSnapshot, ApiError> {
        let gate = lock(&self.inner.fetch_gate).take();
        let result = self.record(Call::Fetch);
        if let Some(gate) = gate {
            gate.notified().await;
        }
        result?;
        Ok(self.snapshot())
    }

    async fn add_line(&self, line: AddCartLine) -> Result<Option<CartItemAck>, ApiError> {
        self.record(Call::Add(line))?;
        Ok(Some(self.insert_line(line)))
    }

    async fn update_line(
        &self,
        line_id: CartLineId,
        quantity: u32,
    ) -> Result<Option<CartItemAck>, ApiError> {
        self.record(Call::Update(line_id, quantity))?;
        let mut snapshot = lock(&self.inner.snapshot);
        if let Some(next) = NonZeroU32::new(quantity) {
            *snapshot = snapshot.with_quantity(line_id, next);
        }
        Ok(Some(CartItemAck {
            id: line_id,
            quantity,
        }))
    }

    async fn delete_line(&self, line_id: CartLineId) -> Result<(), ApiError> {
        self.record(Call::Delete(line_id))?;
        let mut snapshot = lock(&self.inner.snapshot);
        *snapshot = snapshot.without_line(line_id);
        Ok(())
    }
}

impl OrderRemote for FakeRemote {
    async fn place_order(&self, request: &CheckoutRequest) -> Result<String, ApiError> {
        self.record(Call::PlaceOrder)?;
        lock(&self.inner.orders).push(request.clone());
        *lock(&self.inner.snapshot) = RemoteCartSnapshot::default();
        Ok("Checkout successful".to_string())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn restaurant_ref(id: i64) -> RestaurantRef {
    RestaurantRef {
        id: RestaurantId::new(id),
        name: format!("Resto {id}"),
        logo: None,
    }
}

fn remote_item(line_id: i64, menu_id: i64, quantity: u32) -> RemoteCartItem {
    let price = Rupiah::from(FAKE_PRICE);
    RemoteCartItem {
        id: CartLineId::new(line_id),
        menu: CartMenu {
            id: MenuId::new(menu_id),
            food_name: format!("Menu {menu_id}"),
            price,
            kind: MenuKind::Food,
            image: String::new(),
        },
        quantity,
        item_total: price.times(quantity),
    }
}

/// A server cart from `(line_id, menu_id, restaurant_id, quantity)` rows,
/// grouped by restaurant in order of first appearance.
#[must_use]
pub fn remote_cart(rows: &[(i64, i64, i64, u32)]) -> RemoteCartSnapshot {
    let mut snapshot = RemoteCartSnapshot::default();
    for &(line_id, menu_id, restaurant_id, quantity) in rows {
        let item = remote_item(line_id, menu_id, quantity);
        match snapshot
            .cart
            .iter_mut()
            .find(|group| group.restaurant.id == RestaurantId::new(restaurant_id))
        {
            Some(group) => group.items.push(item),
            None => snapshot.cart.push(RestaurantCart {
                restaurant: restaurant_ref(restaurant_id),
                items: vec![item],
                subtotal: Rupiah::ZERO,
            }),
        }
    }
    snapshot
}

/// A menu item of restaurant `restaurant_id`, priced at [`FAKE_PRICE`].
#[must_use]
pub fn menu(menu_id: i64, restaurant_id: i64) -> MenuSelection {
    MenuSelection {
        menu_id: MenuId::new(menu_id),
        name: format!("Menu {menu_id}"),
        unit_price: Rupiah::from(FAKE_PRICE),
        image_ref: String::new(),
        restaurant_id: RestaurantId::new(restaurant_id),
        restaurant_name: format!("Resto {restaurant_id}"),
    }
}

/// A cart synchroniser over `storage` talking to `remote`.
#[must_use]
pub fn cart_sync(remote: FakeRemote, storage: SharedStorage) -> (CartSync<FakeRemote, Toasts>, Toasts) {
    let toasts = Toasts::new();
    let sync = CartSync::new(
        CartStore::load(storage),
        remote,
        toasts.clone(),
        QueryCache::new(Duration::from_secs(300)),
    );
    (sync, toasts)
}
