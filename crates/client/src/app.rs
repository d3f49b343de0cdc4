//! Application session: the composition root.
//!
//! [`FoodyApp`] owns every piece of client state for one run of the app.
//! Building it restores a saved login and hydrates the cart; [`FoodyApp::logout`]
//! tears the session down again.

use std::sync::Arc;

use foody_core::OrderStatus;
use secrecy::SecretString;
use tracing::info;

use crate::api::auth::User;
use crate::api::orders::{Order, OrderPage};
use crate::api::restaurants::{RestaurantPage, RestaurantQuery};
use crate::api::{ApiClient, Credentials};
use crate::cache::QueryCache;
use crate::checkout::{self, CheckoutReceipt, DeliveryDetails};
use crate::config::ClientConfig;
use crate::error::Result;
use crate::filters::RestaurantFilters;
use crate::notify::Notifier;
use crate::review;
use crate::session::{AuthSession, RegisterForm};
use crate::storage::{FileStorage, MemoryStorage, SharedStorage};
use crate::store::CartStore;
use crate::sync::CartSync;

/// One client session.
pub struct FoodyApp<N> {
    durable: SharedStorage,
    api: ApiClient,
    auth: AuthSession,
    cart: CartSync<ApiClient, N>,
    filters: RestaurantFilters,
}

impl<N> std::fmt::Debug for FoodyApp<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FoodyApp")
            .field("api", &self.api)
            .field("cart", &self.cart)
            .field("filters", &self.filters)
            .finish_non_exhaustive()
    }
}

impl<N: Notifier> FoodyApp<N> {
    /// Start a session backed by files in the configured storage directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage directory or HTTP client cannot be
    /// set up.
    pub fn init(config: &ClientConfig, notifier: N) -> Result<Self> {
        let durable: SharedStorage = Arc::new(FileStorage::open(&config.storage_dir)?);
        Self::with_storage(config, durable, Arc::new(MemoryStorage::new()), notifier)
    }

    /// Start a session on the given storage backends.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_storage(
        config: &ClientConfig,
        durable: SharedStorage,
        session: SharedStorage,
        notifier: N,
    ) -> Result<Self> {
        let api = ApiClient::new(config, Credentials::default())?;
        let auth = AuthSession::new(api.clone(), Arc::clone(&durable), session);
        let restored = auth.restore();

        let store = CartStore::load(Arc::clone(&durable));
        let cart = CartSync::new(
            store,
            api.clone(),
            notifier,
            QueryCache::new(config.cart_cache_ttl),
        );

        info!(logged_in = restored, lines = cart.lines().len(), "Session started");
        Ok(Self {
            durable,
            api,
            auth,
            cart,
            filters: RestaurantFilters::default(),
        })
    }

    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    #[must_use]
    pub const fn auth(&self) -> &AuthSession {
        &self.auth
    }

    #[must_use]
    pub const fn cart(&self) -> &CartSync<ApiClient, N> {
        &self.cart
    }

    pub const fn cart_mut(&mut self) -> &mut CartSync<ApiClient, N> {
        &mut self.cart
    }

    #[must_use]
    pub const fn filters(&self) -> &RestaurantFilters {
        &self.filters
    }

    pub const fn filters_mut(&mut self) -> &mut RestaurantFilters {
        &mut self.filters
    }

    /// Log in. The cached remote cart belongs to the previous identity, so
    /// it is dropped.
    ///
    /// # Errors
    ///
    /// Returns the login error.
    pub async fn login(
        &mut self,
        email: &str,
        password: SecretString,
        remember: bool,
    ) -> Result<Option<User>> {
        let user = self.auth.login(email, password, remember).await?;
        self.cart.cache().invalidate_cart().await;
        Ok(user)
    }

    /// Register and log in.
    ///
    /// # Errors
    ///
    /// Returns the validation or registration error.
    pub async fn register(&mut self, form: RegisterForm) -> Result<Option<User>> {
        let user = self.auth.register(form).await?;
        self.cart.cache().invalidate_cart().await;
        Ok(user)
    }

    /// End the session: forget the login, empty the cart, reset filters.
    pub async fn logout(&mut self) {
        self.auth.logout();
        self.cart.teardown().await;
        self.filters.clear();
    }

    /// Restaurants matching the current filters.
    ///
    /// # Errors
    ///
    /// Returns the request error.
    pub async fn browse(&self, page: u32, limit: u32) -> Result<RestaurantPage> {
        let query = RestaurantQuery {
            page,
            limit,
            filters: self.filters.clone(),
        };
        Ok(self.api.restaurants(&query).await?)
    }

    /// Place an order for the whole cart.
    ///
    /// # Errors
    ///
    /// Returns the checkout error; the cart is untouched on error.
    pub async fn checkout(&mut self, details: DeliveryDetails) -> Result<CheckoutReceipt> {
        Ok(checkout::checkout(&mut self.cart, &self.durable, details).await?)
    }

    /// Receipt of the last successful checkout.
    #[must_use]
    pub fn last_receipt(&self) -> CheckoutReceipt {
        checkout::last_receipt(&self.durable)
    }

    /// Order history for one status tab.
    ///
    /// # Errors
    ///
    /// Returns the request error; see [`crate::ClientError::requires_login`].
    pub async fn my_orders(&self, status: OrderStatus, page: u32, limit: u32) -> Result<OrderPage> {
        Ok(self.api.my_orders(status, page, limit).await?)
    }

    /// Create or update the review of an order.
    ///
    /// # Errors
    ///
    /// Returns the validation or request error.
    pub async fn submit_review(&self, order: &Order, star: u8, comment: &str) -> Result<String> {
        Ok(review::submit_review(&self.api, order, star, comment).await?)
    }
}
