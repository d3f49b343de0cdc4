//! Cart synchronisation.
//!
//! [`CartSync`] is the only writer of the local cart. It hydrates and
//! reconciles at mount time and routes every user action through
//! [`OptimisticCommand`] when a user is logged in. Guest sessions never
//! touch the network: their mutations land in the local store and always
//! succeed.

use std::num::NonZeroU32;

use foody_core::{CartLine, CartLineId, CartState, MenuId, RemoteCartSnapshot, RestaurantId, Rupiah};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::api::ApiError;
use crate::api::cart::{AddCartLine, CartItemAck};
use crate::api::restaurants::{MenuItem, RestaurantDetail};
use crate::cache::QueryCache;
use crate::error::{self, add_breadcrumb};
use crate::notify::{Notification, Notifier};
use crate::optimistic::OptimisticCommand;
use crate::reconcile::{Reconciled, reconcile};
use crate::remote::CartRemote;
use crate::store::CartStore;
use crate::view::CartView;

const ADDED: &str = "Item added to cart";
const ADD_FAILED: &str = "Failed to add item to cart";
const UPDATE_FAILED: &str = "Failed to update cart";
const REMOVED: &str = "Item removed from cart";
const REMOVE_FAILED: &str = "Failed to remove item from cart";

/// Errors from cart synchronisation.
#[derive(Debug, Error)]
pub enum CartError {
    /// The cart endpoint needs a logged-in user.
    #[error("Login required")]
    LoginRequired,

    /// No line for this menu item.
    #[error("Menu item {0} is not in the cart")]
    NotInCart(MenuId),

    /// The server rejected the change; it was rolled back.
    #[error("{0}")]
    Api(#[from] ApiError),
}

/// What mounting a cart view did to the local cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountOutcome {
    /// Local cart left as it was.
    Kept,
    /// Local cart replaced by the server's.
    Adopted,
    /// A newer reconciliation superseded this one; the response was dropped.
    Cancelled,
}

/// A menu item about to be added to the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuSelection {
    pub menu_id: MenuId,
    pub name: String,
    pub unit_price: Rupiah,
    pub image_ref: String,
    pub restaurant_id: RestaurantId,
    pub restaurant_name: String,
}

impl MenuSelection {
    /// Select a menu item from a restaurant page.
    #[must_use]
    pub fn from_menu(restaurant: &RestaurantDetail, menu: &MenuItem) -> Self {
        Self {
            menu_id: menu.id,
            name: menu.food_name.clone(),
            unit_price: menu.price,
            image_ref: menu.image.clone(),
            restaurant_id: restaurant.id,
            restaurant_name: restaurant.name.clone(),
        }
    }

    fn into_line(self, quantity: NonZeroU32, remote_line_id: Option<CartLineId>) -> CartLine {
        CartLine {
            menu_id: self.menu_id,
            remote_line_id,
            name: self.name,
            unit_price: self.unit_price,
            image_ref: self.image_ref,
            restaurant_id: self.restaurant_id,
            restaurant_name: self.restaurant_name,
            quantity,
        }
    }
}

/// Fold a server echo into the local line.
fn fold_ack(store: &mut CartStore, menu_id: MenuId, ack: Option<&CartItemAck>) {
    if let Some(ack) = ack {
        store.assign_remote_id(menu_id, ack.id);
        store.set_quantity(menu_id, i64::from(ack.quantity));
    }
}

/// Keeps the local cart in step with the remote one.
pub struct CartSync<R, N> {
    store: CartStore,
    remote: R,
    notifier: N,
    cache: QueryCache,
}

impl<R, N> std::fmt::Debug for CartSync<R, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartSync")
            .field("store", &self.store)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl<R: CartRemote, N: Notifier> CartSync<R, N> {
    /// Wrap a loaded store. Nothing is fetched until [`Self::on_mount`].
    #[must_use]
    pub const fn new(store: CartStore, remote: R, notifier: N, cache: QueryCache) -> Self {
        Self {
            store,
            remote,
            notifier,
            cache,
        }
    }

    /// Current cart lines.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        self.store.lines()
    }

    /// The local cart.
    #[must_use]
    pub const fn state(&self) -> &CartState {
        self.store.state()
    }

    /// The backend this cart syncs with.
    #[must_use]
    pub const fn remote(&self) -> &R {
        &self.remote
    }

    /// Where success and failure toasts go.
    #[must_use]
    pub const fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Cached server snapshot, shared with the optimistic commands.
    #[must_use]
    pub const fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Display model: the cached server snapshot when it has lines, the
    /// local cart otherwise.
    pub async fn view(&self) -> CartView {
        let snapshot = if self.remote.is_authenticated() {
            self.cache.cart().await
        } else {
            None
        };
        CartView::choose(self.store.state(), snapshot.as_ref())
    }

    /// Reconcile at mount time of a cart-consuming view.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LoginRequired`] if the server demands a login,
    /// or the fetch error otherwise. The local cart is untouched on error.
    #[instrument(skip(self, cancel))]
    pub async fn on_mount(&mut self, cancel: &CancellationToken) -> Result<MountOutcome, CartError> {
        let Some(snapshot) = self.fetch_snapshot(cancel).await? else {
            return Ok(MountOutcome::Cancelled);
        };

        match reconcile(self.store.state(), snapshot.as_ref()) {
            Reconciled::Kept => Ok(MountOutcome::Kept),
            Reconciled::Adopted(state) => {
                info!(lines = state.len(), "Adopting remote cart");
                self.store.replace_all(state.into_lines());
                Ok(MountOutcome::Adopted)
            }
        }
    }

    /// `None` when cancelled; `Some(None)` in guest mode.
    async fn fetch_snapshot(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Option<Option<RemoteCartSnapshot>>, CartError> {
        if !self.remote.is_authenticated() {
            debug!("Guest session, skipping remote cart");
            return Ok(Some(None));
        }
        if let Some(cached) = self.cache.cart().await {
            return Ok(Some(Some(cached)));
        }

        let fetched = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!("Cart fetch superseded");
                return Ok(None);
            }
            result = self.remote.fetch_cart() => result,
        };

        match fetched {
            Ok(snapshot) => {
                self.cache.put_cart(snapshot.clone()).await;
                Ok(Some(Some(snapshot)))
            }
            Err(e) if e.requires_login() => Err(CartError::LoginRequired),
            Err(e) => {
                error::report("fetch_cart", &e);
                Err(e.into())
            }
        }
    }

    /// Add `quantity` units of a menu item.
    ///
    /// A line the server already holds is updated to its new total. Any
    /// other line is posted with its whole local quantity, so lines kept
    /// from a guest session reach the server complete.
    ///
    /// # Errors
    ///
    /// Returns the server error after rolling back.
    #[instrument(skip(self, item), fields(menu_id = %item.menu_id))]
    pub async fn add(&mut self, item: MenuSelection, quantity: NonZeroU32) -> Result<(), CartError> {
        let menu_id = item.menu_id;
        let existing = self.store.get(menu_id).cloned();
        let remote_line_id = existing.as_ref().and_then(|l| l.remote_line_id);
        let next = existing
            .as_ref()
            .map_or(quantity, |l| l.quantity.saturating_add(quantity.get()));
        let body = AddCartLine {
            restaurant_id: item.restaurant_id,
            menu_id,
            quantity: next.get(),
        };
        let line = item.into_line(next, remote_line_id);

        add_breadcrumb("cart", "Add item", Some(&[("menu_id", menu_id.to_string().as_str())]));

        if !self.remote.is_authenticated() {
            self.store.upsert(line);
            self.notifier.notify(Notification::success(ADDED));
            return Ok(());
        }

        let mut command = OptimisticCommand::new("add_to_cart", move |s: &mut CartStore| s.upsert(line), ADD_FAILED);
        if let Some(line_id) = remote_line_id {
            command = command.with_cache_edit(move |c| c.with_quantity(line_id, next));
        }

        let remote = &self.remote;
        let submit = async move {
            match remote_line_id {
                Some(line_id) => remote.update_line(line_id, next.get()).await,
                None => remote.add_line(body).await,
            }
        };

        command
            .run(&mut self.store, &self.cache, &self.notifier, submit, |s, ack| {
                fold_ack(s, menu_id, ack.as_ref());
            })
            .await?;

        info!(quantity = next.get(), "Item added to cart");
        self.notifier.notify(Notification::success(ADDED));
        Ok(())
    }

    /// Add one unit of a line already in the cart.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotInCart`] or the server error after rollback.
    pub async fn increase(&mut self, menu_id: MenuId) -> Result<(), CartError> {
        let current = self.current_quantity(menu_id)?;
        self.set_quantity(menu_id, current + 1).await
    }

    /// Remove one unit; the line goes away at zero.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotInCart`] or the server error after rollback.
    pub async fn decrease(&mut self, menu_id: MenuId) -> Result<(), CartError> {
        let current = self.current_quantity(menu_id)?;
        self.set_quantity(menu_id, current - 1).await
    }

    /// Set a line's quantity. Zero or below removes the line.
    ///
    /// A line without a server id is posted when its quantity grows while
    /// logged in, and takes the id the server assigns. Shrinking such a line
    /// stays local.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotInCart`] or the server error after rollback.
    #[instrument(skip(self))]
    pub async fn set_quantity(&mut self, menu_id: MenuId, quantity: i64) -> Result<(), CartError> {
        let line = self.store.get(menu_id).ok_or(CartError::NotInCart(menu_id))?;
        let remote_line_id = line.remote_line_id;
        let restaurant_id = line.restaurant_id;
        let current = line.quantity;

        let Some(next) = u32::try_from(quantity).ok().and_then(NonZeroU32::new) else {
            if quantity <= 0 {
                return self.remove(menu_id).await;
            }
            // Beyond u32: let the store clamp it.
            self.store.set_quantity(menu_id, quantity);
            return Ok(());
        };

        if !self.remote.is_authenticated() {
            self.store.set_quantity(menu_id, quantity);
            return Ok(());
        }

        let apply = move |s: &mut CartStore| s.set_quantity(menu_id, quantity);

        match remote_line_id {
            Some(line_id) => {
                let command = OptimisticCommand::new("update_cart", apply, UPDATE_FAILED)
                    .with_cache_edit(move |c| c.with_quantity(line_id, next));
                let submit = self.remote.update_line(line_id, next.get());
                command
                    .run(&mut self.store, &self.cache, &self.notifier, submit, |s, ack| {
                        fold_ack(s, menu_id, ack.as_ref());
                    })
                    .await?;
            }
            None if next > current => {
                add_breadcrumb("cart", "Sync local line", Some(&[("menu_id", menu_id.to_string().as_str())]));
                let body = AddCartLine {
                    restaurant_id,
                    menu_id,
                    quantity: next.get(),
                };
                let submit = self.remote.add_line(body);
                OptimisticCommand::new("add_to_cart", apply, UPDATE_FAILED)
                    .run(&mut self.store, &self.cache, &self.notifier, submit, |s, ack| {
                        fold_ack(s, menu_id, ack.as_ref());
                    })
                    .await?;
                debug!(quantity = next.get(), "Local line posted to server");
            }
            None => self.store.set_quantity(menu_id, quantity),
        }
        Ok(())
    }

    /// Remove a line. Guest lines and lines without a server id are removed
    /// locally only.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotInCart`] or the server error after rollback.
    #[instrument(skip(self))]
    pub async fn remove(&mut self, menu_id: MenuId) -> Result<(), CartError> {
        let line = self.store.get(menu_id).ok_or(CartError::NotInCart(menu_id))?;
        let remote_line_id = line.remote_line_id;

        add_breadcrumb("cart", "Remove item", Some(&[("menu_id", menu_id.to_string().as_str())]));

        let line_id = match remote_line_id {
            Some(line_id) if self.remote.is_authenticated() => line_id,
            _ => {
                self.store.remove(menu_id);
                return Ok(());
            }
        };

        let command = OptimisticCommand::new(
            "remove_from_cart",
            move |s: &mut CartStore| {
                s.remove(menu_id);
            },
            REMOVE_FAILED,
        )
        .with_cache_edit(move |c| c.without_line(line_id));

        let submit = self.remote.delete_line(line_id);
        command
            .run(&mut self.store, &self.cache, &self.notifier, submit, |_, ()| {})
            .await?;

        info!("Item removed from cart");
        self.notifier.notify(Notification::success(REMOVED));
        Ok(())
    }

    /// Empty the local cart without touching the server, and forget the
    /// cached snapshot. Used after checkout.
    pub async fn clear_local(&mut self) {
        self.store.clear();
        self.cache.invalidate_cart().await;
    }

    /// End of session: clear the cart and every cached query.
    pub async fn teardown(&mut self) {
        self.store.clear();
        self.cache.clear().await;
        debug!("Cart sync torn down");
    }

    fn current_quantity(&self, menu_id: MenuId) -> Result<i64, CartError> {
        self.store
            .get(menu_id)
            .map(|line| i64::from(line.quantity.get()))
            .ok_or(CartError::NotInCart(menu_id))
    }
}
