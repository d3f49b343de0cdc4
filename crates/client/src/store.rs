//! Local cart store.
//!
//! Owns the client's [`CartState`] and keeps the persisted copy in step with
//! it: every mutating operation writes the full state to storage before it
//! returns. Storage failures never reach the caller. A broken or missing
//! persisted cart loads as an empty cart, and a failed write is logged while
//! the in-memory state stays authoritative.

use foody_core::{CartLine, CartLineId, CartState, MenuId};
use tracing::{debug, warn};

use crate::storage::{SharedStorage, keys};

/// The persisted client-side cart.
pub struct CartStore {
    storage: SharedStorage,
    state: CartState,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Hydrate the store from storage.
    ///
    /// Absent, unreadable or unparseable state yields an empty cart.
    #[must_use]
    pub fn load(storage: SharedStorage) -> Self {
        let state = match storage.get(keys::CART_STATE) {
            Ok(Some(raw)) => match serde_json::from_str::<CartState>(&raw) {
                // Re-fold so duplicate menu ids from older writers collapse.
                Ok(parsed) => CartState::from_lines(parsed.into_lines()),
                Err(e) => {
                    warn!(error = %e, "Discarding unreadable persisted cart");
                    CartState::new()
                }
            },
            Ok(None) => CartState::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read persisted cart");
                CartState::new()
            }
        };

        debug!(lines = state.len(), "Cart store loaded");
        Self { storage, state }
    }

    /// Current cart state.
    #[must_use]
    pub const fn state(&self) -> &CartState {
        &self.state
    }

    /// Current lines in display order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        self.state.lines()
    }

    /// The line for a menu item.
    #[must_use]
    pub fn get(&self, menu_id: MenuId) -> Option<&CartLine> {
        self.state.get(menu_id)
    }

    /// Insert or replace the line for `line.menu_id`; persists.
    pub fn upsert(&mut self, line: CartLine) {
        self.state.upsert(line);
        self.persist();
    }

    /// Set a line's quantity (zero or below removes it); persists.
    ///
    /// Does nothing to the cart if the line does not exist.
    pub fn set_quantity(&mut self, menu_id: MenuId, quantity: i64) {
        self.state.set_quantity(menu_id, quantity);
        self.persist();
    }

    /// Record a server line id; persists.
    pub fn assign_remote_id(&mut self, menu_id: MenuId, remote_line_id: CartLineId) {
        self.state.assign_remote_id(menu_id, remote_line_id);
        self.persist();
    }

    /// Remove a line; persists.
    pub fn remove(&mut self, menu_id: MenuId) -> Option<CartLine> {
        let removed = self.state.remove(menu_id);
        self.persist();
        removed
    }

    /// Replace every line; persists.
    pub fn replace_all(&mut self, lines: impl IntoIterator<Item = CartLine>) {
        self.state.replace_all(lines);
        self.persist();
    }

    /// Restore a previously captured state; persists.
    pub fn restore(&mut self, state: CartState) {
        self.state = state;
        self.persist();
    }

    /// Empty the cart; persists.
    pub fn clear(&mut self) {
        self.state.clear();
        self.persist();
    }

    fn persist(&self) {
        let raw = match serde_json::to_string(&self.state) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Failed to serialize cart");
                return;
            }
        };
        if let Err(e) = self.storage.set(keys::CART_STATE, &raw) {
            warn!(error = %e, "Failed to persist cart");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::num::NonZeroU32;
    use std::sync::Arc;

    use foody_core::{RestaurantId, Rupiah};

    use super::*;
    use crate::storage::{KeyValueStore, MemoryStorage};

    fn line(menu_id: i64, qty: u32) -> CartLine {
        CartLine {
            menu_id: MenuId::new(menu_id),
            remote_line_id: None,
            name: format!("Menu {menu_id}"),
            unit_price: Rupiah::from(20_000),
            image_ref: String::new(),
            restaurant_id: RestaurantId::new(3),
            restaurant_name: "Padang Raya".to_string(),
            quantity: NonZeroU32::new(qty).unwrap(),
        }
    }

    fn persisted(storage: &MemoryStorage) -> CartState {
        serde_json::from_str(&storage.get(keys::CART_STATE).unwrap().unwrap()).unwrap()
    }

    #[test]
    fn test_load_absent_is_empty() {
        let store = CartStore::load(Arc::new(MemoryStorage::new()));
        assert!(store.state().is_empty());
    }

    #[test]
    fn test_load_garbage_is_empty() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(keys::CART_STATE, "{not json").unwrap();
        let store = CartStore::load(storage);
        assert!(store.state().is_empty());
    }

    #[test]
    fn test_mutations_persist() {
        let storage = Arc::new(MemoryStorage::new());
        let mut store = CartStore::load(storage.clone());

        store.upsert(line(1, 1));
        store.upsert(line(2, 2));
        assert_eq!(&persisted(&storage), store.state());

        store.set_quantity(MenuId::new(2), 5);
        assert_eq!(persisted(&storage).get(MenuId::new(2)).unwrap().quantity.get(), 5);

        store.remove(MenuId::new(1));
        assert_eq!(&persisted(&storage), store.state());

        store.clear();
        assert!(persisted(&storage).is_empty());
    }

    #[test]
    fn test_reload_survives() {
        let storage = Arc::new(MemoryStorage::new());
        let mut store = CartStore::load(storage.clone());
        store.upsert(line(4, 3));
        store.assign_remote_id(MenuId::new(4), CartLineId::new(400));

        let reloaded = CartStore::load(storage);
        let l = reloaded.get(MenuId::new(4)).unwrap();
        assert_eq!(l.quantity.get(), 3);
        assert_eq!(l.remote_line_id, Some(CartLineId::new(400)));
    }
}
