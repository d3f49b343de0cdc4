//! Local cart lines and cart state.
//!
//! [`CartState`] is the client's own view of the cart. It enforces the two
//! line invariants in one place: at most one line per [`MenuId`], and no
//! line with a quantity below one. Quantities are [`NonZeroU32`], and every
//! operation that would bring a quantity to zero or below removes the line
//! instead.
//!
//! The serialized form matches what earlier client versions persisted:
//! `{"items": [{"menuId": 1, "cartItemId": 9, "qty": 2, ...}]}`.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use crate::types::{CartLineId, MenuId, RestaurantId, Rupiah};

/// One menu item and its quantity in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Product key; unique within a cart.
    pub menu_id: MenuId,
    /// Server-side line id, assigned once the line is persisted remotely.
    #[serde(rename = "cartItemId", default, skip_serializing_if = "Option::is_none")]
    pub remote_line_id: Option<CartLineId>,
    /// Display name of the menu item.
    pub name: String,
    /// Price of a single unit.
    #[serde(rename = "price")]
    pub unit_price: Rupiah,
    /// Image URL.
    #[serde(rename = "image")]
    pub image_ref: String,
    /// Restaurant the item belongs to.
    pub restaurant_id: RestaurantId,
    /// Restaurant display name.
    pub restaurant_name: String,
    /// Units in the cart.
    #[serde(rename = "qty")]
    pub quantity: NonZeroU32,
}

impl CartLine {
    /// Price of the whole line.
    #[must_use]
    pub fn line_total(&self) -> Rupiah {
        self.unit_price.times(self.quantity.get())
    }

    /// Copy of this line with a different quantity.
    #[must_use]
    pub fn with_quantity(&self, quantity: NonZeroU32) -> Self {
        Self {
            quantity,
            ..self.clone()
        }
    }
}

/// The client-side cart.
///
/// Line order is insertion order and only matters for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartState {
    #[serde(default)]
    items: Vec<CartLine>,
}

impl CartState {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a cart from lines, merging duplicate menu ids.
    ///
    /// A later line for the same menu id replaces the earlier one in place,
    /// with the same rules as [`CartState::upsert`].
    #[must_use]
    pub fn from_lines(lines: impl IntoIterator<Item = CartLine>) -> Self {
        let mut state = Self::new();
        for line in lines {
            state.upsert(line);
        }
        state
    }

    /// All lines in display order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.items
    }

    /// Consume the cart and return its lines.
    #[must_use]
    pub fn into_lines(self) -> Vec<CartLine> {
        self.items
    }

    /// The line for a menu item, if present.
    #[must_use]
    pub fn get(&self, menu_id: MenuId) -> Option<&CartLine> {
        self.items.iter().find(|line| line.menu_id == menu_id)
    }

    /// The line carrying a server line id, if present.
    #[must_use]
    pub fn find_by_remote_id(&self, remote_line_id: CartLineId) -> Option<&CartLine> {
        self.items
            .iter()
            .find(|line| line.remote_line_id == Some(remote_line_id))
    }

    /// Returns true if the cart has a line for the menu item.
    #[must_use]
    pub fn contains(&self, menu_id: MenuId) -> bool {
        self.get(menu_id).is_some()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sorted menu ids of every line.
    #[must_use]
    pub fn menu_ids(&self) -> Vec<MenuId> {
        let mut ids: Vec<MenuId> = self.items.iter().map(|line| line.menu_id).collect();
        ids.sort_unstable();
        ids
    }

    /// Sum of all quantities.
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.items
            .iter()
            .map(|line| line.quantity.get())
            .fold(0, u32::saturating_add)
    }

    /// Sum of all line totals.
    #[must_use]
    pub fn subtotal(&self) -> Rupiah {
        self.items.iter().map(CartLine::line_total).sum()
    }

    /// Insert a line, or replace the line with the same menu id.
    ///
    /// A replacement keeps the existing server line id when the incoming
    /// line has none, so re-adding an item never forgets where it lives
    /// remotely.
    pub fn upsert(&mut self, line: CartLine) {
        match self.items.iter_mut().find(|l| l.menu_id == line.menu_id) {
            Some(existing) => {
                let remote_line_id = line.remote_line_id.or(existing.remote_line_id);
                *existing = CartLine {
                    remote_line_id,
                    ..line
                };
            }
            None => self.items.push(line),
        }
    }

    /// Set a line's quantity.
    ///
    /// Quantities of zero or below remove the line. Returns false when no
    /// line exists for the menu item, in which case nothing changes.
    pub fn set_quantity(&mut self, menu_id: MenuId, quantity: i64) -> bool {
        let Some(index) = self.items.iter().position(|l| l.menu_id == menu_id) else {
            return false;
        };

        match u32::try_from(quantity).ok().and_then(NonZeroU32::new) {
            Some(quantity) => {
                if let Some(line) = self.items.get_mut(index) {
                    line.quantity = quantity;
                }
            }
            None if quantity <= 0 => {
                self.items.remove(index);
            }
            // Larger than u32::MAX: clamp rather than drop the line.
            None => {
                if let Some(line) = self.items.get_mut(index) {
                    line.quantity = NonZeroU32::MAX;
                }
            }
        }
        true
    }

    /// Record the server line id for a menu item. No-op if the line is gone.
    pub fn assign_remote_id(&mut self, menu_id: MenuId, remote_line_id: CartLineId) {
        if let Some(line) = self.items.iter_mut().find(|l| l.menu_id == menu_id) {
            line.remote_line_id = Some(remote_line_id);
        }
    }

    /// Remove a line, returning it if it existed.
    pub fn remove(&mut self, menu_id: MenuId) -> Option<CartLine> {
        let index = self.items.iter().position(|l| l.menu_id == menu_id)?;
        Some(self.items.remove(index))
    }

    /// Replace every line.
    pub fn replace_all(&mut self, lines: impl IntoIterator<Item = CartLine>) {
        *self = Self::from_lines(lines);
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}
