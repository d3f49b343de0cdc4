//! The server's view of a cart.
//!
//! `GET /api/cart` returns lines grouped by restaurant, with per-group
//! subtotals and a cart-wide summary. The client treats a snapshot as
//! read-only apart from the optimistic edits below, which mirror what the
//! server would compute so a cached snapshot stays consistent with the
//! optimistic local cart until the next fetch.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use crate::cart::CartLine;
use crate::types::{CartLineId, MenuId, MenuKind, RestaurantId, Rupiah};

/// A cart snapshot as returned by the cart API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCartSnapshot {
    /// Lines grouped by restaurant.
    #[serde(default)]
    pub cart: Vec<RestaurantCart>,
    /// Cart-wide totals.
    #[serde(default)]
    pub summary: Option<CartSummary>,
}

/// Lines from one restaurant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantCart {
    pub restaurant: RestaurantRef,
    #[serde(default)]
    pub items: Vec<RemoteCartItem>,
    #[serde(default)]
    pub subtotal: Rupiah,
}

/// Minimal restaurant identity embedded in carts and orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantRef {
    pub id: RestaurantId,
    pub name: String,
    #[serde(default)]
    pub logo: Option<String>,
}

/// One server-side cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCartItem {
    /// Server line id.
    pub id: CartLineId,
    pub menu: CartMenu,
    pub quantity: u32,
    #[serde(default)]
    pub item_total: Rupiah,
}

/// Menu details embedded in a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartMenu {
    pub id: MenuId,
    pub food_name: String,
    pub price: Rupiah,
    #[serde(rename = "type", default)]
    pub kind: MenuKind,
    #[serde(default)]
    pub image: String,
}

/// Cart-wide totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub total_items: u32,
    pub total_price: Rupiah,
    pub restaurant_count: u32,
}

impl RemoteCartSnapshot {
    /// Returns true if no restaurant group holds a line.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cart.iter().all(|group| group.items.is_empty())
    }

    /// Sorted menu ids of every line.
    #[must_use]
    pub fn menu_ids(&self) -> Vec<MenuId> {
        let mut ids: Vec<MenuId> = self.items().map(|(_, item)| item.menu.id).collect();
        ids.sort_unstable();
        ids
    }

    /// Every line with its restaurant.
    pub fn items(&self) -> impl Iterator<Item = (&RestaurantRef, &RemoteCartItem)> {
        self.cart
            .iter()
            .flat_map(|group| group.items.iter().map(move |item| (&group.restaurant, item)))
    }

    /// The line with the given server id.
    #[must_use]
    pub fn find_line(&self, line_id: CartLineId) -> Option<&RemoteCartItem> {
        self.items()
            .map(|(_, item)| item)
            .find(|item| item.id == line_id)
    }

    /// Flatten into local cart lines.
    ///
    /// Server lines with a zero quantity are dropped; they cannot exist in
    /// a local cart.
    #[must_use]
    pub fn to_lines(&self) -> Vec<CartLine> {
        self.items()
            .filter_map(|(restaurant, item)| {
                Some(CartLine {
                    menu_id: item.menu.id,
                    remote_line_id: Some(item.id),
                    name: item.menu.food_name.clone(),
                    unit_price: item.menu.price,
                    image_ref: item.menu.image.clone(),
                    restaurant_id: restaurant.id,
                    restaurant_name: restaurant.name.clone(),
                    quantity: NonZeroU32::new(item.quantity)?,
                })
            })
            .collect()
    }

    /// Copy with one line's quantity changed and totals recomputed.
    #[must_use]
    pub fn with_quantity(&self, line_id: CartLineId, quantity: NonZeroU32) -> Self {
        let mut next = self.clone();
        for item in next.cart.iter_mut().flat_map(|g| g.items.iter_mut()) {
            if item.id == line_id {
                item.quantity = quantity.get();
                item.item_total = item.menu.price.times(item.quantity);
            }
        }
        next.recompute();
        next
    }

    /// Copy with one line removed, dropping restaurant groups left empty.
    #[must_use]
    pub fn without_line(&self, line_id: CartLineId) -> Self {
        let mut next = self.clone();
        for group in &mut next.cart {
            group.items.retain(|item| item.id != line_id);
        }
        next.cart.retain(|group| !group.items.is_empty());
        next.recompute();
        next
    }

    fn recompute(&mut self) {
        for group in &mut self.cart {
            group.subtotal = group
                .items
                .iter()
                .map(|item| item.menu.price.times(item.quantity))
                .sum();
        }
        let restaurant_count = u32::try_from(self.cart.len()).unwrap_or(u32::MAX);
        self.summary = Some(CartSummary {
            total_items: self
                .items()
                .map(|(_, item)| item.quantity)
                .fold(0, u32::saturating_add),
            total_price: self.cart.iter().map(|group| group.subtotal).sum(),
            restaurant_count,
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn snapshot() -> RemoteCartSnapshot {
        serde_json::from_value(serde_json::json!({
            "cart": [
                {
                    "restaurant": { "id": 1, "name": "Sate Khas Senayan", "logo": "https://cdn.foody.id/r/1.png" },
                    "items": [
                        { "id": 11, "menu": { "id": 101, "foodName": "Sate Ayam", "price": 30000, "type": "food", "image": "a.jpg" }, "quantity": 2, "itemTotal": 60000 },
                        { "id": 12, "menu": { "id": 102, "foodName": "Es Teh", "price": 5000, "type": "drink", "image": "b.jpg" }, "quantity": 1, "itemTotal": 5000 }
                    ],
                    "subtotal": 65000
                },
                {
                    "restaurant": { "id": 2, "name": "Bakmi GM", "logo": null },
                    "items": [
                        { "id": 21, "menu": { "id": 201, "foodName": "Bakmi Ayam", "price": 40000, "type": "food", "image": "c.jpg" }, "quantity": 1, "itemTotal": 40000 }
                    ],
                    "subtotal": 40000
                }
            ],
            "summary": { "totalItems": 4, "totalPrice": 105000, "restaurantCount": 2 }
        }))
        .unwrap()
    }

    #[test]
    fn test_to_lines_flattens_groups() {
        let lines = snapshot().to_lines();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].menu_id, MenuId::new(101));
        assert_eq!(lines[0].remote_line_id, Some(CartLineId::new(11)));
        assert_eq!(lines[2].restaurant_name, "Bakmi GM");
    }

    #[test]
    fn test_menu_ids_sorted() {
        assert_eq!(
            snapshot().menu_ids(),
            vec![MenuId::new(101), MenuId::new(102), MenuId::new(201)]
        );
    }

    #[test]
    fn test_with_quantity_recomputes_totals() {
        let next = snapshot().with_quantity(CartLineId::new(12), NonZeroU32::new(3).unwrap());
        let group = &next.cart[0];
        assert_eq!(group.items[1].quantity, 3);
        assert_eq!(group.items[1].item_total, Rupiah::from(15_000));
        assert_eq!(group.subtotal, Rupiah::from(75_000));

        let summary = next.summary.unwrap();
        assert_eq!(summary.total_items, 6);
        assert_eq!(summary.total_price, Rupiah::from(115_000));
    }

    #[test]
    fn test_total_items_saturate() {
        let next = snapshot()
            .with_quantity(CartLineId::new(11), NonZeroU32::MAX)
            .with_quantity(CartLineId::new(21), NonZeroU32::MAX);
        assert_eq!(next.summary.unwrap().total_items, u32::MAX);
    }

    #[test]
    fn test_without_line_drops_empty_group() {
        let next = snapshot().without_line(CartLineId::new(21));
        assert_eq!(next.cart.len(), 1);
        assert_eq!(next.summary.unwrap().restaurant_count, 1);
        assert!(next.find_line(CartLineId::new(21)).is_none());
    }

    #[test]
    fn test_empty_snapshot() {
        let empty: RemoteCartSnapshot = serde_json::from_str(r#"{"cart":[]}"#).unwrap();
        assert!(empty.is_empty());
        assert!(empty.to_lines().is_empty());
    }
}
