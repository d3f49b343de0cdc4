//! Cart display model.
//!
//! A [`CartView`] is what a cart page renders: lines grouped by restaurant
//! with subtotals and a summary. It is built from the server snapshot when
//! one with lines is cached, and from the local cart otherwise (guest carts,
//! first paint before the fetch lands).

use foody_core::{
    CartLineId, CartState, CartSummary, MenuId, RemoteCartSnapshot, RestaurantRef, Rupiah,
};

/// Logo shown for restaurants known only from the local cart.
pub const PLACEHOLDER_LOGO: &str = "/images/common/icon-restaurant-dummy.svg";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewLine {
    pub menu_id: MenuId,
    pub remote_line_id: Option<CartLineId>,
    pub name: String,
    pub unit_price: Rupiah,
    pub image: String,
    pub quantity: u32,
    pub line_total: Rupiah,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewGroup {
    pub restaurant: RestaurantRef,
    pub lines: Vec<ViewLine>,
    pub subtotal: Rupiah,
}

/// Cart grouped for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartView {
    pub groups: Vec<ViewGroup>,
    pub summary: CartSummary,
}

impl CartView {
    /// Group local lines by restaurant, in order of first appearance.
    #[must_use]
    pub fn from_state(state: &CartState) -> Self {
        let mut groups: Vec<ViewGroup> = Vec::new();

        for line in state.lines() {
            let view_line = ViewLine {
                menu_id: line.menu_id,
                remote_line_id: line.remote_line_id,
                name: line.name.clone(),
                unit_price: line.unit_price,
                image: line.image_ref.clone(),
                quantity: line.quantity.get(),
                line_total: line.line_total(),
            };

            match groups
                .iter_mut()
                .find(|g| g.restaurant.id == line.restaurant_id)
            {
                Some(group) => {
                    group.subtotal = group.subtotal + view_line.line_total;
                    group.lines.push(view_line);
                }
                None => groups.push(ViewGroup {
                    restaurant: RestaurantRef {
                        id: line.restaurant_id,
                        name: line.restaurant_name.clone(),
                        logo: Some(PLACEHOLDER_LOGO.to_string()),
                    },
                    subtotal: view_line.line_total,
                    lines: vec![view_line],
                }),
            }
        }

        Self::with_summary(groups)
    }

    /// Convert a server snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: &RemoteCartSnapshot) -> Self {
        let groups = snapshot
            .cart
            .iter()
            .filter(|group| !group.items.is_empty())
            .map(|group| ViewGroup {
                restaurant: group.restaurant.clone(),
                lines: group
                    .items
                    .iter()
                    .map(|item| ViewLine {
                        menu_id: item.menu.id,
                        remote_line_id: Some(item.id),
                        name: item.menu.food_name.clone(),
                        unit_price: item.menu.price,
                        image: item.menu.image.clone(),
                        quantity: item.quantity,
                        line_total: item.menu.price.times(item.quantity),
                    })
                    .collect(),
                subtotal: group.subtotal,
            })
            .collect();

        match snapshot.summary {
            Some(summary) => Self { groups, summary },
            None => Self::with_summary(groups),
        }
    }

    /// Prefer a snapshot that has lines; fall back to the local cart.
    #[must_use]
    pub fn choose(state: &CartState, snapshot: Option<&RemoteCartSnapshot>) -> Self {
        match snapshot.filter(|s| !s.is_empty()) {
            Some(snapshot) => Self::from_snapshot(snapshot),
            None => Self::from_state(state),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    fn with_summary(groups: Vec<ViewGroup>) -> Self {
        let summary = CartSummary {
            total_items: groups
                .iter()
                .flat_map(|g| g.lines.iter())
                .map(|l| l.quantity)
                .fold(0, u32::saturating_add),
            total_price: groups.iter().map(|g| g.subtotal).sum(),
            restaurant_count: u32::try_from(groups.len()).unwrap_or(u32::MAX),
        };
        Self { groups, summary }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::num::NonZeroU32;

    use foody_core::{CartLine, RestaurantId};

    use super::*;

    fn line(menu: i64, restaurant: i64, price: i64, qty: u32) -> CartLine {
        CartLine {
            menu_id: MenuId::new(menu),
            remote_line_id: None,
            name: format!("Menu {menu}"),
            unit_price: Rupiah::from(price),
            image_ref: String::new(),
            restaurant_id: RestaurantId::new(restaurant),
            restaurant_name: format!("Resto {restaurant}"),
            quantity: NonZeroU32::new(qty).unwrap(),
        }
    }

    #[test]
    fn test_groups_in_first_appearance_order() {
        let state = CartState::from_lines([
            line(1, 20, 10_000, 2),
            line(2, 10, 5_000, 1),
            line(3, 20, 7_500, 2),
        ]);
        let view = CartView::from_state(&state);

        let ids: Vec<_> = view.groups.iter().map(|g| g.restaurant.id).collect();
        assert_eq!(ids, vec![RestaurantId::new(20), RestaurantId::new(10)]);
        assert_eq!(view.groups[0].subtotal, Rupiah::from(35_000));
        assert_eq!(view.summary.total_items, 5);
        assert_eq!(view.summary.total_price, Rupiah::from(40_000));
        assert_eq!(view.summary.restaurant_count, 2);
        assert_eq!(view.summary.total_price.to_string(), "Rp40.000");
    }

    #[test]
    fn test_choose_falls_back_to_local_for_empty_snapshot() {
        let state = CartState::from_lines([line(1, 1, 10_000, 1)]);
        let view = CartView::choose(&state, Some(&RemoteCartSnapshot::default()));
        assert_eq!(view.groups.len(), 1);
        assert!(CartView::from_state(&CartState::new()).is_empty());
    }
}
