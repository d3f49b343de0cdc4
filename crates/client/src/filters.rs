//! Restaurant list filters.
//!
//! Filters are a small piece of session state: they survive navigation
//! between list views and are cleared on logout.

use foody_core::Rupiah;

/// Distance filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Distance {
    /// Restaurants close to the user; sent as `range=0`.
    Nearby,
    /// Within a number of kilometres.
    Km(u32),
}

impl Distance {
    const fn range(self) -> u32 {
        match self {
            Self::Nearby => 0,
            Self::Km(km) => km,
        }
    }
}

/// Filters for the restaurant list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestaurantFilters {
    pub distance: Option<Distance>,
    pub price_min: Option<Rupiah>,
    pub price_max: Option<Rupiah>,
    /// Minimum star rating.
    pub rating: Option<u8>,
}

impl RestaurantFilters {
    /// Returns true if no filter is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Reset every filter.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Query parameters for the set filters.
    #[must_use]
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(distance) = self.distance {
            pairs.push(("range", distance.range().to_string()));
        }
        if let Some(min) = self.price_min {
            pairs.push(("priceMin", min.amount().normalize().to_string()));
        }
        if let Some(max) = self.price_max {
            pairs.push(("priceMax", max.amount().normalize().to_string()));
        }
        if let Some(rating) = self.rating {
            pairs.push(("rating", rating.to_string()));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filters_send_nothing() {
        assert!(RestaurantFilters::default().to_query().is_empty());
    }

    #[test]
    fn test_query_values() {
        let filters = RestaurantFilters {
            distance: Some(Distance::Km(3)),
            price_min: Some(Rupiah::from(10_000)),
            price_max: Some(Rupiah::from(50_000)),
            rating: Some(4),
        };
        assert_eq!(
            filters.to_query(),
            vec![
                ("range", "3".to_string()),
                ("priceMin", "10000".to_string()),
                ("priceMax", "50000".to_string()),
                ("rating", "4".to_string()),
            ]
        );
    }

    #[test]
    fn test_nearby_is_range_zero_and_clear() {
        let mut filters = RestaurantFilters {
            distance: Some(Distance::Nearby),
            ..RestaurantFilters::default()
        };
        assert_eq!(filters.to_query(), vec![("range", "0".to_string())]);

        filters.clear();
        assert!(filters.is_empty());
    }
}
