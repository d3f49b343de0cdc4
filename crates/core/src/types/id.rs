//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different entity types. A menu id and a
//! server cart line id are both plain integers on the wire, and confusing
//! them is the easiest way to delete the wrong line.

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `i64` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `PartialOrd`, `Ord`, `Hash`
/// - Conversion methods: `new()`, `as_i64()`
/// - `From<i64>` and `Into<i64>` implementations
///
/// # Example
///
/// ```rust
/// # use foody_core::define_id;
/// define_id!(MenuId);
/// define_id!(CartLineId);
///
/// let menu_id = MenuId::new(1);
/// let line_id = CartLineId::new(1);
///
/// // These are different types, so this won't compile:
/// // let _: MenuId = line_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Create a new ID from an i64 value.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Get the underlying i64 value.
            #[must_use]
            pub const fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

// Define standard entity IDs
define_id!(MenuId);
define_id!(RestaurantId);
define_id!(CartLineId);
define_id!(OrderId);
define_id!(ReviewId);
define_id!(UserId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_id_serializes_transparently() {
        let id = MenuId::new(42);
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");

        let parsed: CartLineId = serde_json::from_str("7").unwrap();
        assert_eq!(parsed, CartLineId::new(7));
    }

    #[test]
    fn test_id_ordering() {
        let mut ids = vec![MenuId::new(3), MenuId::new(1), MenuId::new(2)];
        ids.sort();
        assert_eq!(ids, vec![MenuId::new(1), MenuId::new(2), MenuId::new(3)]);
    }

    #[test]
    fn test_id_display() {
        assert_eq!(RestaurantId::new(12).to_string(), "12");
        assert_eq!(i64::from(OrderId::new(5)), 5);
    }
}
