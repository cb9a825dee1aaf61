//! Newtype IDs for type-safe entity references.
//!
//! The backend issues opaque string identifiers. Use the `define_id!` macro
//! to wrap them so a user ID can never be passed where a payment intent ID
//! is expected.

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>`, `From<&str>` and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use printshop_core::define_id;
/// define_id!(PhotoId);
/// define_id!(AlbumId);
///
/// let photo = PhotoId::new("665f1c2e");
/// assert_eq!(photo.as_str(), "665f1c2e");
///
/// // These are different types, so this won't compile:
/// // let _: AlbumId = photo;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the underlying identifier.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(UserId);
define_id!(OrderId);
define_id!(PaymentIntentId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_serialize_as_bare_strings() {
        let id = UserId::new("u_123");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"u_123\"");

        let parsed: OrderId = serde_json::from_str("\"ord_9\"").unwrap();
        assert_eq!(parsed.as_str(), "ord_9");
    }

    #[test]
    fn test_display_is_raw_identifier() {
        let id = PaymentIntentId::from("pi_3Nx");
        assert_eq!(id.to_string(), "pi_3Nx");
    }
}
