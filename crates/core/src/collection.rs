//! The contract shared by every mirrored shopping list.
//!
//! A [`Collection`] is the full in-memory value of a cart or wishlist. The
//! storefront's sync layer is generic over it: it serializes the whole value
//! as a snapshot, writes it to the local mirror under [`CollectionKind::local_key`],
//! and stores it in the remote row `CollectionKind::remote_table` /
//! `CollectionKind::remote_column`.

use core::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Which shopping list a collection is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    Cart,
    Wishlist,
}

impl CollectionKind {
    /// Key of the local mirror slot.
    #[must_use]
    pub const fn local_key(self) -> &'static str {
        match self {
            Self::Cart => "cart",
            Self::Wishlist => "wishlist",
        }
    }

    /// Remote collection (table) holding one row per user.
    #[must_use]
    pub const fn remote_table(self) -> &'static str {
        match self {
            Self::Cart => "carts",
            Self::Wishlist => "wishlists",
        }
    }

    /// Column of the remote row holding the snapshot array.
    #[must_use]
    pub const fn remote_column(self) -> &'static str {
        match self {
            Self::Cart => "items",
            Self::Wishlist => "products",
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.local_key())
    }
}

/// A shopping list that can be mirrored as a snapshot.
///
/// Serialization must produce a JSON array; the default value is the empty
/// list that absent or corrupt snapshots load as.
pub trait Collection:
    Clone + Default + PartialEq + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Change event produced by a state transition.
    type Change: Clone + fmt::Debug + Send + Sync + 'static;

    /// Which list this is.
    const KIND: CollectionKind;

    /// Number of entries (distinct products).
    fn len(&self) -> usize;

    /// Whether the list has no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Re-establish the list invariants on a value loaded from a replica
    /// (unique ids, positive quantities).
    #[must_use]
    fn normalized(self) -> Self;
}
