//! Result presentation.

mod list;

pub(crate) use list::address_text;
pub use list::{AddressKind, ListEntry, ResultList};

/// Shown instead of the list when a query finds nothing
pub const NO_RESULTS: &str = "No nearby places found. Try a different location.";
