//! Admin table pipeline: filter, sort and paginate an in-memory collection.
//!
//! The full collection is the only truth. Every call to [`derive_page`]
//! recomputes the visible page from it and the current [`TableState`].

/// Filter / sort / paginate derivation and table state
pub mod pipeline;
/// `TableRow` implementations for the admin entities
pub mod rows;

pub use pipeline::{
    EmptyState, FieldValue, SortDirection, TablePage, TableRow, TableState, derive_page,
};
