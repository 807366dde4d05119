// Client-only UI state that never reaches the backend

mod filter;
mod pagination;

pub use filter::{BookFilter, FilterPatch, FilterStore};
pub use pagination::Pagination;
