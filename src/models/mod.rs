//! Data models for the File Library catalog.
//!
//! Field names serialize in camelCase to match the listing front-end.

pub mod category;
mod item;
mod summary;
pub mod timestamp;

pub use item::*;
pub use summary::*;
