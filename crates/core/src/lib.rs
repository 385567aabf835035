//! `igaku-core`: shared primitives for the Igaku client.
//!
//! This crate contains **pure** building blocks (no HTTP, no storage).

pub mod error;
pub mod id;
pub mod page;

pub use error::{DomainError, DomainResult};
pub use id::UserId;
pub use page::{Page, PageRequest, SortOrder, DEFAULT_PAGE, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
