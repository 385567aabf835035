//! `igaku-client`: remote API client, view controllers and the `igaku` CLI.
//!
//! Every view runs the admission guard from `igaku-auth` before it touches the
//! network, and reuses the credential the guard read as its bearer token.

pub mod api;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod fetch;
pub mod offline;
pub mod types;
pub mod views;

pub use api::ApiClient;
pub use cache::{CacheError, ProfileSnapshot, ProfileSnapshotCache};
pub use config::{ClientConfig, ConfigError};
pub use error::ApiError;
pub use export::render_user_csv;
pub use fetch::{FetchTicket, FetchTracker};
pub use offline::{ConnectivityState, OfflineMode};
pub use types::{LoginCredentials, RegistrationFields, UserData, UserListQuery, UserOrderField};
pub use views::{AppContext, ViewError, ViewOutcome};
