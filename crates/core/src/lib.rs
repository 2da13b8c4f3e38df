#![warn(clippy::all, missing_docs)]

//! Core logic for the MediaAMP game catalog browser.
//!
//! This crate hosts the data models, configuration handling, the remote
//! catalog client, the catalog store with the user's library, and the
//! filter/paginate projection used by the terminal UI and any future
//! frontends.

pub mod config;
pub mod identity;
pub mod models;
pub mod remote;
pub mod store;
pub mod view;

pub use config::AppConfig;
pub use identity::Identity;
pub use models::{GameDetail, GameId, GameSummary, Screenshot, Tag, Trailer};
pub use remote::{CatalogClient, FetchError};
pub use store::{CatalogState, CatalogStore, LoadStatus, LoadTicket};
pub use view::{project, BrowseView, Projection, ViewQuery, PAGE_SIZE};
