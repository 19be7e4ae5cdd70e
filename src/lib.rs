//! User Directory
//!
//! A small user-directory web service: CRUD over user records persisted in
//! a single JSON file, plus avatar uploads stored on local disk.

pub mod api;
pub mod avatar;
pub mod config;
pub mod context;
pub mod error;
pub mod metrics;
pub mod server;
pub mod service;
pub mod user_store;
pub mod validation;

pub use config::ServerConfig;
pub use context::AppContext;
pub use error::{DirectoryError, DirectoryResult};
pub use server::build_router;
pub use service::{AvatarCleanup, UpsertOutcome, UserService};
pub use user_store::{User, UserId, UserInput, UserPage};
