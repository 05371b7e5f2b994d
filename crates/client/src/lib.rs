//! `loyalty-client`
//!
//! **Responsibility:** client-side session, API access and navigation gating
//! for the multi-tenant loyalty app.
//!
//! This crate provides:
//! - A persisted session store (user, token pair, tenant)
//! - An API client with bearer injection and one-shot silent refresh
//! - The route table and the guard that runs before every navigation
//!
//! All business rules live behind the remote API; this is a **thin shell**.

pub mod api;
pub mod app;
pub mod config;
pub mod guard;
pub mod routes;
pub mod session;
pub mod storage;

pub use api::{ApiClient, ApiError, ApiErrorKind, Credentials, RequestOptions};
pub use app::AppState;
pub use config::ClientConfig;
pub use guard::{AuthState, IdentityProvider, NavigationDecision, RouteGuard};
pub use routes::{Location, Section};
pub use session::{STORAGE_KEY, Session, SessionStore};
pub use storage::{MemoryStorage, Storage, StorageError};

#[cfg(not(target_arch = "wasm32"))]
pub use storage::FileStorage;
