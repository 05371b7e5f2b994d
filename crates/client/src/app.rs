//! Application wiring: the explicit initialization phase.
//!
//! The session is loaded exactly once, here, before the API client and the
//! route guard that share it are built.

use std::sync::Arc;

use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::guard::RouteGuard;
use crate::session::SessionStore;
use crate::storage::Storage;

/// Shared client state handed to whatever drives navigation and requests.
#[derive(Clone)]
pub struct AppState {
    pub config: ClientConfig,
    pub session: Arc<SessionStore>,
    pub api: Arc<ApiClient>,
    pub guard: Arc<RouteGuard>,
}

impl AppState {
    /// Load the session from `storage` and build the client stack around it.
    pub fn open(config: ClientConfig, storage: Arc<dyn Storage>) -> Self {
        let session = Arc::new(SessionStore::open(storage));
        let api = Arc::new(ApiClient::new(config.api_base.clone(), session.clone()));
        let guard = Arc::new(RouteGuard::new(
            session.clone(),
            api.clone(),
            config.default_tenant.clone(),
        ));

        tracing::debug!(
            api_base = %config.api_base,
            authenticated = session.is_authenticated(),
            "client state initialized"
        );

        Self {
            config,
            session,
            api,
            guard,
        }
    }
}
