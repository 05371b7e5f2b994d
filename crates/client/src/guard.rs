//! Navigation guard: decides, before each navigation, whether to allow it or
//! where to redirect instead.

use std::sync::Arc;

use async_trait::async_trait;

use loyalty_auth::{Role, User};
use loyalty_core::TenantSlug;

use crate::api::{ApiClient, ApiError};
use crate::routes::{self, Location, MatchedRoute, RouteKind};
use crate::session::SessionStore;

/// Redirect chains longer than this are cut short by [`RouteGuard::navigate`].
const MAX_REDIRECTS: usize = 5;

/// Source of the current user's identity for a tenant.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn fetch_identity(&self, tenant: &TenantSlug) -> Result<User, ApiError>;
}

#[async_trait]
impl IdentityProvider for ApiClient {
    async fn fetch_identity(&self, tenant: &TenantSlug) -> Result<User, ApiError> {
        ApiClient::fetch_identity(self, tenant).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationDecision {
    Allow,
    Redirect(Location),
}

/// Authentication facts the decision table needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AuthState {
    pub has_token: bool,
    pub role: Option<Role>,
}

/// The decision table. First matching rule wins.
///
/// Pure: no IO, no session access.
pub fn decide(
    route: &MatchedRoute,
    to: &Location,
    tenant: &TenantSlug,
    auth: AuthState,
) -> NavigationDecision {
    let landing = || routes::role_default_path(auth.role, tenant);

    match route.kind {
        RouteKind::Legacy(name) => {
            return NavigationDecision::Redirect(Location::new(format!("/t/{tenant}/{name}")));
        }
        RouteKind::Root | RouteKind::TenantIndex => {
            let target = if auth.has_token {
                landing()
            } else {
                routes::Section::Client.login_path(tenant)
            };
            return NavigationDecision::Redirect(Location::new(target));
        }
        _ => {}
    }

    let meta = route.meta();
    let role_mismatch = matches!(
        (meta.role, auth.role),
        (Some(required), Some(actual)) if required != actual
    );

    if meta.requires_auth && !auth.has_token {
        return NavigationDecision::Redirect(Location::new(routes::section_login_path(
            to.path(),
            tenant,
        )));
    }

    if meta.guest_only && auth.has_token {
        let target = if role_mismatch {
            Location::forbidden(landing())
        } else {
            Location::new(landing())
        };
        return NavigationDecision::Redirect(target);
    }

    if meta.requires_auth && role_mismatch {
        return NavigationDecision::Redirect(Location::forbidden(landing()));
    }

    NavigationDecision::Allow
}

/// Runs before every navigation.
///
/// Built over an already-opened [`SessionStore`]; loading is not the guard's
/// job.
pub struct RouteGuard {
    session: Arc<SessionStore>,
    identity: Arc<dyn IdentityProvider>,
    default_tenant: TenantSlug,
}

impl RouteGuard {
    pub fn new(
        session: Arc<SessionStore>,
        identity: Arc<dyn IdentityProvider>,
        default_tenant: TenantSlug,
    ) -> Self {
        Self {
            session,
            identity,
            default_tenant,
        }
    }

    /// URL parameter, else stored tenant, else the configured default.
    pub fn resolve_tenant(&self, route: &MatchedRoute) -> TenantSlug {
        route
            .tenant()
            .or_else(|| self.session.tenant())
            .unwrap_or_else(|| self.default_tenant.clone())
    }

    /// Evaluate one navigation attempt.
    pub async fn before_each(&self, to: &Location) -> NavigationDecision {
        let route = routes::match_route(to.path());
        let tenant = self.resolve_tenant(&route);

        // Legacy paths are rewritten before any identity work happens.
        if let RouteKind::Legacy(_) = route.kind {
            return decide(&route, to, &tenant, AuthState::default());
        }

        let auth = self.auth_state(&tenant).await;
        let decision = decide(&route, to, &tenant, auth);

        match &decision {
            NavigationDecision::Allow => {
                tracing::debug!(to = %to, tenant = %tenant, "navigation allowed")
            }
            NavigationDecision::Redirect(target) => {
                tracing::debug!(to = %to, redirect = %target, "navigation redirected")
            }
        }
        decision
    }

    /// Follow redirects until a navigation is allowed and return where it
    /// settled.
    pub async fn navigate(&self, to: Location) -> Location {
        let mut current = to;
        for _ in 0..MAX_REDIRECTS {
            match self.before_each(&current).await {
                NavigationDecision::Allow => return current,
                NavigationDecision::Redirect(next) => current = next,
            }
        }
        tracing::warn!(location = %current, "redirect limit reached");
        current
    }

    /// Token presence plus the user's role, fetching the identity at most
    /// once when a token exists but no user is cached.
    async fn auth_state(&self, tenant: &TenantSlug) -> AuthState {
        if self.session.access_token().is_none() {
            return AuthState::default();
        }

        if let Some(user) = self.session.user() {
            return AuthState {
                has_token: true,
                role: Some(user.role),
            };
        }

        match self.identity.fetch_identity(tenant).await {
            Ok(user) => {
                let role = user.role;
                if let Err(err) = self.session.set_user(user) {
                    tracing::warn!(error = %err, "failed to persist fetched identity");
                }
                AuthState {
                    has_token: true,
                    role: Some(role),
                }
            }
            Err(err) => {
                tracing::info!(error = %err, tenant = %tenant, "identity fetch failed; treating as logged out");
                if let Err(err) = self.session.logout() {
                    tracing::warn!(error = %err, "failed to remove persisted session");
                }
                AuthState::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::match_route;

    fn demo() -> TenantSlug {
        TenantSlug::parse("demo").unwrap()
    }

    fn decide_for(path: &str, auth: AuthState) -> NavigationDecision {
        let to = Location::parse(path);
        let route = match_route(to.path());
        decide(&route, &to, &demo(), auth)
    }

    fn redirect(target: &str) -> NavigationDecision {
        NavigationDecision::Redirect(Location::parse(target))
    }

    const GUEST: AuthState = AuthState {
        has_token: false,
        role: None,
    };

    fn as_role(role: Role) -> AuthState {
        AuthState {
            has_token: true,
            role: Some(role),
        }
    }

    #[test]
    fn root_sends_guests_to_login_and_users_home() {
        assert_eq!(decide_for("/", GUEST), redirect("/t/demo/login"));
        assert_eq!(
            decide_for("/", as_role(Role::Cashier)),
            redirect("/t/demo/cashier/scan")
        );
        assert_eq!(
            decide_for("/t/demo", as_role(Role::Admin)),
            redirect("/t/demo/admin/dashboard")
        );
    }

    #[test]
    fn protected_pages_send_guests_to_their_section_login() {
        assert_eq!(
            decide_for("/t/demo/admin/rules", GUEST),
            redirect("/t/demo/admin/login")
        );
        assert_eq!(
            decide_for("/t/demo/cashier/operations", GUEST),
            redirect("/t/demo/cashier/login")
        );
        assert_eq!(decide_for("/t/demo/offers", GUEST), redirect("/t/demo/login"));
    }

    #[test]
    fn guest_only_pages_bounce_authenticated_users() {
        assert_eq!(
            decide_for("/t/demo/login", as_role(Role::Client)),
            redirect("/t/demo/cabinet")
        );
        assert_eq!(
            decide_for("/t/demo/admin/login", as_role(Role::Cashier)),
            redirect("/t/demo/cashier/scan?notice=forbidden")
        );
    }

    #[test]
    fn wrong_role_is_redirected_with_notice() {
        assert_eq!(
            decide_for("/t/demo/admin/dashboard", as_role(Role::Cashier)),
            redirect("/t/demo/cashier/scan?notice=forbidden")
        );
        assert_eq!(
            decide_for("/t/demo/cabinet", as_role(Role::Admin)),
            redirect("/t/demo/admin/dashboard?notice=forbidden")
        );
    }

    #[test]
    fn matching_role_and_public_pages_are_allowed() {
        assert_eq!(
            decide_for("/t/demo/admin/settings", as_role(Role::Admin)),
            NavigationDecision::Allow
        );
        assert_eq!(decide_for("/t/demo/widget", GUEST), NavigationDecision::Allow);
        assert_eq!(decide_for("/somewhere/else", GUEST), NavigationDecision::Allow);
        assert_eq!(decide_for("/t/demo/register", GUEST), NavigationDecision::Allow);
    }

    #[test]
    fn token_with_unknown_role_skips_role_checks() {
        let auth = AuthState {
            has_token: true,
            role: None,
        };
        assert_eq!(decide_for("/t/demo/admin/staff", auth), NavigationDecision::Allow);
        assert_eq!(decide_for("/t/demo/login", auth), redirect("/t/demo/cabinet"));
    }

    #[test]
    fn legacy_paths_gain_the_tenant_prefix() {
        assert_eq!(decide_for("/history", GUEST), redirect("/t/demo/history"));
        assert_eq!(
            decide_for("/qr", as_role(Role::Client)),
            redirect("/t/demo/qr")
        );
    }
}
