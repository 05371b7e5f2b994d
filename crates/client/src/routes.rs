//! Route table and URL helpers.
//!
//! Every tenant-scoped page lives under `/t/:tenant/...`, split into three
//! sections (client, cashier, admin). Legacy un-prefixed paths still resolve
//! and are rewritten onto the tenant prefix.

use loyalty_auth::Role;
use loyalty_core::TenantSlug;

/// Query marker attached when a user is bounced off a page for their role.
pub const NOTICE_PARAM: &str = "notice";
pub const NOTICE_FORBIDDEN: &str = "forbidden";

/// Top-level area of the app, each with its own layout and login page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Client,
    Cashier,
    Admin,
}

impl Section {
    /// Role a section's pages are meant for.
    pub fn role(self) -> Role {
        match self {
            Section::Client => Role::Client,
            Section::Cashier => Role::Cashier,
            Section::Admin => Role::Admin,
        }
    }

    /// Infer the section from a raw URL path by substring.
    pub fn from_path(path: &str) -> Self {
        if path.contains("/cashier") {
            Section::Cashier
        } else if path.contains("/admin") {
            Section::Admin
        } else {
            Section::Client
        }
    }

    pub fn login_path(self, tenant: &TenantSlug) -> String {
        match self {
            Section::Client => format!("/t/{tenant}/login"),
            Section::Cashier => format!("/t/{tenant}/cashier/login"),
            Section::Admin => format!("/t/{tenant}/admin/login"),
        }
    }
}

/// Landing page for a role: admin dashboard, cashier scan screen, or the
/// client cabinet for everything else (including an unknown role).
pub fn role_default_path(role: Option<Role>, tenant: &TenantSlug) -> String {
    match role {
        Some(Role::Admin) => format!("/t/{tenant}/admin/dashboard"),
        Some(Role::Cashier) => format!("/t/{tenant}/cashier/scan"),
        _ => format!("/t/{tenant}/cabinet"),
    }
}

/// Login page for whichever section `path` looks like it belongs to.
pub fn section_login_path(path: &str, tenant: &TenantSlug) -> String {
    Section::from_path(path).login_path(tenant)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    GuestOnly,
    RequiresAuth,
}

const CLIENT_PAGES: &[(&str, Access)] = &[
    ("login", Access::GuestOnly),
    ("register", Access::GuestOnly),
    ("cabinet", Access::RequiresAuth),
    ("qr", Access::RequiresAuth),
    ("offers", Access::RequiresAuth),
    ("history", Access::RequiresAuth),
    ("profile", Access::RequiresAuth),
];

const CASHIER_PAGES: &[(&str, Access)] = &[
    ("login", Access::GuestOnly),
    ("scan", Access::RequiresAuth),
    ("operations", Access::RequiresAuth),
];

const ADMIN_PAGES: &[(&str, Access)] = &[
    ("login", Access::GuestOnly),
    ("dashboard", Access::RequiresAuth),
    ("customers", Access::RequiresAuth),
    ("staff", Access::RequiresAuth),
    ("locations", Access::RequiresAuth),
    ("rules", Access::RequiresAuth),
    ("operations", Access::RequiresAuth),
    ("offers", Access::RequiresAuth),
    ("settings", Access::RequiresAuth),
];

/// Un-prefixed paths kept for old bookmarks; each maps to `/t/{tenant}/{name}`.
const LEGACY_PAGES: &[&str] = &[
    "login", "register", "cabinet", "offers", "history", "profile", "qr",
];

/// Access rules a route declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RouteMeta {
    pub requires_auth: bool,
    pub guest_only: bool,
    pub role: Option<Role>,
}

impl RouteMeta {
    fn for_page(section: Section, access: Access) -> Self {
        Self {
            requires_auth: access == Access::RequiresAuth,
            guest_only: access == Access::GuestOnly,
            role: Some(section.role()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteKind {
    /// `/`
    Root,
    /// `/login`, `/cabinet`, ... (no tenant prefix).
    Legacy(&'static str),
    /// `/t/:tenant`
    TenantIndex,
    /// `/t/:tenant/widget`: public, embeddable.
    Widget,
    /// A page inside one of the three sections.
    Page {
        section: Section,
        name: &'static str,
        meta: RouteMeta,
    },
    /// Anything the table does not know; passed through untouched.
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedRoute {
    pub kind: RouteKind,
    /// Raw `:tenant` path parameter, if the path had one.
    pub tenant_param: Option<String>,
}

impl MatchedRoute {
    pub fn meta(&self) -> RouteMeta {
        match &self.kind {
            RouteKind::Page { meta, .. } => *meta,
            _ => RouteMeta::default(),
        }
    }

    /// The `:tenant` parameter, when present and a valid slug.
    pub fn tenant(&self) -> Option<TenantSlug> {
        self.tenant_param
            .as_deref()
            .and_then(|raw| TenantSlug::parse(raw).ok())
    }
}

fn lookup_page(table: &[(&'static str, Access)], name: &str) -> Option<(&'static str, Access)> {
    table.iter().copied().find(|(page, _)| *page == name)
}

/// Resolve a path (without query string) against the route table.
pub fn match_route(path: &str) -> MatchedRoute {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let page = |section: Section, table: &[(&'static str, Access)], name: &str| {
        lookup_page(table, name).map(|(name, access)| RouteKind::Page {
            section,
            name,
            meta: RouteMeta::for_page(section, access),
        })
    };

    let (kind, tenant_param) = match segments.as_slice() {
        [] => (RouteKind::Root, None),
        [name] => {
            let kind = LEGACY_PAGES
                .iter()
                .find(|legacy| *legacy == name)
                .map(|legacy| RouteKind::Legacy(*legacy))
                .unwrap_or(RouteKind::Unknown);
            (kind, None)
        }
        ["t", tenant] => (RouteKind::TenantIndex, Some(*tenant)),
        ["t", tenant, "widget"] => (RouteKind::Widget, Some(*tenant)),
        ["t", tenant, "cashier", name] => (
            page(Section::Cashier, CASHIER_PAGES, name).unwrap_or(RouteKind::Unknown),
            Some(*tenant),
        ),
        ["t", tenant, "admin", name] => (
            page(Section::Admin, ADMIN_PAGES, name).unwrap_or(RouteKind::Unknown),
            Some(*tenant),
        ),
        ["t", tenant, name] => (
            page(Section::Client, CLIENT_PAGES, name).unwrap_or(RouteKind::Unknown),
            Some(*tenant),
        ),
        ["t", tenant, ..] => (RouteKind::Unknown, Some(*tenant)),
        _ => (RouteKind::Unknown, None),
    };

    MatchedRoute {
        kind,
        tenant_param: tenant_param.map(str::to_string),
    }
}

/// A navigation target: path plus query pairs (kept raw, not decoded).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    path: String,
    query: Vec<(String, String)>,
}

impl Location {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            path: if path.is_empty() { "/".to_string() } else { path },
            query: Vec::new(),
        }
    }

    /// Split `"/path?a=1&b"` into path and query pairs.
    pub fn parse(raw: &str) -> Self {
        let (path, query) = match raw.split_once('?') {
            Some((path, query)) => (path, query),
            None => (raw, ""),
        };
        let query = query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| match pair.split_once('=') {
                Some((k, v)) => (k.to_string(), v.to_string()),
                None => (pair.to_string(), String::new()),
            })
            .collect();

        Self {
            query,
            ..Self::new(path)
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Redirect target carrying the forbidden notice.
    pub fn forbidden(path: impl Into<String>) -> Self {
        Self::new(path).with_query(NOTICE_PARAM, NOTICE_FORBIDDEN)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_root(&self) -> bool {
        self.path == "/"
    }
}

impl core::fmt::Display for Location {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.path)?;
        for (i, (k, v)) in self.query.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            if v.is_empty() {
                write!(f, "{sep}{k}")?;
            } else {
                write!(f, "{sep}{k}={v}")?;
            }
        }
        Ok(())
    }
}

impl From<&str> for Location {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}
