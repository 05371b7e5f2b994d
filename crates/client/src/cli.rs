use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use reqwest::Method;
use serde_json::Value;

use loyalty_client::routes::Location;
use loyalty_client::{AppState, ClientConfig, Credentials, FileStorage, RequestOptions};
use loyalty_core::TenantSlug;
use loyalty_observability::LogFormat;
use loyalty_widget::EmbedConfig;

#[derive(Parser)]
#[command(name = "loyalty")]
#[command(author, version, about = "Loyalty client: session, API and navigation tools")]
pub struct Cli {
    /// Log line format
    #[arg(long = "log-format", value_enum, default_value = "pretty", global = true)]
    pub log_format: LogFormatArg,

    /// API base URL (overrides LOYALTY_API_BASE)
    #[arg(long, global = true)]
    api_base: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Json,
    Pretty,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Json => LogFormat::Json,
            LogFormatArg::Pretty => LogFormat::Pretty,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Log in and persist the session
    Login {
        /// Tenant slug (defaults to the stored or configured tenant)
        #[arg(short, long)]
        tenant: Option<String>,

        #[arg(short, long, env = "LOYALTY_EMAIL")]
        email: String,

        #[arg(short, long, env = "LOYALTY_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Clear the persisted session
    Logout,
    /// Show the current user, fetching it from the server
    Whoami {
        #[arg(short, long)]
        tenant: Option<String>,
    },
    /// Run the route guard and print where a navigation ends up
    Navigate {
        /// Target path, e.g. `/t/demo/admin/dashboard`
        path: String,
    },
    /// Send an API request with the stored session
    Request {
        /// HTTP method
        method: String,
        /// Path relative to the API base
        path: String,
        /// JSON request body
        #[arg(short, long)]
        body: Option<String>,
    },
    /// Print embed markup for a merchant site
    Widget {
        #[arg(short, long)]
        tenant: Option<String>,

        #[arg(long)]
        host: Option<String>,

        #[arg(short, long, default_value = "iframe")]
        mode: String,

        /// Print the rendered markup instead of the script tag
        #[arg(long)]
        render: bool,
    },
    /// Check that the API answers its health check
    Status,
}

pub async fn run(cli: Cli) -> Result<()> {
    let mut config = ClientConfig::from_env();
    if let Some(base) = cli.api_base {
        config = config.with_api_base(base);
    }

    match cli.command {
        Command::Login {
            tenant,
            email,
            password,
        } => {
            let app = open_app(config)?;
            let tenant = pick_tenant(&app, tenant.as_deref())?;
            let user = app
                .api
                .login(&tenant, &Credentials { email, password })
                .await
                .context("login failed")?;
            println!("logged in as {} ({}) on {tenant}", user.display_name(), user.role);
        }
        Command::Logout => {
            let app = open_app(config)?;
            app.session.logout().context("failed to clear session")?;
            println!("logged out");
        }
        Command::Whoami { tenant } => {
            let app = open_app(config)?;
            if !app.session.is_authenticated() {
                return Err(anyhow!("not logged in"));
            }
            let tenant = pick_tenant(&app, tenant.as_deref())?;
            let user = app
                .api
                .fetch_identity(&tenant)
                .await
                .context("failed to fetch identity")?;
            app.session
                .set_user(user.clone())
                .context("failed to persist identity")?;
            println!("{}", serde_json::to_string_pretty(&user)?);
        }
        Command::Navigate { path } => {
            let app = open_app(config)?;
            let settled = app.guard.navigate(Location::parse(&path)).await;
            println!("{settled}");
        }
        Command::Request { method, path, body } => {
            let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
                .with_context(|| format!("invalid HTTP method {method:?}"))?;
            let mut options = RequestOptions::new(method);
            if let Some(raw) = body {
                let body: Value =
                    serde_json::from_str(&raw).context("request body is not valid JSON")?;
                options = options.with_body(body);
            }
            let app = open_app(config)?;
            let response = app
                .api
                .request(&path, options)
                .await
                .with_context(|| format!("request to {path} failed"))?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::Widget {
            tenant,
            host,
            mode,
            render,
        } => print_widget(tenant.as_deref(), host.as_deref(), &mode, render)?,
        Command::Status => {
            let app = open_app(config)?;
            let online = app.api.health().await;
            println!("{}: {}", app.api.base_url(), if online { "online" } else { "offline" });
            if !online {
                return Err(anyhow!("API is not reachable"));
            }
        }
    }
    Ok(())
}

/// Load the persisted session from the data directory.
fn open_app(config: ClientConfig) -> Result<AppState> {
    let dir = match &config.data_dir {
        Some(dir) => dir.clone(),
        None => FileStorage::default_dir().context("failed to locate a data directory")?,
    };
    tracing::debug!(dir = %dir.display(), "using file storage");
    Ok(AppState::open(config, Arc::new(FileStorage::new(dir))))
}

/// Explicit flag, else stored tenant, else configured default.
fn pick_tenant(app: &AppState, explicit: Option<&str>) -> Result<TenantSlug> {
    match explicit {
        Some(raw) => TenantSlug::parse(raw).context("invalid tenant"),
        None => Ok(app
            .session
            .tenant()
            .unwrap_or_else(|| app.config.default_tenant.clone())),
    }
}

fn print_widget(tenant: Option<&str>, host: Option<&str>, mode: &str, render: bool) -> Result<()> {
    let mut attrs = vec![(loyalty_widget::embed::ATTR_MODE, mode)];
    if let Some(tenant) = tenant {
        attrs.push((loyalty_widget::embed::ATTR_TENANT, tenant));
    }
    if let Some(host) = host {
        attrs.push((loyalty_widget::embed::ATTR_HOST, host));
    }
    let config = EmbedConfig::from_attributes(attrs).context("invalid widget settings")?;

    let html = if render {
        loyalty_widget::render(&config)
    } else {
        loyalty_widget::script_tag(&config)
    }
    .context("failed to render widget")?;
    println!("{html}");
    Ok(())
}
