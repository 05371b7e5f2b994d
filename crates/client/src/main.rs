//! `loyalty`: command-line driver for the loyalty client core.
//!
//! # Usage
//!
//! ```bash
//! # Log in as a cashier of the "bakery" tenant
//! loyalty login --tenant bakery --email cashier@bakery.test
//!
//! # Where would the app land for this path?
//! loyalty navigate /t/bakery/admin/dashboard
//!
//! # Raw authenticated call
//! loyalty request GET /bakery/auth/me
//!
//! # Embed snippet for a merchant site
//! loyalty widget --tenant bakery --mode modal
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

#[cfg(not(target_arch = "wasm32"))]
mod cli;

#[cfg(not(target_arch = "wasm32"))]
#[tokio::main]
async fn main() {
    use clap::Parser;

    let args = cli::Cli::parse();
    loyalty_observability::init_with(args.log_format.into());

    if let Err(err) = cli::run(args).await {
        tracing::error!("command failed: {err:#}");
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

// The browser build is driven by the host page, not a binary.
#[cfg(target_arch = "wasm32")]
fn main() {}
