//! Runs a lanmsg server.
//!
//! ```text
//! lanmsg-server [bind-addr]
//! ```
//!
//! Settings come from the JSON file named by `LANMSG_CONFIG`, if set; a
//! bind address on the command line overrides the one in the file. Log
//! verbosity follows `RUST_LOG` (default `info`).

use lanmsg::prelude::*;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = match std::env::var_os("LANMSG_CONFIG") {
        Some(path) => ServerConfig::from_file(path)?,
        None => ServerConfig::default(),
    };
    if let Some(addr) = std::env::args().nth(1) {
        if addr == "-h" || addr == "--help" {
            eprintln!("usage: lanmsg-server [bind-addr]   (default {})", config.bind_addr);
            return Ok(());
        }
        config.bind_addr = addr;
    }

    let server = ChatServer::builder().config(config).build().await?;
    tracing::info!(addr = %server.local_addr()?, "accepting clients, Ctrl-C to stop");

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "cannot listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await?;
    Ok(())
}
