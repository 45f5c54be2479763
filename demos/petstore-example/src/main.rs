#![allow(missing_docs)]
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};

use petstore_example::{AppState, serve};

const USAGE: &str = "petstore-example [--listen <addr>] [--pets <fixture.json>]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().pretty().init();

    let ServeArgs { listen, pets } = ServeArgs::from_env().context(USAGE)?;

    let state = match pets {
        Some(path) => {
            info!(path = %path.display(), "seeding pets");
            let fixture = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;
            AppState::from_fixture(&fixture)?
        }
        None => AppState::bundled()?,
    };

    let listener = TcpListener::bind(listen)
        .await
        .with_context(|| format!("binding {listen}"))?;
    serve(listener, state).await
}

/// Command line of the petstore server.
#[derive(Debug)]
struct ServeArgs {
    listen: SocketAddr,
    pets: Option<PathBuf>,
}

impl ServeArgs {
    fn from_env() -> anyhow::Result<Self> {
        let mut args = pico_args::Arguments::from_env();
        let listen = args
            .opt_value_from_str("--listen")?
            .unwrap_or(SocketAddr::from((Ipv4Addr::LOCALHOST, 8080)));
        let pets = args.opt_value_from_str("--pets")?;

        let unused = args.finish();
        if !unused.is_empty() {
            warn!(?unused, "ignoring arguments");
        }
        Ok(Self { listen, pets })
    }
}
