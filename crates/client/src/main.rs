use std::path::PathBuf;
use std::sync::Arc;

use busline_core::PollingCoordinator;
use busline_transit::{RouteKey, StopIdentifier};
use clap::Parser;
use eyre::WrapErr;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::feed::HttpFeed;
use crate::settings::ClientConfig;
use crate::surface::HeadlessSurface;

mod feed;
mod settings;
mod surface;

/// Follow a live bus fleet and log every frame a map would draw.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// TOML configuration file; BUSLINE_* environment variables override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base url of the fleet feeds, overriding the configured one
    #[arg(long)]
    api_base: Option<String>,

    /// Route to select at startup (e.g. "EE")
    #[arg(short, long)]
    route: Option<String>,

    /// Stop whose arrival estimates to fetch at startup; repeatable
    #[arg(short, long = "stop")]
    stops: Vec<String>,
}

fn setup_logging(default_filter: &str) -> eyre::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter)
            .wrap_err_with(|| format!("invalid log filter '{default_filter}'"))?,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .init();
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> eyre::Result<()> {
    let args = Args::parse();

    let mut config = ClientConfig::load(args.config.as_deref())?;
    if let Some(api_base) = args.api_base {
        config.api_base = api_base;
        config.validate()?;
    }
    setup_logging(&config.log_filter)?;

    let feed = HttpFeed::new(config.api_base_url()?, config.request_timeout())?;
    info!(api_base = %config.api_base, "connecting to fleet feeds");

    let handle = PollingCoordinator::new(Arc::new(feed), config.engine.clone()).start();
    if let Some(route) = &args.route {
        handle.toggle_route(RouteKey::normalize(route));
    }
    for stop in &args.stops {
        handle.select_stop(StopIdentifier::new(stop));
    }

    let mut surface = HeadlessSurface::new();
    let mut frames = handle.frames();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            changed = frames.changed() => {
                if changed.is_err() {
                    break;
                }
                let frame = Arc::clone(&*frames.borrow_and_update());
                surface.draw(&frame);
            }
            signal = &mut shutdown => {
                signal.wrap_err("listening for ctrl-c")?;
                info!("interrupted, shutting down");
                break;
            }
        }
    }

    if let Some(state) = handle.stop().await {
        info!(
            poll_cycles = state.poll_cycle(),
            vehicles = state.vehicles().len(),
            "stopped"
        );
    }
    Ok(())
}
