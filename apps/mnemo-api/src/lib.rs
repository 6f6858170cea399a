pub mod routes;
pub mod state;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

#[derive(Debug, Parser)]
#[command(version, about = "Session-scoped memory store over authenticated HTTP.")]
pub struct Args {}

pub async fn run(_args: Args) -> color_eyre::Result<()> {
	let config = mnemo_config::load()?;

	init_tracing(&config);

	// A bind failure is fatal; there is no retry on another port.
	let listen_addr = config.listen_addr()?;
	let state = AppState::new(config).await;
	let app = routes::router(state.clone());
	let listener = TcpListener::bind(listen_addr).await?;

	tracing::info!(
		%listen_addr,
		driver = state.service.driver_kind(),
		dual_write = state.service.dual_write(),
		"Memory HTTP server listening.",
	);

	axum::serve(listener, app).await?;

	Ok(())
}

fn init_tracing(config: &mnemo_config::Config) {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).init();
}
