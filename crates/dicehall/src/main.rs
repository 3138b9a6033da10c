use dicehall::{DicehallError, DicehallServerBuilder, ServerConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), DicehallError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::load();
    config.validate()?;
    tracing::info!(
        addr = %config.listen_addr,
        mode = ?config.room.mode,
        betting_window_secs = config.room.betting_window_secs,
        "dicehall starting"
    );

    let server = DicehallServerBuilder::from_config(&config).build().await?;

    tokio::select! {
        result = server.run() => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
            Ok(())
        }
    }
}
