use teren_server::{Config, Server, ServerState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment (dotenv, work dir, logging)
    dotenv::dotenv().ok();

    let config = Config::from_env();
    config.ensure_work_dir_structure()?;

    let logs_dir = config.logs_dir();
    teren_server::init_logger_with_file(None, logs_dir.to_str());

    tracing::info!(
        environment = %config.environment,
        timezone = %config.timezone,
        "Teren server starting..."
    );

    // 2. Initialize server state
    let state = ServerState::initialize(&config).await?;

    // 3. Run the HTTP server
    let server = Server::with_state(config, state);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
