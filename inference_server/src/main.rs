use anyhow::Result;
use data_ingestion::logger::init_logger;
use inference_server::config::ServerConfig;
use inference_server::engine::InferenceEngine;
use inference_server::server::Server;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_logger();

    let config = ServerConfig::from_env()?;
    let server = Server::init(config, InferenceEngine::default());

    server.run().await?;

    info!("Server has been shut down gracefully");

    Ok(())
}
