use yiqi::{
    core::{config::YiqiConfig, init},
    server::{self, AppState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = YiqiConfig::from_env()?;

    let http_client = init::initialize_http_client()?;
    let generator = init::initialize_gemini(&config, http_client.clone())?;
    let market = init::initialize_market_data(&config, http_client);

    let app = server::router(AppState { generator, market });

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    log::info!("Starting server on {}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
