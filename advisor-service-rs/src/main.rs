// advisor-service-rs/src/main.rs
// Main Entry Point for the plant advisor HTTP service

use std::sync::Arc;

use advisor_service::settings::AdvisorSettings;
use advisor_service::{build_router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    config_rs::load_dotenv();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = AdvisorSettings::from_env()?;
    log::info!("Advisor variant: {}", settings.schema);

    // Classifier load/fit failures abort here, before the listener is bound
    let state = Arc::new(AppState::from_settings(&settings)?);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.bind_addr).await?;
    log::info!("Advisor service starting on {}", settings.bind_addr);
    println!("Advisor service listening on {}", settings.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
