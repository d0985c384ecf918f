//! services/api/src/bin/api.rs

use api_lib::{
    adapters::GeminiAdapter,
    config::Config,
    error::ApiError,
    web::{router, state::AppState},
};
use cognipath_core::{ModelSettings, Tutor};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Initialize the Generation Adapter ---
    let generator = Arc::new(GeminiAdapter::connect(
        &config.gemini_api_key,
        &config.gemini_api_base,
    ));
    info!(
        reasoning_model = %config.reasoning_model,
        chat_model = %config.chat_model,
        "Generation client ready"
    );

    // --- 3. Build the Shared AppState ---
    let tutor = Tutor::new(
        generator,
        ModelSettings {
            reasoning_model: config.reasoning_model.clone(),
            chat_model: config.chat_model.clone(),
        },
        config.generation_timeout,
    );
    let app_state = Arc::new(AppState {
        config: config.clone(),
        tutor,
    });

    // --- 4. Create the Web Router ---
    let app = router(app_state);

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
