use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lms_core::config::{core_config_from_env_value, rest_addr_from_env_value};
use lms_core::constants::{API_BASE_URL_ENV, REST_ADDR_ENV};

/// Main entry point for the LMS service
///
/// Resolves configuration once from the environment (and `.env`, if present), then serves
/// the REST API until the process is stopped.
///
/// # Environment Variables
/// - `LMS_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `LMS_API_BASE_URL`: origin prefixed onto root-relative image URLs (optional)
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - `LMS_API_BASE_URL` is set but is not a valid http(s) origin,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lms_run=info".parse()?)
                .add_directive("lms_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = core_config_from_env_value(std::env::var(API_BASE_URL_ENV).ok())?;
    let addr = rest_addr_from_env_value(std::env::var(REST_ADDR_ENV).ok());

    match cfg.api_base_url() {
        Some(base) => tracing::info!("++ Image base URL {}", base),
        None => tracing::info!("++ No image base URL configured; relative image paths pass through"),
    }
    tracing::info!("++ Starting LMS REST on {}", addr);

    let app = api_rest::router(&cfg);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
