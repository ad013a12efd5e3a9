use axum::http::HeaderName;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use trailer_taste::{
    api::{create_router, AppState},
    config::Config,
    services::{load_catalogue, Catalogue, JsonFileCatalogue},
};

/// HTTP header carrying the request correlation id
const REQUEST_ID_HEADER: &str = "x-request-id";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trailer_taste=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    // Load the startup catalogue, if one is configured
    let catalogue = match &config.catalogue_path {
        Some(path) => load_catalogue(&JsonFileCatalogue::new(path)).await?,
        None => {
            tracing::warn!("CATALOGUE_PATH not set, starting with an empty catalogue");
            Catalogue::default()
        }
    };

    let state = AppState::new(catalogue, config.engine(), config.rng_seed);

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
    let app = create_router(state).layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::new(request_id))
            .layer(CorsLayer::permissive()),
    );

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}
