use axum::{middleware, routing::get, Extension, Router};
use axum_embed::ServeEmbed;
use clap::Parser;
use common::{auth::auth_middleware, AppState, Config};
use database::Database;
use rust_embed::RustEmbed;
use std::{sync::Arc, time::Duration};
use tower_http::trace::TraceLayer;
use tower_sessions::{MemoryStore, SessionManagerLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod handlers;

#[derive(RustEmbed, Clone)]
#[folder = "public/"]
struct Assets;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Environment and logging
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Load Config from CLI args / env
    let config = Config::parse();

    // 3. Initialize Database
    let db = Database::new(&config.database_url).await?;
    db.run_migrations().await?;

    let state = Arc::new(AppState {
        db,
        config: config.clone(),
    });

    // 4. Session store and category cache
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(false); // Set to true in production with HTTPS
    let category_cache = Arc::new(categories::category_cache(Duration::from_secs(config.cache_ttl_secs)));

    // 5. Routing
    let protected_routes = Router::<Arc<AppState>>::new()
        .route("/", get(handlers::auth::root_redirect))
        .nest("/transactions", transactions::handler::transactions_router(state.clone()))
        .nest("/categories", categories::handler::categories_router(state.clone()))
        .nest("/savings", savings::handler::savings_router(state.clone()))
        .nest("/reports", reports::handler::reports_router(state.clone()))
        .layer(Extension(category_cache))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let app = Router::<Arc<AppState>>::new()
        .route("/login", get(handlers::auth::login_get).post(handlers::auth::login_post))
        .route("/logout", get(handlers::auth::logout))
        .nest_service("/public", ServeEmbed::<Assets>::new())
        .merge(protected_routes)
        .with_state(state)
        .layer(session_layer)
        .layer(TraceLayer::new_for_http());

    // 6. Start Server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);
    if config.app_password.is_none() {
        tracing::warn!("APP_PASSWORD is not set! Authentication is DISABLED and all data belongs to the default user.");
    }
    axum::serve(listener, app).await?;

    Ok(())
}
