//! Demo server: runs migrations, registers the switchables and credentials
//! resources, and serves them. The credentials payload field is encrypted
//! at rest.

use std::sync::Arc;
use switchboard::{
    apply_migrations, common_routes, resource_routes, AppState, FieldCipher, RecordCodec,
    ResourceDescriptor, ResourceSet, Settings, BUILTIN_MIGRATIONS,
};
use axum::Router;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("switchboard=info".parse()?))
        .init();

    let settings = Settings::from_env()?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&settings.database_url)
        .await?;

    // Schema must be complete before any handler is bound.
    apply_migrations(&pool, BUILTIN_MIGRATIONS).await?;
    tracing::info!("migrations applied");

    let resources = ResourceSet::new(vec![
        ResourceDescriptor::new("switchables", "relay_switches"),
        ResourceDescriptor::new("credentials", "credentials").encrypt_field("payload"),
    ])?;

    let cipher = Arc::new(FieldCipher::from_passphrase(&settings.encryption_key));
    let state = AppState {
        pool,
        resources: Arc::new(resources),
        codec: RecordCodec::new(cipher),
    };

    let app = Router::new()
        .merge(common_routes(state.clone()))
        .merge(resource_routes(state));

    let listener = TcpListener::bind(("0.0.0.0", settings.port)).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
