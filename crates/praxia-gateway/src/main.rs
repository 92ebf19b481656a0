//! Gateway entry point

use praxia_gateway::{serve, AppState};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let state = Arc::new(AppState::default());

    serve(bind_addr.parse()?, state).await?;
    Ok(())
}
