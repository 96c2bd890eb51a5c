//! Smart Home Skill Lambda - Handles Alexa smart home directives.
//!
//! Answers authorization, discovery and power control directives. Power state
//! is written to the device table configured through the environment.

use std::sync::Arc;

use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde_json::Value;
use shared::{Config, DynamoDbDeviceStore, SmartHomeHandler};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

type Handler = SmartHomeHandler<DynamoDbDeviceStore>;

async fn build_handler() -> Result<Handler, Error> {
    let config = Config::from_env()?;

    let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(config.aws_region.clone()))
        .load()
        .await;
    let client = aws_sdk_dynamodb::Client::new(&aws_config);

    info!(
        "Using device table {} (key {}) in {}",
        config.table_name, config.table_key, config.aws_region
    );

    Ok(SmartHomeHandler::with_config(
        DynamoDbDeviceStore::new(client, &config),
        &config,
    ))
}

async fn handler(state: Arc<Handler>, event: LambdaEvent<Value>) -> Result<Value, Error> {
    let (payload, _context) = event.into_parts();

    // No response document is returned for a failed directive
    state.handle_value(payload).await.map_err(|e| {
        error!("Failed to handle directive: {}", e);
        Error::from(e)
    })
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let state = Arc::new(build_handler().await?);

    run(service_fn(move |event| {
        let state = Arc::clone(&state);
        async move { handler(state, event).await }
    }))
    .await
}
