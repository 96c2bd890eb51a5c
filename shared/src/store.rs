//! Device state store.
//!
//! Each device is one record keyed by its endpoint id. The skill only ever
//! writes a single attribute and never reads it back.

use std::collections::HashMap;
use std::future::Future;

use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use aws_sdk_dynamodb::Client as DynamoDbClient;
use tokio::sync::RwLock;
use tracing::{debug, error};

use crate::{Config, Error, Result};

/// Write access to per-device state.
pub trait DeviceStore: Send + Sync {
    /// Set `attribute_name` to `value` on the record for `endpoint_id`.
    fn update_device_attribute(
        &self,
        endpoint_id: &str,
        attribute_name: &str,
        value: &str,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Device store backed by a DynamoDB table.
pub struct DynamoDbDeviceStore {
    client: DynamoDbClient,
    table_name: String,
    table_key: String,
}

impl DynamoDbDeviceStore {
    /// Create a store using the table settings from `config`.
    pub fn new(client: DynamoDbClient, config: &Config) -> Self {
        Self {
            client,
            table_name: config.table_name.clone(),
            table_key: config.table_key.clone(),
        }
    }
}

impl DeviceStore for DynamoDbDeviceStore {
    async fn update_device_attribute(
        &self,
        endpoint_id: &str,
        attribute_name: &str,
        value: &str,
    ) -> Result<()> {
        let output = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key(&self.table_key, AttributeValue::S(endpoint_id.to_string()))
            .update_expression("set #v = :val1")
            .expression_attribute_names("#v", attribute_name)
            .expression_attribute_values(":val1", AttributeValue::S(value.to_string()))
            .return_values(ReturnValue::AllNew)
            .send()
            .await
            .map_err(|e| {
                error!("DynamoDB update of {} failed: {}", endpoint_id, e);
                Error::DeviceStore(format!("Failed to update {}: {}", endpoint_id, e))
            })?;

        debug!(
            "Updated {} on {} in {}: {:?}",
            attribute_name,
            endpoint_id,
            self.table_name,
            output.attributes()
        );
        Ok(())
    }
}

/// In-process device store, used for tests and local runs.
#[derive(Default)]
pub struct MemoryDeviceStore {
    records: RwLock<HashMap<String, HashMap<String, String>>>,
}

impl MemoryDeviceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read back an attribute.
    pub async fn attribute(&self, endpoint_id: &str, attribute_name: &str) -> Option<String> {
        let records = self.records.read().await;
        records
            .get(endpoint_id)
            .and_then(|record| record.get(attribute_name))
            .cloned()
    }
}

impl DeviceStore for MemoryDeviceStore {
    async fn update_device_attribute(
        &self,
        endpoint_id: &str,
        attribute_name: &str,
        value: &str,
    ) -> Result<()> {
        let mut records = self.records.write().await;
        records
            .entry(endpoint_id.to_string())
            .or_default()
            .insert(attribute_name.to_string(), value.to_string());
        Ok(())
    }
}
