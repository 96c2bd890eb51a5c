//! Smart home response envelope builder.
//!
//! An [`AlexaResponse`] is created once per directive, mutated through the
//! `add_*`/`set_*` methods and serialized once. The `messageId` is fixed at
//! construction so repeated serialization yields identical documents.

use std::collections::BTreeMap;
use std::fmt;

use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{Error, Result};

/// Placeholder used for any identifier the caller left empty.
pub const INVALID: &str = "INVALID";

const PAYLOAD_VERSION: &str = "3";
const DEFAULT_NAMESPACE: &str = "Alexa";
const DEFAULT_NAME: &str = "Response";
const SCOPE_TYPE: &str = "BearerToken";

const DEFAULT_FRIENDLY_NAME: &str = "Sample Endpoint";
const ENDPOINT_DESCRIPTION: &str = "Sample Endpoint Description";
const MANUFACTURER_NAME: &str = "Sample Manufacturer";
const DISPLAY_CATEGORY: &str = "OTHER";

fn check_value(value: &str, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

/// Response document returned to the smart home service.
#[derive(Debug, Clone, Serialize)]
pub struct AlexaResponse {
    event: Event,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<Context>,
}

#[derive(Debug, Clone, Serialize)]
struct Event {
    header: Header,
    endpoint: ResponseEndpoint,
    payload: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct Header {
    namespace: String,
    name: String,
    message_id: String,
    payload_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    correlation_token: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResponseEndpoint {
    scope: Scope,
    endpoint_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    cookie: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Serialize)]
struct Scope {
    #[serde(rename = "type")]
    scope_type: String,
    token: String,
}

#[derive(Debug, Clone, Serialize)]
struct Context {
    properties: Vec<ContextProperty>,
}

/// Reported state of one property, attached under `context.properties`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextProperty {
    pub namespace: String,
    pub name: String,
    pub value: PropertyValue,
    /// UTC sample time, `yyyy-MM-ddTHH:mm:ss.SSSZ`
    pub time_of_sample: String,
    pub uncertainty_in_milliseconds: u32,
}

impl ContextProperty {
    /// Create a property sampled now.
    pub fn new(namespace: &str, name: &str, value: PropertyValue, uncertainty_ms: u32) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
            value,
            time_of_sample: Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            uncertainty_in_milliseconds: uncertainty_ms,
        }
    }
}

/// Value of a context property: either a plain state string or a composite
/// state document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Scalar(String),
    Structured(Value),
}

impl PropertyValue {
    /// Interpret text as a structured value if it is a JSON object, otherwise
    /// keep it as a scalar.
    ///
    /// Only objects are promoted, so states such as `"42"`, `"true"` or
    /// `"null"` stay strings.
    pub fn from_text(text: &str) -> Self {
        match serde_json::from_str::<Value>(text) {
            Ok(value @ Value::Object(_)) => PropertyValue::Structured(value),
            _ => PropertyValue::Scalar(text.to_string()),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Scalar(value.to_string())
    }
}

/// Interface an endpoint declares during discovery.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Capability {
    #[serde(rename = "type")]
    pub capability_type: String,
    pub interface: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Value>,
}

impl Capability {
    /// Create a capability.
    pub fn new(capability_type: &str, interface: &str, version: &str, properties: Option<Value>) -> Self {
        Self {
            capability_type: capability_type.to_string(),
            interface: interface.to_string(),
            version: version.to_string(),
            properties,
        }
    }

    /// Create an `AlexaInterface` capability at payload version 3.
    pub fn alexa_interface(interface: &str, properties: Option<Value>) -> Self {
        Self::new("AlexaInterface", interface, PAYLOAD_VERSION, properties)
    }

    /// Create a capability whose properties are given as JSON text.
    ///
    /// The properties must be a JSON object.
    pub fn from_json(
        capability_type: &str,
        interface: &str,
        version: &str,
        properties_json: Option<&str>,
    ) -> Result<Self> {
        let properties = properties_json.map(parse_object).transpose()?;
        Ok(Self::new(capability_type, interface, version, properties))
    }

    /// Parse a JSON array of capability objects.
    ///
    /// Each object is kept as given, including fields such as `instance` or
    /// `configuration` that this type does not model.
    pub fn parse_list(capabilities_json: &str) -> Result<Vec<Value>> {
        let capabilities: Vec<Value> = serde_json::from_str(capabilities_json)
            .map_err(|e| Error::MalformedCapabilities(e.to_string()))?;
        if let Some(other) = capabilities.iter().find(|c| !c.is_object()) {
            return Err(Error::MalformedCapabilities(format!(
                "expected a capability object, got {}",
                other
            )));
        }
        Ok(capabilities)
    }
}

impl From<Capability> for Value {
    fn from(capability: Capability) -> Self {
        let mut map = Map::new();
        map.insert("type".to_string(), Value::String(capability.capability_type));
        map.insert("interface".to_string(), Value::String(capability.interface));
        map.insert("version".to_string(), Value::String(capability.version));
        if let Some(properties) = capability.properties {
            map.insert("properties".to_string(), properties);
        }
        Value::Object(map)
    }
}

/// Endpoint entry in a `Discover.Response` payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointDescriptor {
    pub capabilities: Vec<Value>,
    pub description: String,
    pub display_categories: Vec<String>,
    pub manufacturer_name: String,
    pub endpoint_id: String,
    pub friendly_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookie: Option<BTreeMap<String, String>>,
}

impl EndpointDescriptor {
    /// Create a descriptor, generating a name and id where none is given.
    pub fn new(friendly_name: Option<&str>, endpoint_id: Option<&str>, capabilities: Vec<Value>) -> Self {
        Self {
            capabilities,
            description: ENDPOINT_DESCRIPTION.to_string(),
            display_categories: vec![DISPLAY_CATEGORY.to_string()],
            manufacturer_name: MANUFACTURER_NAME.to_string(),
            endpoint_id: endpoint_id.map_or_else(generate_endpoint_id, str::to_string),
            friendly_name: friendly_name.unwrap_or(DEFAULT_FRIENDLY_NAME).to_string(),
            cookie: None,
        }
    }

    /// Attach a cookie entry to the descriptor.
    pub fn with_cookie(mut self, key: &str, value: &str) -> Self {
        self.cookie
            .get_or_insert_with(BTreeMap::new)
            .insert(key.to_string(), value.to_string());
        self
    }
}

/// `endpoint_` followed by a six digit number.
fn generate_endpoint_id() -> String {
    let n = 100_000 + Uuid::new_v4().as_u128() % 900_000;
    format!("endpoint_{}", n)
}

fn parse_object(json: &str) -> Result<Value> {
    match serde_json::from_str::<Value>(json) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(other) => Err(Error::MalformedJson(format!("expected a JSON object, got {}", other))),
        Err(e) => Err(Error::MalformedJson(e.to_string())),
    }
}

impl Default for AlexaResponse {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE, DEFAULT_NAME, INVALID, INVALID, None)
    }
}

impl AlexaResponse {
    /// Build the header and endpoint scaffold.
    ///
    /// Empty arguments fall back to `Alexa`, `Response`, `INVALID` and
    /// `INVALID`. The correlation token is only emitted when one is given;
    /// an empty token becomes `INVALID`.
    pub fn new(
        namespace: &str,
        name: &str,
        endpoint_id: &str,
        token: &str,
        correlation_token: Option<&str>,
    ) -> Self {
        Self {
            event: Event {
                header: Header {
                    namespace: check_value(namespace, DEFAULT_NAMESPACE),
                    name: check_value(name, DEFAULT_NAME),
                    message_id: Uuid::new_v4().to_string(),
                    payload_version: PAYLOAD_VERSION.to_string(),
                    correlation_token: correlation_token.map(|t| check_value(t, INVALID)),
                },
                endpoint: ResponseEndpoint {
                    scope: Scope {
                        scope_type: SCOPE_TYPE.to_string(),
                        token: check_value(token, INVALID),
                    },
                    endpoint_id: check_value(endpoint_id, INVALID),
                    cookie: None,
                },
                payload: Map::new(),
            },
            context: None,
        }
    }

    /// Response with the given header name and no endpoint details.
    pub fn with_name(namespace: &str, name: &str) -> Self {
        Self::new(namespace, name, INVALID, INVALID, None)
    }

    pub fn message_id(&self) -> &str {
        &self.event.header.message_id
    }

    pub fn namespace(&self) -> &str {
        &self.event.header.namespace
    }

    pub fn name(&self) -> &str {
        &self.event.header.name
    }

    /// Insert or overwrite a key in the endpoint cookie.
    pub fn add_cookie(&mut self, key: &str, value: &str) {
        self.event
            .endpoint
            .cookie
            .get_or_insert_with(BTreeMap::new)
            .insert(key.to_string(), value.to_string());
    }

    /// Append a discovery endpoint to `payload.endpoints`.
    pub fn add_payload_endpoint(
        &mut self,
        friendly_name: Option<&str>,
        endpoint_id: Option<&str>,
        capabilities: Vec<Capability>,
    ) -> Result<()> {
        let capabilities = capabilities.into_iter().map(Value::from).collect();
        self.push_payload_endpoint(EndpointDescriptor::new(friendly_name, endpoint_id, capabilities))
    }

    /// Append a discovery endpoint whose capabilities are given as a JSON array.
    pub fn add_payload_endpoint_json(
        &mut self,
        friendly_name: Option<&str>,
        endpoint_id: Option<&str>,
        capabilities_json: &str,
    ) -> Result<()> {
        let capabilities = Capability::parse_list(capabilities_json)?;
        self.push_payload_endpoint(EndpointDescriptor::new(friendly_name, endpoint_id, capabilities))
    }

    /// Append a prepared descriptor to `payload.endpoints`.
    pub fn push_payload_endpoint(&mut self, descriptor: EndpointDescriptor) -> Result<()> {
        let endpoint = serde_json::to_value(descriptor)?;
        match self
            .event
            .payload
            .entry("endpoints")
            .or_insert_with(|| Value::Array(Vec::new()))
        {
            Value::Array(endpoints) => {
                endpoints.push(endpoint);
                Ok(())
            }
            _ => Err(Error::MalformedJson("payload.endpoints is not an array".to_string())),
        }
    }

    /// Append a reported property to `context.properties`.
    pub fn add_context_property(
        &mut self,
        namespace: &str,
        name: &str,
        value: PropertyValue,
        uncertainty_ms: u32,
    ) {
        self.context
            .get_or_insert_with(|| Context { properties: Vec::new() })
            .properties
            .push(ContextProperty::new(namespace, name, value, uncertainty_ms));
    }

    /// Replace the event payload with a JSON object.
    pub fn set_payload(&mut self, payload_json: &str) -> Result<()> {
        if let Value::Object(payload) = parse_object(payload_json)? {
            self.event.payload = payload;
        }
        Ok(())
    }

    /// Replace the event payload with an error `type` and `message`.
    pub fn set_error_payload(&mut self, error_type: &str, message: &str) {
        let mut payload = Map::new();
        payload.insert("type".to_string(), Value::String(error_type.to_string()));
        payload.insert("message".to_string(), Value::String(message.to_string()));
        self.event.payload = payload;
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl fmt::Display for AlexaResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}
