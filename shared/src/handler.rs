//! Directive dispatch.
//!
//! Routes a directive by header namespace to one of four outcomes and builds
//! the matching [`AlexaResponse`]. Only `Alexa.PowerController` touches the
//! device store.

use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use crate::response::{AlexaResponse, Capability, PropertyValue, INVALID};
use crate::store::DeviceStore;
use crate::{Config, Directive, Result};

const NAMESPACE_AUTHORIZATION: &str = "Alexa.Authorization";
const NAMESPACE_DISCOVERY: &str = "Alexa.Discovery";
const NAMESPACE_POWER_CONTROLLER: &str = "Alexa.PowerController";

/// Uncertainty reported with a freshly written power state.
const POWER_STATE_UNCERTAINTY_MS: u32 = 200;

/// Outcome selected by a directive's namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    Authorization,
    Discovery,
    PowerController,
    Unknown,
}

impl From<&str> for DirectiveKind {
    fn from(namespace: &str) -> Self {
        match namespace {
            NAMESPACE_AUTHORIZATION => DirectiveKind::Authorization,
            NAMESPACE_DISCOVERY => DirectiveKind::Discovery,
            NAMESPACE_POWER_CONTROLLER => DirectiveKind::PowerController,
            _ => DirectiveKind::Unknown,
        }
    }
}

/// Power state written for a `PowerController` directive name.
fn power_state(name: &str) -> &'static str {
    if name == "TurnOn" {
        "ON"
    } else {
        "OFF"
    }
}

/// Handles smart home directives against a device store.
pub struct SmartHomeHandler<S> {
    store: S,
    reject_unknown_directives: bool,
}

impl<S: DeviceStore> SmartHomeHandler<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            reject_unknown_directives: false,
        }
    }

    /// Create a handler honouring the dispatch settings in `config`.
    pub fn with_config(store: S, config: &Config) -> Self {
        Self {
            store,
            reject_unknown_directives: config.reject_unknown_directives,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Handle raw request bytes, returning the serialized response.
    pub async fn handle(&self, input: &[u8]) -> Result<Vec<u8>> {
        debug!("Request: {}", String::from_utf8_lossy(input));
        let directive = Directive::from_slice(input)?;
        let response = self.dispatch(&directive).await?;
        let body = response.to_json_string()?;
        debug!("Response: {}", body);
        Ok(body.into_bytes())
    }

    /// Handle a decoded request document, returning the response document.
    pub async fn handle_value(&self, input: Value) -> Result<Value> {
        debug!("Request: {}", input);
        let directive = Directive::from_value(input)?;
        let response = self.dispatch(&directive).await?;
        let value = response.to_value()?;
        debug!("Response: {}", value);
        Ok(value)
    }

    /// Build the response for one directive.
    pub async fn dispatch(&self, directive: &Directive) -> Result<AlexaResponse> {
        let namespace = directive.namespace().unwrap_or(INVALID);
        let correlation_token = directive.correlation_token().unwrap_or(INVALID);

        match DirectiveKind::from(namespace) {
            DirectiveKind::Authorization => {
                info!("Handling {} directive", namespace);
                Ok(AlexaResponse::new(
                    NAMESPACE_AUTHORIZATION,
                    "AcceptGrant",
                    INVALID,
                    INVALID,
                    Some(correlation_token),
                ))
            }
            DirectiveKind::Discovery => {
                info!("Handling {} directive", namespace);
                discovery_response()
            }
            DirectiveKind::PowerController => {
                info!("Handling {} directive", namespace);
                self.power_controller_response(directive, correlation_token).await
            }
            DirectiveKind::Unknown => {
                warn!("Unsupported namespace: {}", namespace);
                Ok(self.unknown_response(namespace))
            }
        }
    }

    async fn power_controller_response(
        &self,
        directive: &Directive,
        correlation_token: &str,
    ) -> Result<AlexaResponse> {
        let (endpoint_id, token) = directive.endpoint_and_token()?;
        let endpoint_id = endpoint_id.unwrap_or(INVALID);
        let token = token.unwrap_or(INVALID);
        let state = power_state(directive.name().unwrap_or("TurnOn"));

        match self.send_device_state(endpoint_id, "powerState", state).await {
            Ok(()) => {
                let mut response =
                    AlexaResponse::new("Alexa", "Response", endpoint_id, token, Some(correlation_token));
                response.add_context_property(
                    NAMESPACE_POWER_CONTROLLER,
                    "powerState",
                    PropertyValue::from(state),
                    POWER_STATE_UNCERTAINTY_MS,
                );
                Ok(response)
            }
            Err(e) => {
                error!("Failed to set powerState of {}: {}", endpoint_id, e);
                let mut response = AlexaResponse::with_name("Alexa", "ErrorResponse");
                response.set_error_payload(e.response_type(), &e.to_string());
                Ok(response)
            }
        }
    }

    /// Store a state as its `<state>Value` attribute.
    async fn send_device_state(&self, endpoint_id: &str, state: &str, value: &str) -> Result<()> {
        let attribute_name = format!("{}Value", state);
        self.store
            .update_device_attribute(endpoint_id, &attribute_name, value)
            .await
    }

    fn unknown_response(&self, namespace: &str) -> AlexaResponse {
        if !self.reject_unknown_directives {
            return AlexaResponse::default();
        }
        let mut response = AlexaResponse::with_name("Alexa", "ErrorResponse");
        response.set_error_payload(
            "INVALID_DIRECTIVE",
            &format!("Unsupported namespace: {}", namespace),
        );
        response
    }
}

/// Discovery response advertising the single sample switch.
fn discovery_response() -> Result<AlexaResponse> {
    let mut response = AlexaResponse::with_name(NAMESPACE_DISCOVERY, "Discover.Response");
    let capabilities = vec![
        Capability::alexa_interface("Alexa", None),
        Capability::alexa_interface(
            NAMESPACE_POWER_CONTROLLER,
            Some(json!({"supported": [{"name": "powerState"}]})),
        ),
    ];
    response.add_payload_endpoint(Some("Sample Switch"), Some("sample-switch-01"), capabilities)?;
    Ok(response)
}
