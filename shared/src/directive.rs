//! Inbound smart home directives.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::{Error, Result};

/// Envelope the smart home service sends to the skill.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectiveRequest {
    pub directive: Directive,
}

/// A single directive.
#[derive(Debug, Clone, Deserialize)]
pub struct Directive {
    pub header: DirectiveHeader,
    #[serde(default)]
    pub endpoint: Option<DirectiveEndpoint>,
    #[serde(default)]
    pub payload: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectiveHeader {
    #[serde(default, deserialize_with = "lenient_string")]
    pub namespace: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub correlation_token: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub message_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub payload_version: Option<String>,
}

/// Target endpoint of a directive.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectiveEndpoint {
    #[serde(default, deserialize_with = "lenient_string")]
    pub endpoint_id: Option<String>,
    #[serde(default)]
    pub scope: Option<EndpointScope>,
    #[serde(default)]
    pub cookie: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EndpointScope {
    #[serde(rename = "type", default)]
    pub scope_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub token: Option<String>,
}

/// Read an optional field of any JSON type, rendering non-strings as their
/// JSON text.
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

impl Directive {
    /// Parse a directive from raw request bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let request: DirectiveRequest =
            serde_json::from_slice(bytes).map_err(|e| Error::MalformedInput(e.to_string()))?;
        Ok(request.directive)
    }

    /// Parse a directive from an already decoded JSON document.
    pub fn from_value(value: Value) -> Result<Self> {
        let request: DirectiveRequest =
            serde_json::from_value(value).map_err(|e| Error::MalformedInput(e.to_string()))?;
        Ok(request.directive)
    }

    pub fn namespace(&self) -> Option<&str> {
        self.header.namespace.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.header.name.as_deref()
    }

    pub fn correlation_token(&self) -> Option<&str> {
        self.header.correlation_token.as_deref()
    }

    /// Endpoint id and bearer token of the target endpoint.
    ///
    /// Fails when the directive carries no `endpoint` or no `endpoint.scope`;
    /// missing fields inside them are returned as `None`.
    pub fn endpoint_and_token(&self) -> Result<(Option<&str>, Option<&str>)> {
        let endpoint = self
            .endpoint
            .as_ref()
            .ok_or_else(|| Error::MalformedInput("directive has no endpoint".to_string()))?;
        let scope = endpoint
            .scope
            .as_ref()
            .ok_or_else(|| Error::MalformedInput("directive endpoint has no scope".to_string()))?;
        Ok((endpoint.endpoint_id.as_deref(), scope.token.as_deref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_power_controller_directive() {
        let json = br#"{"directive":{"header":{"namespace":"Alexa.PowerController","name":"TurnOff","messageId":"m1","correlationToken":"c1","payloadVersion":"3"},"endpoint":{"endpointId":"e1","scope":{"type":"BearerToken","token":"t1"},"cookie":{}},"payload":{}}}"#;
        let directive = Directive::from_slice(json).unwrap();
        assert_eq!(directive.namespace(), Some("Alexa.PowerController"));
        assert_eq!(directive.name(), Some("TurnOff"));
        assert_eq!(directive.correlation_token(), Some("c1"));
        assert_eq!(directive.endpoint_and_token().unwrap(), (Some("e1"), Some("t1")));
    }

    #[test]
    fn test_missing_header_fields_are_none() {
        let directive = Directive::from_value(json!({"directive": {"header": {}}})).unwrap();
        assert_eq!(directive.namespace(), None);
        assert_eq!(directive.name(), None);
        assert_eq!(directive.correlation_token(), None);
        assert!(directive.payload.is_none());
    }

    #[test]
    fn test_non_string_header_fields_are_read_as_text() {
        let directive = Directive::from_value(json!({"directive": {
            "header": {"namespace": 5, "name": true, "correlationToken": null},
            "endpoint": {"endpointId": 42, "scope": {"token": "t1"}}
        }}))
        .unwrap();
        assert_eq!(directive.namespace(), Some("5"));
        assert_eq!(directive.name(), Some("true"));
        assert_eq!(directive.correlation_token(), None);
        assert_eq!(directive.endpoint_and_token().unwrap(), (Some("42"), Some("t1")));
    }

    #[test]
    fn test_missing_directive_or_header_is_malformed() {
        let err = Directive::from_value(json!({"request": {}})).unwrap_err();
        assert!(matches!(err, Error::MalformedInput(_)));

        let err = Directive::from_value(json!({"directive": {}})).unwrap_err();
        assert!(matches!(err, Error::MalformedInput(_)));

        let err = Directive::from_slice(b"not json").unwrap_err();
        assert!(matches!(err, Error::MalformedInput(_)));
    }

    #[test]
    fn test_endpoint_requires_scope() {
        let directive = Directive::from_value(json!({
            "directive": {"header": {"namespace": "Alexa.PowerController"}, "endpoint": {"endpointId": "e1"}}
        }))
        .unwrap();
        assert!(matches!(directive.endpoint_and_token(), Err(Error::MalformedInput(_))));

        let directive = Directive::from_value(json!({
            "directive": {"header": {"namespace": "Alexa.PowerController"}, "endpoint": {"scope": {}}}
        }))
        .unwrap();
        assert_eq!(directive.endpoint_and_token().unwrap(), (None, None));
    }
}
