//! Shared library for the smart home skill Lambda.
//!
//! This crate parses smart home directives, dispatches them and builds the
//! protocol response envelopes. Device state is written through the
//! [`DeviceStore`] trait.

pub mod config;
pub mod directive;
pub mod error;
pub mod handler;
pub mod response;
pub mod store;

pub use config::Config;
pub use directive::{Directive, DirectiveEndpoint, DirectiveHeader, DirectiveRequest, EndpointScope};
pub use error::{Error, Result};
pub use handler::{DirectiveKind, SmartHomeHandler};
pub use response::{AlexaResponse, Capability, ContextProperty, EndpointDescriptor, PropertyValue};
pub use store::{DeviceStore, DynamoDbDeviceStore, MemoryDeviceStore};
