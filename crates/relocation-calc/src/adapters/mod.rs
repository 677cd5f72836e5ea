//! Concrete implementations of the collaborator traits.

pub mod inference_http;
pub mod routing_http;
pub mod zones;

pub use inference_http::{HttpInferenceSession, HttpModelLoader};
pub use routing_http::HttpRoutingGateway;
pub use zones::{GeoJsonZoneIndex, ZoneIndexError};
