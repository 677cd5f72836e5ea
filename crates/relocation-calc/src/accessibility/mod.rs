//! Accessibility maps and per-destination routing for candidate addresses.

pub mod domain;
pub mod gateway;
pub mod isochrone;
pub mod routing;
pub mod service;

pub use domain::{
    AccessibilityConfig, AccessibilityMapsByMode, AccessibilityOutcome, DurationBuckets,
    ModeTimeDistance, ResultsByMode, RoutingResult, RoutingTimeDistances, TravelMode,
};
pub use gateway::{
    AccessibilityMapRequest, AccessibilityMapResponse, GatewayError, ModeRouting, RoutingGateway,
    TimeDistanceRequest, TimeDistanceResponse,
};
pub use isochrone::IsochroneProfile;
pub use routing::RoutingError;
pub use service::AccessibilityService;
