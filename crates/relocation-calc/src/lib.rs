//! Cost and accessibility calculations used to compare candidate home addresses.
//!
//! The crate exposes two orchestrators: [`calculations::MonthlyCostService`]
//! produces housing, vehicle and income-share figures for an address, and
//! [`accessibility::AccessibilityService`] gathers isochrones and per-destination
//! travel times from an external routing service.

pub mod accessibility;
pub mod adapters;
pub mod calculations;
pub mod config;
pub mod error;
pub mod survey;
pub mod telemetry;
