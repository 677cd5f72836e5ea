//! Vehicle ownership prediction and car cost aggregation.

pub mod aggregator;
pub mod cost_table;
pub mod model;
pub mod ownership;

pub use aggregator::{CarCostAggregator, CarCostError, CarCostEstimate};
pub use cost_table::{VehicleCostTable, VehicleCostTableError};
pub use model::{
    FeatureValue, InferenceError, InferenceSession, ModelHandle, ModelInputs, ModelLoader,
    ModelOutputs, ModelState,
};
pub use ownership::{
    CarOwnershipPredictor, OwnershipPredictor, OwnershipQuery, PredictionError, ZoneLookup,
    ZoneLookupError, ZoneRecord, PROXIMITY_FEATURES,
};
