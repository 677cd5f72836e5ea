use std::sync::Arc;

use async_trait::async_trait;
use geo::Point;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::model::{FeatureValue, InferenceError, ModelHandle, ModelInputs};
use crate::calculations::income::map_to_ordinal_level;

/// Zone with its imported data payload (proximity indices and the like).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneRecord {
    pub id: String,
    #[serde(default)]
    pub data: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ZoneLookupError {
    #[error("zone data unavailable: {0}")]
    Unavailable(String),
}

/// Point-in-polygon lookup over the imported zones.
#[async_trait]
pub trait ZoneLookup: Send + Sync {
    async fn zones_containing(&self, point: Point<f64>) -> Result<Vec<ZoneRecord>, ZoneLookupError>;
}

/// Model feature name paired with the zone data key it is read from.
pub const PROXIMITY_FEATURES: [(&str, &str); 10] = [
    ("idx_prox_emp", "prox_idx_emp"),
    ("idx_prox_pharma", "prox_idx_pharma"),
    ("idx_prox_garderie", "prox_idx_childcare"),
    ("idx_prox_sante", "prox_idx_health"),
    ("idx_prox_epicerie", "prox_idx_grocery"),
    ("idx_prox_educpri", "prox_idx_educpri"),
    ("idx_prox_educsec", "prox_idx_educsec"),
    ("idx_prox_bibl", "prox_idx_lib"),
    ("idx_prox_parcs", "prox_idx_parks"),
    ("idx_prox_transit", "prox_idx_transit"),
];

/// Household attributes fed to the ownership model for one location.
#[derive(Debug, Clone, PartialEq)]
pub struct OwnershipQuery {
    pub location: Option<Point<f64>>,
    pub household_size: usize,
    pub permit_count: usize,
    pub income: String,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PredictionError {
    #[error("address has no point location")]
    MissingLocation,
    #[error("input point is not within any of the imported zones")]
    UncoveredPoint,
    #[error("number of permits ({permits}) is higher than household size ({household_size})")]
    PermitsExceedHousehold { permits: usize, household_size: usize },
    #[error(transparent)]
    ZoneLookup(#[from] ZoneLookupError),
    #[error(transparent)]
    Inference(#[from] InferenceError),
    #[error("car ownership model returned no label")]
    MissingLabel,
    #[error("invalid car prediction value: {0}")]
    InvalidLabel(String),
}

/// Predicts how many vehicles a household would own at a location.
#[async_trait]
pub trait OwnershipPredictor: Send + Sync {
    async fn predict(&self, query: &OwnershipQuery) -> Result<u32, PredictionError>;
}

/// Ownership prediction backed by the zone proximity indices and the trained
/// car ownership model.
pub struct CarOwnershipPredictor<Z> {
    zones: Arc<Z>,
    model: Arc<ModelHandle>,
}

impl<Z> CarOwnershipPredictor<Z>
where
    Z: ZoneLookup + 'static,
{
    pub fn new(zones: Arc<Z>, model: Arc<ModelHandle>) -> Self {
        Self { zones, model }
    }

    pub fn model(&self) -> &ModelHandle {
        &self.model
    }

    async fn zone_for(&self, point: Point<f64>) -> Result<ZoneRecord, PredictionError> {
        // Imported zones do not overlap; the first match is the zone.
        self.zones
            .zones_containing(point)
            .await?
            .into_iter()
            .next()
            .ok_or(PredictionError::UncoveredPoint)
    }
}

#[async_trait]
impl<Z> OwnershipPredictor for CarOwnershipPredictor<Z>
where
    Z: ZoneLookup + 'static,
{
    async fn predict(&self, query: &OwnershipQuery) -> Result<u32, PredictionError> {
        let point = query.location.ok_or(PredictionError::MissingLocation)?;
        let zone = self.zone_for(point).await?;
        let income_level = map_to_ordinal_level(&query.income);

        if query.permit_count > query.household_size {
            return Err(PredictionError::PermitsExceedHousehold {
                permits: query.permit_count,
                household_size: query.household_size,
            });
        }

        let mut inputs = ModelInputs::new();
        inputs.insert(
            "perslogi".to_string(),
            FeatureValue::Float(query.household_size as f32),
        );
        inputs.insert(
            "nbPermis".to_string(),
            FeatureValue::Float(query.permit_count as f32),
        );
        inputs.insert(
            "revenu".to_string(),
            FeatureValue::Text(income_level.value().to_string()),
        );
        for (feature, value) in proximity_indices(&zone.data) {
            inputs.insert(feature.to_string(), FeatureValue::Float(value));
        }

        let outputs = self.model.run(inputs).await?;
        let label = outputs
            .label
            .and_then(|labels| labels.into_iter().next())
            .ok_or(PredictionError::MissingLabel)?;
        let predicted = parse_vehicle_count(&label)?;

        tracing::debug!(zone_id = %zone.id, predicted, "predicted vehicle count");
        Ok(predicted)
    }
}

/// Reads the ten proximity indices from a zone payload; missing or null values
/// count as 0.
pub fn proximity_indices(data: &Map<String, Value>) -> Vec<(&'static str, f32)> {
    PROXIMITY_FEATURES
        .iter()
        .map(|(feature, key)| {
            let value = match data.get(*key) {
                None | Some(Value::Null) => 0.0,
                Some(Value::Number(number)) => number.as_f64().unwrap_or(0.0),
                Some(Value::String(text)) => text.trim().parse::<f64>().unwrap_or_else(|_| {
                    tracing::warn!(index = *key, value = %text, "non-numeric proximity index, using 0");
                    0.0
                }),
                Some(other) => {
                    tracing::warn!(index = *key, value = %other, "non-numeric proximity index, using 0");
                    0.0
                }
            };
            (*feature, value as f32)
        })
        .collect()
}

fn parse_vehicle_count(label: &Value) -> Result<u32, PredictionError> {
    let invalid = || PredictionError::InvalidLabel(label.to_string());
    let value = match label {
        Value::Number(number) => number.as_f64().ok_or_else(invalid)?,
        Value::String(text) => text.trim().parse::<f64>().map_err(|_| invalid())?,
        _ => return Err(invalid()),
    };

    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > f64::from(u32::MAX) {
        return Err(invalid());
    }
    Ok(value as u32)
}
