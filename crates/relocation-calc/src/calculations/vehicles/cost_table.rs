use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::calculations::domain::{EngineType, VehicleCategory};

const BUILTIN_TABLE: &str = include_str!("vehicle_costs.csv");

/// Average annual ownership cost per vehicle category and engine type, from the
/// CAA driving cost survey.
///
/// Not every pair is populated; an unmapped pair means the vehicle cannot be
/// costed.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleCostTable {
    costs: HashMap<(VehicleCategory, EngineType), f64>,
}

#[derive(Debug, thiserror::Error)]
pub enum VehicleCostTableError {
    #[error("failed to read vehicle cost table: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse vehicle cost table: {0}")]
    Csv(#[from] csv::Error),
    #[error("unknown vehicle category '{0}' in cost table")]
    UnknownCategory(String),
    #[error("unknown engine type '{0}' in cost table")]
    UnknownEngine(String),
    #[error("annual cost for {category}/{engine} must be a positive amount")]
    InvalidCost { category: String, engine: String },
}

#[derive(Debug, Deserialize)]
struct CostRow {
    category: String,
    engine: String,
    annual_cost: f64,
}

impl VehicleCostTable {
    /// Table shipped with the crate.
    pub fn builtin() -> Self {
        Self::from_csv_reader(BUILTIN_TABLE.as_bytes())
            .expect("embedded vehicle cost table is well formed")
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, VehicleCostTableError> {
        let file = File::open(path)?;
        Self::from_csv_reader(file)
    }

    /// Reads `category,engine,annual_cost` rows.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, VehicleCostTableError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut costs = HashMap::new();
        for record in csv_reader.deserialize::<CostRow>() {
            let row = record?;
            let category = VehicleCategory::parse(&row.category)
                .ok_or_else(|| VehicleCostTableError::UnknownCategory(row.category.clone()))?;
            let engine = EngineType::parse(&row.engine)
                .ok_or_else(|| VehicleCostTableError::UnknownEngine(row.engine.clone()))?;
            if !row.annual_cost.is_finite() || row.annual_cost <= 0.0 {
                return Err(VehicleCostTableError::InvalidCost {
                    category: row.category,
                    engine: row.engine,
                });
            }
            costs.insert((category, engine), row.annual_cost);
        }

        Ok(Self { costs })
    }

    pub fn average_annual_cost(&self, category: VehicleCategory, engine: EngineType) -> Option<f64> {
        self.costs.get(&(category, engine)).copied()
    }

    /// Reference cost used when the household has no vehicle to derive a price
    /// point from: a gas passenger car.
    pub fn reference_annual_cost(&self) -> Option<f64> {
        self.average_annual_cost(VehicleCategory::PassengerCar, EngineType::Gas)
    }

    pub fn len(&self) -> usize {
        self.costs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.costs.is_empty()
    }
}

impl Default for VehicleCostTable {
    fn default() -> Self {
        Self::builtin()
    }
}
