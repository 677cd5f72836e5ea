use std::collections::BTreeMap;

use geo::Point;
use geojson::Feature;
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::accessibility::{AccessibilityMapsByMode, RoutingTimeDistances};

/// How the household would occupy the address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Ownership {
    Rent,
    Buy,
    #[serde(other)]
    Unrecognized,
}

/// Candidate home location entered in the survey.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(rename = "_sequence")]
    pub sequence: u32,
    #[serde(rename = "_uuid")]
    pub uuid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geography: Option<Feature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ownership: Option<Ownership>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub rent_monthly: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub are_utilities_included: Option<bool>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub utilities_monthly: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub mortgage: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub interest_rate: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub amortization_period_in_years: Option<String>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub taxes_yearly: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_cost: Option<CalculationResult>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub accessibility_maps_by_mode: Option<ComputedField<AccessibilityMapsByMode>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub routing_time_distances: Option<ComputedField<RoutingTimeDistances>>,
}

impl Address {
    /// Point coordinates of the address, when its geography is a point feature.
    pub fn point(&self) -> Option<Point<f64>> {
        self.geography.as_ref().and_then(feature_point)
    }
}

/// Vehicle body categories covered by the CAA cost survey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VehicleCategory {
    PassengerCar,
    LuxuryCar,
    Pickup,
    Suv,
    Other,
    #[serde(other)]
    Unrecognized,
}

impl VehicleCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleCategory::PassengerCar => "passengerCar",
            VehicleCategory::LuxuryCar => "luxuryCar",
            VehicleCategory::Pickup => "pickup",
            VehicleCategory::Suv => "suv",
            VehicleCategory::Other => "other",
            VehicleCategory::Unrecognized => "unrecognized",
        }
    }

    pub(crate) fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "passengerCar" => Some(Self::PassengerCar),
            "luxuryCar" => Some(Self::LuxuryCar),
            "pickup" => Some(Self::Pickup),
            "suv" => Some(Self::Suv),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EngineType {
    Electric,
    PluginHybrid,
    Hybrid,
    Gas,
    #[serde(other)]
    Unrecognized,
}

impl EngineType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineType::Electric => "electric",
            EngineType::PluginHybrid => "pluginHybrid",
            EngineType::Hybrid => "hybrid",
            EngineType::Gas => "gas",
            EngineType::Unrecognized => "unrecognized",
        }
    }

    pub(crate) fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "electric" => Some(Self::Electric),
            "pluginHybrid" => Some(Self::PluginHybrid),
            "hybrid" => Some(Self::Hybrid),
            "gas" => Some(Self::Gas),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    #[serde(rename = "_sequence")]
    pub sequence: u32,
    #[serde(rename = "_uuid")]
    pub uuid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<VehicleCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_type: Option<EngineType>,
}

/// Frequently visited place declared by the respondent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    #[serde(rename = "_sequence")]
    pub sequence: u32,
    #[serde(rename = "_uuid")]
    pub uuid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geography: Option<Feature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_weekly: Option<String>,
}

impl Destination {
    pub fn point(&self) -> Option<Point<f64>> {
        self.geography.as_ref().and_then(feature_point)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    #[serde(rename = "_sequence")]
    pub sequence: u32,
    #[serde(rename = "_uuid")]
    pub uuid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driving_license_ownership: Option<String>,
}

impl Person {
    pub fn holds_permit(&self) -> bool {
        self.driving_license_ownership.as_deref() == Some("yes")
    }
}

/// Raw household income answer: either a numeric amount or a choice code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HouseholdIncome {
    Amount(f64),
    Code(String),
}

impl HouseholdIncome {
    /// Text form fed to the ordinal level mapping.
    pub fn as_raw(&self) -> String {
        match self {
            HouseholdIncome::Amount(value) => value.to_string(),
            HouseholdIncome::Code(code) => code.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Household {
    #[serde(
        default,
        deserialize_with = "lenient_income",
        skip_serializing_if = "Option::is_none"
    )]
    pub income: Option<HouseholdIncome>,
    #[serde(default)]
    pub persons: BTreeMap<String, Person>,
}

/// Interview responses read by the calculations. Collections are keyed by uuid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interview {
    #[serde(default)]
    pub household: Household,
    #[serde(default)]
    pub cars: BTreeMap<String, Vehicle>,
    #[serde(default)]
    pub destinations: BTreeMap<String, Destination>,
    #[serde(default)]
    pub addresses: BTreeMap<String, Address>,
}

impl Interview {
    pub fn persons(&self) -> Vec<&Person> {
        sorted(self.household.persons.values(), |person| person.sequence)
    }

    pub fn vehicles(&self) -> Vec<&Vehicle> {
        sorted(self.cars.values(), |vehicle| vehicle.sequence)
    }

    pub fn destinations(&self) -> Vec<&Destination> {
        sorted(self.destinations.values(), |destination| destination.sequence)
    }

    pub fn addresses(&self) -> Vec<&Address> {
        sorted(self.addresses.values(), |address| address.sequence)
    }

    pub fn permit_count(&self) -> usize {
        self.household
            .persons
            .values()
            .filter(|person| person.holds_permit())
            .count()
    }
}

fn sorted<'a, T, I, F>(items: I, key: F) -> Vec<&'a T>
where
    I: Iterator<Item = &'a T>,
    F: Fn(&T) -> u32,
{
    let mut items: Vec<&T> = items.collect();
    items.sort_by_key(|item| key(item));
    items
}

/// Monthly figures computed for one address.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    pub housing_cost_monthly: Option<f64>,
    pub car_cost_monthly: Option<f64>,
    pub housing_and_transport_cost_percentage_of_income: Option<i64>,
    pub total_cost_monthly: Option<f64>,
    pub current_number_of_vehicles: Option<u32>,
    pub predicted_number_of_vehicles: Option<u32>,
}

pub const CALCULATING: &str = "calculating";

/// Cached result slot that may still be computing or known to be unavailable.
#[derive(Debug, Clone, PartialEq)]
pub enum ComputedField<T> {
    Calculating,
    Unavailable,
    Ready(T),
}

impl<T> ComputedField<T> {
    pub fn from_option(value: Option<T>) -> Self {
        match value {
            Some(value) => Self::Ready(value),
            None => Self::Unavailable,
        }
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            ComputedField::Ready(value) => Some(value),
            _ => None,
        }
    }
}

impl<T: Serialize> Serialize for ComputedField<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ComputedField::Calculating => serializer.serialize_str(CALCULATING),
            ComputedField::Unavailable => serializer.serialize_none(),
            ComputedField::Ready(value) => value.serialize(serializer),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for ComputedField<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr<U> {
            Marker(String),
            Value(U),
        }

        match Option::<Repr<T>>::deserialize(deserializer)? {
            None => Ok(ComputedField::Unavailable),
            Some(Repr::Marker(marker)) if marker == CALCULATING => Ok(ComputedField::Calculating),
            Some(Repr::Marker(marker)) => Err(de::Error::custom(format!(
                "unexpected result marker '{marker}'"
            ))),
            Some(Repr::Value(value)) => Ok(ComputedField::Ready(value)),
        }
    }
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<ComputedField<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    ComputedField::deserialize(deserializer).map(Some)
}

// Survey answers are loosely typed; a value of the wrong type counts as missing.
fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| value.as_f64()))
}

fn lenient_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(text)) => Some(text),
        _ => None,
    })
}

fn lenient_income<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<HouseholdIncome>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(number)) => number.as_f64().map(HouseholdIncome::Amount),
        Some(serde_json::Value::String(code)) => Some(HouseholdIncome::Code(code)),
        _ => None,
    })
}

pub(crate) fn feature_point(feature: &Feature) -> Option<Point<f64>> {
    match feature.geometry.as_ref().map(|geometry| &geometry.value) {
        Some(geojson::Value::Point(coordinates)) if coordinates.len() >= 2 => {
            Some(Point::new(coordinates[0], coordinates[1]))
        }
        _ => None,
    }
}
