use std::path::Path;

use async_trait::async_trait;
use geo::{Contains, Geometry, MultiPolygon, Point, Polygon};
use geojson::{feature::Id, FeatureCollection, GeoJson};
use serde_json::{Map, Value};

use crate::calculations::vehicles::{ZoneLookup, ZoneLookupError, ZoneRecord};

#[derive(Debug, thiserror::Error)]
pub enum ZoneIndexError {
    #[error("failed to read zones file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid zones GeoJSON: {0}")]
    GeoJson(String),
    #[error("zones GeoJSON must be a FeatureCollection")]
    NotACollection,
}

enum ZoneShape {
    Polygon(Polygon<f64>),
    MultiPolygon(MultiPolygon<f64>),
}

impl ZoneShape {
    fn contains(&self, point: &Point<f64>) -> bool {
        match self {
            ZoneShape::Polygon(polygon) => polygon.contains(point),
            ZoneShape::MultiPolygon(polygons) => polygons.contains(point),
        }
    }
}

struct Zone {
    record: ZoneRecord,
    shape: ZoneShape,
}

/// In-memory zone lookup over polygon features. Feature properties become the
/// zone's data payload; features without an area geometry are skipped.
pub struct GeoJsonZoneIndex {
    zones: Vec<Zone>,
}

impl GeoJsonZoneIndex {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ZoneIndexError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_geojson_str(&raw)
    }

    pub fn from_geojson_str(raw: &str) -> Result<Self, ZoneIndexError> {
        match raw
            .parse::<GeoJson>()
            .map_err(|error| ZoneIndexError::GeoJson(error.to_string()))?
        {
            GeoJson::FeatureCollection(collection) => Ok(Self::from_collection(collection)),
            _ => Err(ZoneIndexError::NotACollection),
        }
    }

    pub fn from_collection(collection: FeatureCollection) -> Self {
        let mut zones = Vec::with_capacity(collection.features.len());
        for (index, feature) in collection.features.into_iter().enumerate() {
            let id = match &feature.id {
                Some(Id::String(id)) => id.clone(),
                Some(Id::Number(id)) => id.to_string(),
                None => feature
                    .property("id")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| index.to_string()),
            };

            let Some(geometry) = feature.geometry else {
                tracing::warn!(zone = %id, "zone feature has no geometry, skipped");
                continue;
            };
            let shape = match Geometry::<f64>::try_from(geometry.value) {
                Ok(Geometry::Polygon(polygon)) => ZoneShape::Polygon(polygon),
                Ok(Geometry::MultiPolygon(polygons)) => ZoneShape::MultiPolygon(polygons),
                Ok(_) | Err(_) => {
                    tracing::warn!(zone = %id, "zone geometry is not a polygon, skipped");
                    continue;
                }
            };

            zones.push(Zone {
                record: ZoneRecord {
                    id,
                    data: feature.properties.unwrap_or_else(Map::new),
                },
                shape,
            });
        }

        tracing::info!(zones = zones.len(), "loaded zone index");
        Self { zones }
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn containing(&self, point: &Point<f64>) -> Vec<ZoneRecord> {
        self.zones
            .iter()
            .filter(|zone| zone.shape.contains(point))
            .map(|zone| zone.record.clone())
            .collect()
    }
}

#[async_trait]
impl ZoneLookup for GeoJsonZoneIndex {
    async fn zones_containing(&self, point: Point<f64>) -> Result<Vec<ZoneRecord>, ZoneLookupError> {
        Ok(self.containing(&point))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ZONES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "id": "plateau",
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[-73.6, 45.5], [-73.5, 45.5], [-73.5, 45.6], [-73.6, 45.6], [-73.6, 45.5]]]
                },
                "properties": { "prox_idx_transit": 0.8 }
            },
            {
                "type": "Feature",
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [[[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]]]
                },
                "properties": { "id": "null-island" }
            },
            {
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [-73.55, 45.55] },
                "properties": {}
            }
        ]
    }"#;

    #[tokio::test]
    async fn finds_zone_containing_point() {
        let index = GeoJsonZoneIndex::from_geojson_str(ZONES).expect("zones parse");
        assert_eq!(index.len(), 2, "point feature is skipped");

        let zones = index
            .zones_containing(Point::new(-73.55, 45.55))
            .await
            .expect("lookup succeeds");
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].id, "plateau");
        assert_eq!(zones[0].data["prox_idx_transit"], serde_json::json!(0.8));

        let island = index.containing(&Point::new(0.5, 0.5));
        assert_eq!(island[0].id, "null-island");
    }

    #[test]
    fn point_outside_every_zone_yields_nothing() {
        let index = GeoJsonZoneIndex::from_geojson_str(ZONES).expect("zones parse");
        assert!(index.containing(&Point::new(10.0, 10.0)).is_empty());
    }

    #[test]
    fn rejects_non_collection_documents() {
        let raw = r#"{ "type": "Point", "coordinates": [0.0, 0.0] }"#;
        assert!(matches!(
            GeoJsonZoneIndex::from_geojson_str(raw),
            Err(ZoneIndexError::NotACollection)
        ));
        assert!(matches!(
            GeoJsonZoneIndex::from_geojson_str("not json"),
            Err(ZoneIndexError::GeoJson(_))
        ));
    }
}
