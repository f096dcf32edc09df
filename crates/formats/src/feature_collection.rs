use std::collections::BTreeMap;

use foundation::bounds::Aabb2;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A GeoJSON position. Extra ordinates (altitude) are dropped on read.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "[f64; 2]")]
pub struct GeoPoint {
    pub lon_deg: f64,
    pub lat_deg: f64,
}

impl GeoPoint {
    pub fn new(lon_deg: f64, lat_deg: f64) -> Self {
        Self { lon_deg, lat_deg }
    }

    fn as_array(self) -> [f64; 2] {
        [self.lon_deg, self.lat_deg]
    }
}

impl TryFrom<Vec<f64>> for GeoPoint {
    type Error = String;

    fn try_from(position: Vec<f64>) -> Result<Self, Self::Error> {
        match position[..] {
            [lon, lat, ..] => Ok(GeoPoint::new(lon, lat)),
            _ => Err(format!("position needs [lon, lat], got {} values", position.len())),
        }
    }
}

impl From<GeoPoint> for [f64; 2] {
    fn from(p: GeoPoint) -> Self {
        p.as_array()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(GeoPoint),
    MultiPoint(Vec<GeoPoint>),
    LineString(Vec<GeoPoint>),
    MultiLineString(Vec<Vec<GeoPoint>>),
    Polygon(Vec<Vec<GeoPoint>>),
    MultiPolygon(Vec<Vec<Vec<GeoPoint>>>),
}

impl Geometry {
    pub fn points(&self) -> Box<dyn Iterator<Item = GeoPoint> + '_> {
        match self {
            Geometry::Point(p) => Box::new(std::iter::once(*p)),
            Geometry::MultiPoint(ps) | Geometry::LineString(ps) => Box::new(ps.iter().copied()),
            Geometry::MultiLineString(rings) | Geometry::Polygon(rings) => {
                Box::new(rings.iter().flatten().copied())
            }
            Geometry::MultiPolygon(polys) => Box::new(polys.iter().flatten().flatten().copied()),
        }
    }

    pub fn bounds(&self) -> Option<Aabb2> {
        Aabb2::from_points(self.points().map(GeoPoint::as_array))
    }
}

/// A single property value. Healthcare attributes are numeric; names, codes
/// and flags come through as the other variants.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Number(f64),
    Text(String),
    Bool(bool),
    Null,
}

impl AttributeValue {
    fn from_json(value: Value) -> Self {
        match value {
            Value::Number(n) => n.as_f64().map_or(AttributeValue::Null, AttributeValue::Number),
            Value::String(s) => AttributeValue::Text(s),
            Value::Bool(b) => AttributeValue::Bool(b),
            // Nested values are kept as their JSON text.
            nested @ (Value::Array(_) | Value::Object(_)) => {
                AttributeValue::Text(nested.to_string())
            }
            Value::Null => AttributeValue::Null,
        }
    }

    /// Numeric view. Text that parses as a finite number counts (census
    /// exports often quote their numbers).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Number(n) if n.is_finite() => Some(*n),
            AttributeValue::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: Option<String>,
    pub properties: BTreeMap<String, AttributeValue>,
    /// GeoJSON allows `"geometry": null`.
    pub geometry: Option<Geometry>,
}

impl Feature {
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.properties.get(name)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.attribute(name).and_then(AttributeValue::as_f64)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

#[derive(Debug, thiserror::Error)]
pub enum FeatureCollectionError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected GeoJSON FeatureCollection")]
    NotAFeatureCollection,
    #[error("invalid feature at index {index}: {reason}")]
    InvalidFeature { index: usize, reason: String },
}

#[derive(Deserialize)]
struct RawCollection {
    #[serde(rename = "type")]
    kind: String,
    features: Vec<Value>,
}

#[derive(Deserialize)]
struct RawFeature {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    properties: Option<Map<String, Value>>,
    /// Outer `None`: key absent. Inner `None`: `"geometry": null`.
    #[serde(default, deserialize_with = "present")]
    geometry: Option<Option<Geometry>>,
}

fn present<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Option<Geometry>>, D::Error> {
    Option::<Geometry>::deserialize(d).map(Some)
}

impl RawFeature {
    fn into_feature(self) -> Result<Feature, String> {
        if self.kind != "Feature" {
            return Err(format!("unexpected feature type: {}", self.kind));
        }
        let geometry = self.geometry.ok_or("feature missing geometry")?;
        let id = match self.id {
            Some(Value::String(s)) => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        let properties = self
            .properties
            .unwrap_or_default()
            .into_iter()
            .map(|(k, v)| (k, AttributeValue::from_json(v)))
            .collect();
        Ok(Feature {
            id,
            properties,
            geometry,
        })
    }
}

#[derive(Serialize)]
struct Document<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    features: Vec<FeatureOut<'a>>,
}

#[derive(Serialize)]
struct FeatureOut<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    properties: &'a BTreeMap<String, AttributeValue>,
    geometry: Option<&'a Geometry>,
}

impl FeatureCollection {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn bounds(&self) -> Option<Aabb2> {
        self.features
            .iter()
            .filter_map(|f| f.geometry.as_ref()?.bounds())
            .reduce(Aabb2::union)
    }

    /// Every property name seen in the collection, sorted.
    pub fn attribute_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .features
            .iter()
            .flat_map(|f| f.properties.keys().map(String::as_str))
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    pub fn from_geojson_str(payload: &str) -> Result<Self, FeatureCollectionError> {
        Self::from_geojson_value(&serde_json::from_str(payload)?)
    }

    pub fn from_geojson_slice(payload: &[u8]) -> Result<Self, FeatureCollectionError> {
        Self::from_geojson_value(&serde_json::from_slice(payload)?)
    }

    pub fn from_geojson_value(value: &Value) -> Result<Self, FeatureCollectionError> {
        let raw = RawCollection::deserialize(value)
            .map_err(|_| FeatureCollectionError::NotAFeatureCollection)?;
        if raw.kind != "FeatureCollection" {
            return Err(FeatureCollectionError::NotAFeatureCollection);
        }

        let features = raw
            .features
            .iter()
            .enumerate()
            .map(|(index, value)| {
                RawFeature::deserialize(value)
                    .map_err(|e| e.to_string())
                    .and_then(RawFeature::into_feature)
                    .map_err(|reason| FeatureCollectionError::InvalidFeature { index, reason })
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { features })
    }

    fn document(&self) -> Document<'_> {
        Document {
            kind: "FeatureCollection",
            features: self
                .features
                .iter()
                .map(|f| FeatureOut {
                    kind: "Feature",
                    id: f.id.as_deref(),
                    properties: &f.properties,
                    geometry: f.geometry.as_ref(),
                })
                .collect(),
        }
    }

    /// Emits a GeoJSON FeatureCollection. Properties come out sorted by name.
    pub fn to_geojson_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self.document())
    }

    pub fn to_geojson_string_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.document())
    }
}

#[cfg(test)]
mod tests {
    use super::{AttributeValue, FeatureCollection, FeatureCollectionError, GeoPoint, Geometry};

    const TRACTS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "id": 36061000100,
                "properties": { "GEOID": "36061000100", "uninsured_rate": 0.12, "physicians_per_1k": "1.5" },
                "geometry": { "type": "Polygon", "coordinates": [[[-74.0, 40.7], [-73.9, 40.7], [-73.9, 40.8], [-74.0, 40.7]]] }
            },
            {
                "type": "Feature",
                "properties": { "GEOID": "36061000200", "uninsured_rate": null },
                "geometry": null
            }
        ]
    }"#;

    #[test]
    fn parses_tract_polygons_with_attributes() {
        let fc = FeatureCollection::from_geojson_str(TRACTS).expect("parse");
        assert_eq!(fc.len(), 2);
        assert_eq!(fc.features[0].id.as_deref(), Some("36061000100"));
        assert!(matches!(fc.features[0].geometry, Some(Geometry::Polygon(_))));
        assert!(fc.features[1].geometry.is_none());

        assert_eq!(fc.features[0].number("uninsured_rate"), Some(0.12));
        assert_eq!(fc.features[0].number("physicians_per_1k"), Some(1.5));
        assert_eq!(fc.features[1].number("uninsured_rate"), None);
        assert_eq!(
            fc.features[1].attribute("GEOID"),
            Some(&AttributeValue::Text("36061000200".to_string()))
        );
    }

    #[test]
    fn bounds_skip_null_geometry() {
        let fc = FeatureCollection::from_geojson_str(TRACTS).unwrap();
        let b = fc.bounds().unwrap();
        assert_eq!(b.min, [-74.0, 40.7]);
        assert_eq!(b.max, [-73.9, 40.8]);
    }

    #[test]
    fn lists_attribute_names() {
        let fc = FeatureCollection::from_geojson_str(TRACTS).unwrap();
        assert_eq!(
            fc.attribute_names(),
            vec!["GEOID", "physicians_per_1k", "uninsured_rate"]
        );
    }

    #[test]
    fn rejects_other_documents() {
        let err = FeatureCollection::from_geojson_str(r#"{"type":"Feature"}"#).unwrap_err();
        assert!(matches!(err, FeatureCollectionError::NotAFeatureCollection));

        let err = FeatureCollection::from_geojson_str("{not json").unwrap_err();
        assert!(matches!(err, FeatureCollectionError::Json(_)));

        let err = FeatureCollection::from_geojson_str(
            r#"{"type":"FeatureCollection","features":[{"type":"Feature","properties":{}}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, FeatureCollectionError::InvalidFeature { index: 0, .. }));

        let err = FeatureCollection::from_geojson_str(
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","properties":{},"geometry":null},
                {"type":"Feature","properties":{},"geometry":{"type":"Point","coordinates":[1.0]}}
            ]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, FeatureCollectionError::InvalidFeature { index: 1, .. }));
    }

    #[test]
    fn positions_with_altitude_are_accepted() {
        let fc = FeatureCollection::from_geojson_str(
            r#"{"type":"FeatureCollection","features":[{"type":"Feature","properties":{},
                "geometry":{"type":"Point","coordinates":[-73.95, 40.78, 12.0]}}]}"#,
        )
        .unwrap();
        assert_eq!(
            fc.features[0].geometry,
            Some(Geometry::Point(GeoPoint::new(-73.95, 40.78)))
        );
    }

    #[test]
    fn export_keeps_geometry_and_properties() {
        let fc = FeatureCollection::from_geojson_str(TRACTS).unwrap();
        let back = FeatureCollection::from_geojson_value(&fc.to_geojson_value().unwrap()).unwrap();
        assert_eq!(back, fc);
    }
}
