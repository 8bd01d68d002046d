//! GeoJSON `FeatureCollection` assembly shared by the geo/layers routes
//! (spec §6: "GeoJSON FeatureCollections").

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value as GeoValue};
use serde::Serialize;

/// Builds a `Point` feature at `(lon, lat)` with `properties` flattened from
/// any serialisable value.
pub fn point_feature(lon: f64, lat: f64, properties: &impl Serialize) -> Feature {
    let properties: JsonObject =
        serde_json::to_value(properties).ok().and_then(|v| v.as_object().cloned()).unwrap_or_default();

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(GeoValue::Point(vec![lon, lat]))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

/// Builds a feature from an already-stored GeoJSON geometry value (spec §4.5
/// alert geometry), falling back to no geometry when absent or malformed
/// rather than failing the whole route.
pub fn geometry_feature(geometry: Option<serde_json::Value>, properties: &impl Serialize) -> Feature {
    let properties: JsonObject =
        serde_json::to_value(properties).ok().and_then(|v| v.as_object().cloned()).unwrap_or_default();
    let geometry = geometry.and_then(|g| Geometry::from_json_value(g).ok());

    Feature { bbox: None, geometry, id: None, properties: Some(properties), foreign_members: None }
}

pub fn feature_collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection { bbox: None, features, foreign_members: None }
}
