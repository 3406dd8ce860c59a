use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use travel_log_lib::PathPoint;

/// Consumes a path, plus an optional live position, and draws it.
pub trait MapRenderer {
    type Output;

    fn render(&self, path: &[PathPoint], live: Option<PathPoint>) -> Self::Output;
}

/// Renders a route as GeoJSON for the web map: a polyline with start and end
/// markers. An empty path gives an empty collection.
#[derive(Debug, Default, Clone, Copy)]
pub struct GeoJsonRouteRenderer;

impl MapRenderer for GeoJsonRouteRenderer {
    type Output = FeatureCollection;

    fn render(&self, path: &[PathPoint], live: Option<PathPoint>) -> FeatureCollection {
        let mut features = Vec::new();

        if path.len() > 1 {
            let line = path.iter().map(position).collect();
            features.push(feature(Value::LineString(line), "route"));
        }

        if let (Some(start), Some(end)) = (path.first(), path.last()) {
            features.push(feature(Value::Point(position(start)), "start"));
            features.push(feature(Value::Point(position(end)), "end"));
        }

        if let Some(live) = live {
            features.push(feature(Value::Point(position(&live)), "live"));
        }

        FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }
}

fn position(point: &PathPoint) -> Vec<f64> {
    vec![point.lng, point.lat]
}

fn feature(value: Value, kind: &str) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("kind".into(), kind.into());

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}
