//! GeoJSON datasource backend.

use std::collections::HashMap;
use std::sync::Arc;

use geojson::GeoJson;

use super::{source_text, Datasource, DatasourceKind, Feature, MemoryDatasource, Parameters};
use crate::error::CartaError;

/// Constructs a GeoJSON datasource from a `file` or `inline` parameter set.
///
/// Accepts a FeatureCollection, a single Feature or a bare Geometry.
pub(super) fn create(params: &Parameters) -> Result<Arc<dyn Datasource>, CartaError> {
    let text = source_text(params)?;
    let features = parse(&text)?;
    Ok(Arc::new(MemoryDatasource::new(
        DatasourceKind::GeoJson,
        features,
    )))
}

fn parse(text: &str) -> Result<Vec<Feature>, CartaError> {
    let geojson: GeoJson = text
        .parse()
        .map_err(|err| CartaError::DatasourceConstruction(format!("geojson: {err}")))?;

    let mut features = Vec::new();
    match geojson {
        GeoJson::FeatureCollection(collection) => {
            for feature in collection.features {
                if let Some(converted) = convert_feature(feature)? {
                    features.push(converted);
                }
            }
        }
        GeoJson::Feature(feature) => {
            if let Some(converted) = convert_feature(feature)? {
                features.push(converted);
            }
        }
        GeoJson::Geometry(geometry) => {
            features.push(Feature::new(convert_geometry(geometry)?, HashMap::new()));
        }
    }

    Ok(features)
}

fn convert_feature(feature: geojson::Feature) -> Result<Option<Feature>, CartaError> {
    let Some(geometry) = feature.geometry else {
        log::debug!("skipping geojson feature without geometry");
        return Ok(None);
    };

    let mut properties = HashMap::new();
    if let Some(object) = feature.properties {
        for (key, value) in object {
            let text = match value {
                serde_json::Value::String(text) => text,
                other => other.to_string(),
            };
            properties.insert(key, text);
        }
    }

    Ok(Some(Feature::new(convert_geometry(geometry)?, properties)))
}

fn convert_geometry(geometry: geojson::Geometry) -> Result<geo_types::Geometry<f64>, CartaError> {
    geo_types::Geometry::<f64>::try_from(geometry)
        .map_err(|err| CartaError::DatasourceConstruction(format!("geojson: {err}")))
}
