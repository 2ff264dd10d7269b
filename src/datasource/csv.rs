//! CSV datasource backend.
//!
//! Expects a header row; geometry columns are detected case-insensitively
//! among common x/longitude and y/latitude spellings. All other columns
//! become feature attributes.

use std::collections::HashMap;
use std::sync::Arc;

use geo_types::Point;

use super::{source_text, Datasource, DatasourceKind, Feature, MemoryDatasource, Parameters};
use crate::error::CartaError;

const X_COLUMNS: [&str; 4] = ["x", "lon", "lng", "longitude"];
const Y_COLUMNS: [&str; 3] = ["y", "lat", "latitude"];

/// Constructs a CSV datasource from a `file` or `inline` parameter set.
pub(super) fn create(params: &Parameters) -> Result<Arc<dyn Datasource>, CartaError> {
    let text = source_text(params)?;
    let features = parse(&text)?;
    Ok(Arc::new(MemoryDatasource::new(DatasourceKind::Csv, features)))
}

fn parse(text: &str) -> Result<Vec<Feature>, CartaError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|err| CartaError::DatasourceConstruction(format!("csv: {err}")))?
        .clone();

    let find = |candidates: &[&str]| {
        headers
            .iter()
            .position(|header| candidates.contains(&header.to_ascii_lowercase().as_str()))
    };
    let (Some(x_index), Some(y_index)) = (find(&X_COLUMNS), find(&Y_COLUMNS)) else {
        return Err(CartaError::DatasourceConstruction(
            "csv: could not detect geometry columns \
             (expected one of x/lon/lng/longitude and one of y/lat/latitude)"
                .to_string(),
        ));
    };

    let mut features = Vec::new();
    for record in reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                log::warn!("skipping malformed csv record: {err}");
                continue;
            }
        };

        let coordinate = |index: usize| record.get(index).and_then(|v| v.parse::<f64>().ok());
        let (Some(x), Some(y)) = (coordinate(x_index), coordinate(y_index)) else {
            log::warn!("skipping csv record with unparseable coordinates");
            continue;
        };

        let mut properties = HashMap::new();
        for (index, value) in record.iter().enumerate() {
            if index == x_index || index == y_index {
                continue;
            }
            if let Some(name) = headers.get(index) {
                properties.insert(name.to_string(), value.to_string());
            }
        }

        features.push(Feature::new(Point::new(x, y).into(), properties));
    }

    Ok(features)
}
