//! Datasources feed geometry and attributes into [layers](crate::Layer).
//!
//! A datasource is constructed by the factory ([`create_datasource`]) from a
//! typed [`Parameters`] set and is immutable afterwards: it is either fully
//! constructed and queryable, or construction fails and no value exists.
//! Construction is delegated to a backend looked up in the
//! [`DatasourceRegistry`]; the `geojson` and `csv` backends are built in,
//! others can be registered at runtime.

mod csv;
mod geojson;
mod params;
mod registry;

use std::collections::HashMap;
use std::fmt;

use geo::BoundingRect;
use geo_types::Geometry;
use serde::{Deserialize, Serialize};

pub use params::{ParamValue, Parameters};
pub use registry::{create_datasource, BackendConstructor, DatasourceRegistry};

use crate::error::CartaError;
use crate::extent::Extent;

/// Kind of a datasource backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasourceKind {
    /// ESRI shapefile reader.
    Shape,
    /// PostGIS table or subquery.
    Postgis,
    /// GeoJSON document, file-backed or inline.
    GeoJson,
    /// Delimited text with coordinate columns, file-backed or inline.
    Csv,
}

impl fmt::Display for DatasourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DatasourceKind::Shape => "shape",
            DatasourceKind::Postgis => "postgis",
            DatasourceKind::GeoJson => "geojson",
            DatasourceKind::Csv => "csv",
        };
        f.write_str(name)
    }
}

/// A single geographic object: a geometry with string attributes.
#[derive(Debug, Clone)]
pub struct Feature {
    geometry: Geometry<f64>,
    properties: HashMap<String, String>,
}

impl Feature {
    /// Creates a new feature.
    pub fn new(geometry: Geometry<f64>, properties: HashMap<String, String>) -> Self {
        Self {
            geometry,
            properties,
        }
    }

    /// Geometry of the feature.
    pub fn geometry(&self) -> &Geometry<f64> {
        &self.geometry
    }

    /// Value of the attribute `key`, if present.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// All attributes of the feature.
    pub fn properties(&self) -> &HashMap<String, String> {
        &self.properties
    }

    /// Bounding box of the feature's geometry. `None` for empty geometries.
    pub fn extent(&self) -> Option<Extent> {
        self.geometry.bounding_rect().map(Into::into)
    }
}

/// A queryable source of geographic features.
///
/// Implementations must be immutable after construction, which makes a
/// no-longer-mutated map safe to render from several threads at once.
pub trait Datasource: Send + Sync + fmt::Debug {
    /// Kind of the backend that created this datasource.
    fn kind(&self) -> DatasourceKind;

    /// Bounding box of all data in the datasource, if it contains any.
    fn extent(&self) -> Option<Extent>;

    /// All features whose bounding box intersects `extent`.
    fn features(&self, extent: &Extent) -> Vec<Feature>;
}

/// Datasource over a set of features held in memory.
///
/// Both built-in backends parse their input eagerly into this type. It is
/// public so custom backends that materialize their data up front can reuse
/// it.
#[derive(Debug)]
pub struct MemoryDatasource {
    kind: DatasourceKind,
    features: Vec<Feature>,
    extent: Option<Extent>,
}

impl MemoryDatasource {
    /// Creates a datasource over the given features.
    pub fn new(kind: DatasourceKind, features: Vec<Feature>) -> Self {
        let extent = features
            .iter()
            .filter_map(Feature::extent)
            .reduce(|acc, other| acc.merge(other));

        Self {
            kind,
            features,
            extent,
        }
    }
}

impl Datasource for MemoryDatasource {
    fn kind(&self) -> DatasourceKind {
        self.kind
    }

    fn extent(&self) -> Option<Extent> {
        self.extent
    }

    fn features(&self, extent: &Extent) -> Vec<Feature> {
        self.features
            .iter()
            .filter(|feature| {
                feature
                    .extent()
                    .is_some_and(|bbox| bbox.intersects(extent))
            })
            .cloned()
            .collect()
    }
}

/// Reads the content of a file-or-inline datasource parameter set.
pub(crate) fn source_text(params: &Parameters) -> Result<String, CartaError> {
    if let Some(inline) = params.get_str("inline") {
        return Ok(inline.to_string());
    }

    let path = params.resolved_file().ok_or_else(|| {
        CartaError::InvalidArgument(format!(
            "one of 'file' or 'inline' is required for {} backends",
            params.kind()
        ))
    })?;

    std::fs::read_to_string(&path).map_err(|err| {
        CartaError::DatasourceConstruction(format!("failed to read '{}': {err}", path.display()))
    })
}
