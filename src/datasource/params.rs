use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::DatasourceKind;

/// Value of a single datasource parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Integer parameter (port numbers, SRIDs).
    Int(i64),
    /// String parameter (paths, credentials, inline content).
    String(String),
}

impl ParamValue {
    /// The string content, if this is a string parameter.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::String(value) => Some(value),
            ParamValue::Int(_) => None,
        }
    }

    /// The integer content, if this is an integer parameter.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(value) => Some(*value),
            ParamValue::String(_) => None,
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::String(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::String(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

/// Typed parameter set describing one datasource to construct.
///
/// A parameter set pairs a backend [`DatasourceKind`] with string/int
/// key-values. The typed constructors set the backend-mandatory fields;
/// the `with_*` builder methods add optional ones and silently skip values
/// the backends would ignore anyway (empty strings, non-positive port/SRID
/// numbers).
///
/// File-backed and inline construction are mutually exclusive: a parameter
/// set carries either a `file` or an `inline` entry, never both.
///
/// ```
/// use carta::datasource::Parameters;
///
/// let params = Parameters::postgis("localhost", "gis", "roads")
///     .with_user("render")
///     .with_port(5432)
///     .with_srid(0); // non-positive, not forwarded
///
/// assert_eq!(params.get_str("user"), Some("render"));
/// assert_eq!(params.get("srid"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    kind: DatasourceKind,
    #[serde(flatten)]
    values: BTreeMap<String, ParamValue>,
}

impl Parameters {
    /// Creates an empty parameter set for the given backend.
    pub fn new(kind: DatasourceKind) -> Self {
        Self {
            kind,
            values: BTreeMap::new(),
        }
    }

    /// Parameters for a shapefile datasource reading `path`.
    pub fn shape(path: impl Into<String>) -> Self {
        let mut params = Self::new(DatasourceKind::Shape);
        params.set_nonempty("file", path.into());
        params
    }

    /// Parameters for a PostGIS datasource.
    ///
    /// `table` may be a plain table name, a `schema.table` pair or a
    /// subquery in the form `(SELECT ...) as alias`.
    pub fn postgis(
        host: impl Into<String>,
        dbname: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        let mut params = Self::new(DatasourceKind::Postgis);
        params.set_nonempty("host", host.into());
        params.set_nonempty("dbname", dbname.into());
        params.set_nonempty("table", table.into());
        params
    }

    /// Parameters for a GeoJSON datasource reading `path`.
    pub fn geojson_file(path: impl Into<String>) -> Self {
        let mut params = Self::new(DatasourceKind::GeoJson);
        params.set_nonempty("file", path.into());
        params
    }

    /// Parameters for a GeoJSON datasource over the given document text.
    pub fn geojson_inline(json: impl Into<String>) -> Self {
        let mut params = Self::new(DatasourceKind::GeoJson);
        params.set_nonempty("inline", json.into());
        params
    }

    /// Parameters for a CSV datasource reading `path`.
    pub fn csv_file(path: impl Into<String>) -> Self {
        let mut params = Self::new(DatasourceKind::Csv);
        params.set_nonempty("file", path.into());
        params
    }

    /// Parameters for a CSV datasource over the given text.
    pub fn csv_inline(csv: impl Into<String>) -> Self {
        let mut params = Self::new(DatasourceKind::Csv);
        params.set_nonempty("inline", csv.into());
        params
    }

    /// Backend kind this parameter set is for.
    pub fn kind(&self) -> DatasourceKind {
        self.kind
    }

    /// Text encoding hint for file-backed sources. Skipped when empty.
    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.set_nonempty("encoding", encoding.into());
        self
    }

    /// Base directory for resolving a relative `file` path. Skipped when empty.
    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.set_nonempty("base", base.into());
        self
    }

    /// Database user. Skipped when empty.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.set_nonempty("user", user.into());
        self
    }

    /// Database password. Skipped when empty.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.set_nonempty("password", password.into());
        self
    }

    /// Name of the geometry column. Skipped when empty.
    pub fn with_geometry_field(mut self, field: impl Into<String>) -> Self {
        self.set_nonempty("geometry_field", field.into());
        self
    }

    /// Database port. Forwarded only when strictly positive.
    pub fn with_port(mut self, port: i64) -> Self {
        if port > 0 {
            self.values.insert("port".to_string(), ParamValue::Int(port));
        }
        self
    }

    /// Spatial reference identifier. Forwarded only when strictly positive.
    pub fn with_srid(mut self, srid: i64) -> Self {
        if srid > 0 {
            self.values.insert("srid".to_string(), ParamValue::Int(srid));
        }
        self
    }

    /// Sets an arbitrary backend-defined parameter.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.values.insert(key.into(), value.into());
    }

    /// Returns the parameter stored under `key`.
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key)
    }

    /// Returns the string parameter stored under `key`.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(ParamValue::as_str)
    }

    /// Iterates over all stored parameters in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(key, value)| (key.as_str(), value))
    }

    fn set_nonempty(&mut self, key: &str, value: String) {
        if !value.is_empty() {
            self.values.insert(key.to_string(), ParamValue::String(value));
        }
    }

    pub(crate) fn has_nonempty(&self, key: &str) -> bool {
        match self.get(key) {
            Some(ParamValue::String(value)) => !value.is_empty(),
            Some(ParamValue::Int(_)) => true,
            None => false,
        }
    }

    /// The `file` parameter resolved against the `base` parameter when the
    /// path is relative.
    pub(crate) fn resolved_file(&self) -> Option<PathBuf> {
        let file = PathBuf::from(self.get_str("file")?);
        match self.get_str("base") {
            Some(base) if file.is_relative() => Some(PathBuf::from(base).join(file)),
            _ => Some(file),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_port_and_srid_are_forwarded() {
        let params = Parameters::postgis("db.example.com", "gis", "roads")
            .with_port(5433)
            .with_srid(3857);

        assert_eq!(params.get("port"), Some(&ParamValue::Int(5433)));
        assert_eq!(params.get("srid"), Some(&ParamValue::Int(3857)));
    }

    #[test]
    fn non_positive_port_and_srid_are_skipped() {
        let params = Parameters::postgis("db.example.com", "gis", "roads")
            .with_port(0)
            .with_srid(-1);

        assert_eq!(params.get("port"), None);
        assert_eq!(params.get("srid"), None);
    }

    #[test]
    fn empty_optional_strings_are_skipped() {
        let params = Parameters::shape("roads.shp").with_encoding("").with_base("");
        assert_eq!(params.get("encoding"), None);
        assert_eq!(params.get("base"), None);

        let params = Parameters::shape("roads.shp").with_encoding("UTF-8");
        assert_eq!(params.get_str("encoding"), Some("UTF-8"));
    }

    #[test]
    fn relative_file_resolves_against_base() {
        let params = Parameters::csv_file("points.csv").with_base("/data/maps");
        assert_eq!(
            params.resolved_file(),
            Some(PathBuf::from("/data/maps/points.csv"))
        );

        let params = Parameters::csv_file("/absolute/points.csv").with_base("/data/maps");
        assert_eq!(
            params.resolved_file(),
            Some(PathBuf::from("/absolute/points.csv"))
        );
    }

    #[test]
    fn document_form_round_trips() {
        let json = r#"{"kind":"postgis","host":"localhost","dbname":"gis","table":"roads","port":5432}"#;
        let params: Parameters = serde_json::from_str(json).expect("valid parameters");
        assert_eq!(params.kind(), DatasourceKind::Postgis);
        assert_eq!(params.get("port"), Some(&ParamValue::Int(5432)));

        let back = serde_json::to_string(&params).expect("serializable");
        let reparsed: Parameters = serde_json::from_str(&back).expect("round trip");
        assert_eq!(reparsed, params);
    }
}
