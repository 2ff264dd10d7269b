use std::sync::{Arc, LazyLock};

use ahash::{HashMap, HashMapExt};
use parking_lot::RwLock;

use super::{csv, geojson, Datasource, DatasourceKind, Parameters};
use crate::error::CartaError;

/// Constructor turning a validated parameter set into a live datasource.
pub type BackendConstructor =
    Arc<dyn Fn(&Parameters) -> Result<Arc<dyn Datasource>, CartaError> + Send + Sync>;

/// Registry of datasource backends, keyed by [`DatasourceKind`].
///
/// The process-wide registry ([`DatasourceRegistry::global`]) comes with the
/// `geojson` and `csv` backends preregistered; `shape` and `postgis` are
/// recognized kinds without a built-in reader and can be provided at runtime
/// through [`DatasourceRegistry::register`].
pub struct DatasourceRegistry {
    backends: RwLock<HashMap<DatasourceKind, BackendConstructor>>,
}

static GLOBAL: LazyLock<DatasourceRegistry> = LazyLock::new(DatasourceRegistry::with_defaults);

impl DatasourceRegistry {
    /// Creates a registry with no backends at all.
    pub fn empty() -> Self {
        Self {
            backends: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a registry with the built-in backends registered.
    pub fn with_defaults() -> Self {
        let registry = Self::empty();
        registry.register(DatasourceKind::GeoJson, Arc::new(geojson::create));
        registry.register(DatasourceKind::Csv, Arc::new(csv::create));
        registry
    }

    /// The process-wide registry used by [`create_datasource`].
    pub fn global() -> &'static DatasourceRegistry {
        &GLOBAL
    }

    /// Registers (or replaces) the backend for `kind`.
    pub fn register(&self, kind: DatasourceKind, constructor: BackendConstructor) {
        self.backends.write().insert(kind, constructor);
    }

    /// True if a backend for `kind` is registered.
    pub fn is_registered(&self, kind: DatasourceKind) -> bool {
        self.backends.read().contains_key(&kind)
    }

    /// Constructs a datasource from `params`.
    ///
    /// Backend-mandatory parameters are validated before the backend runs;
    /// a missing mandatory field is reported as
    /// [`CartaError::InvalidArgument`] without invoking the backend. A
    /// missing backend and any backend-reported fault are both
    /// [`CartaError::DatasourceConstruction`], distinguished only by their
    /// message.
    pub fn create(&self, params: &Parameters) -> Result<Arc<dyn Datasource>, CartaError> {
        validate(params)?;

        let constructor = self.backends.read().get(&params.kind()).cloned();
        let constructor = constructor.ok_or_else(|| {
            CartaError::DatasourceConstruction(format!(
                "no backend registered for '{}' datasources",
                params.kind()
            ))
        })?;

        constructor(params)
    }
}

/// Constructs a datasource through the process-wide backend registry.
pub fn create_datasource(params: &Parameters) -> Result<Arc<dyn Datasource>, CartaError> {
    DatasourceRegistry::global().create(params)
}

fn validate(params: &Parameters) -> Result<(), CartaError> {
    match params.kind() {
        DatasourceKind::Shape => require(params, "file"),
        DatasourceKind::Postgis => {
            require(params, "host")?;
            require(params, "dbname")?;
            require(params, "table")
        }
        DatasourceKind::GeoJson | DatasourceKind::Csv => require_file_or_inline(params),
    }
}

fn require(params: &Parameters, key: &str) -> Result<(), CartaError> {
    if params.has_nonempty(key) {
        Ok(())
    } else {
        Err(CartaError::InvalidArgument(format!(
            "datasource parameter '{key}' is required for {} backends",
            params.kind()
        )))
    }
}

fn require_file_or_inline(params: &Parameters) -> Result<(), CartaError> {
    match (params.has_nonempty("file"), params.has_nonempty("inline")) {
        (true, false) | (false, true) => Ok(()),
        (true, true) => Err(CartaError::InvalidArgument(format!(
            "datasource parameters 'file' and 'inline' are mutually exclusive for {} backends",
            params.kind()
        ))),
        (false, false) => Err(CartaError::InvalidArgument(format!(
            "one of 'file' or 'inline' is required for {} backends",
            params.kind()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::datasource::{Feature, MemoryDatasource};

    #[test]
    fn missing_mandatory_field_fails_before_backend_runs() {
        let registry = DatasourceRegistry::empty();

        // An empty registry would report a missing backend, so an
        // InvalidArgument here proves validation ran first.
        let missing_table = Parameters::postgis("localhost", "gis", "");
        let err = registry.create(&missing_table).expect_err("must fail");
        assert_matches!(err, CartaError::InvalidArgument(message) => {
            assert!(message.contains("table"));
        });

        let no_source = Parameters::new(DatasourceKind::GeoJson);
        assert_matches!(
            registry.create(&no_source),
            Err(CartaError::InvalidArgument(_))
        );
    }

    #[test]
    fn file_and_inline_are_mutually_exclusive() {
        let mut params = Parameters::csv_inline("x,y\n1,2");
        params.set("file", "points.csv");
        assert_matches!(
            DatasourceRegistry::global().create(&params),
            Err(CartaError::InvalidArgument(_))
        );
    }

    #[test]
    fn unregistered_backend_is_a_construction_failure() {
        let params = Parameters::shape("roads.shp");
        let err = create_datasource(&params).expect_err("no shape backend built in");
        assert_matches!(err, CartaError::DatasourceConstruction(ref message) => {
            assert!(message.contains("shape"));
        });
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn runtime_registration_adds_a_backend() {
        let registry = DatasourceRegistry::empty();
        assert!(!registry.is_registered(DatasourceKind::Shape));

        registry.register(
            DatasourceKind::Shape,
            Arc::new(|_: &Parameters| {
                Ok(Arc::new(MemoryDatasource::new(DatasourceKind::Shape, Vec::<Feature>::new()))
                    as Arc<dyn Datasource>)
            }),
        );

        assert!(registry.is_registered(DatasourceKind::Shape));
        let ds = registry
            .create(&Parameters::shape("roads.shp"))
            .expect("registered backend");
        assert_eq!(ds.kind(), DatasourceKind::Shape);
    }

    #[test]
    fn global_registry_has_builtin_backends() {
        let registry = DatasourceRegistry::global();
        assert!(registry.is_registered(DatasourceKind::GeoJson));
        assert!(registry.is_registered(DatasourceKind::Csv));
        assert!(!registry.is_registered(DatasourceKind::Postgis));
    }
}
