use std::fmt;
use std::sync::Arc;

use crate::datasource::Datasource;

/// A named compositing unit of a [`Map`](crate::Map).
///
/// A layer pairs at most one datasource with an ordered list of style names
/// and an optional spatial reference. Style names are resolved lazily
/// against the owning map's style table when the map is rendered, so a
/// layer may reference styles that do not exist yet; names that never
/// resolve simply contribute nothing.
///
/// Layers have value semantics: adding a layer to a map moves (or clones)
/// its current state, and later changes to another copy do not affect the
/// map. Clones share the underlying datasource.
#[derive(Clone, Default)]
pub struct Layer {
    name: String,
    srs: Option<String>,
    datasource: Option<Arc<dyn Datasource>>,
    styles: Vec<String>,
}

impl Layer {
    /// Creates a new layer with the given name. The name may be empty.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Sets the spatial reference identifier of the layer.
    pub fn with_srs(mut self, srs: impl Into<String>) -> Self {
        self.srs = Some(srs.into());
        self
    }

    /// Name of the layer.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Spatial reference identifier of the layer, if set.
    pub fn srs(&self) -> Option<&str> {
        self.srs.as_deref()
    }

    /// Binds the layer to a datasource, replacing any previous binding.
    ///
    /// The datasource is shared, not copied: the same datasource may be
    /// attached to any number of layers.
    pub fn set_datasource(&mut self, datasource: Arc<dyn Datasource>) {
        self.datasource = Some(datasource);
    }

    /// The datasource the layer is bound to, if any.
    pub fn datasource(&self) -> Option<&Arc<dyn Datasource>> {
        self.datasource.as_ref()
    }

    /// Appends a style name to the layer's style list.
    ///
    /// Later styles paint on top of earlier ones. The name is not checked
    /// against any style table here; resolution is deferred to render time.
    pub fn add_style(&mut self, name: impl Into<String>) {
        self.styles.push(name.into());
    }

    /// Style names of the layer, in paint order.
    pub fn styles(&self) -> &[String] {
        &self.styles
    }

    /// Removes all style names from the layer.
    pub fn clear_styles(&mut self) {
        self.styles.clear();
    }
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer")
            .field("name", &self.name)
            .field("srs", &self.srs)
            .field("datasource", &self.datasource.as_ref().map(|ds| ds.kind()))
            .field("styles", &self.styles)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::{create_datasource, Parameters};

    #[test]
    fn styles_keep_insertion_order_and_duplicates() {
        let mut layer = Layer::new("roads");
        layer.add_style("casing");
        layer.add_style("fill");
        layer.add_style("casing");

        assert_eq!(layer.styles(), &["casing", "fill", "casing"][..]);

        layer.clear_styles();
        assert!(layer.styles().is_empty());
    }

    #[test]
    fn clones_share_the_datasource() {
        let ds = create_datasource(&Parameters::csv_inline("x,y\n0,0\n")).expect("valid csv");
        let mut layer = Layer::new("points");
        layer.set_datasource(ds.clone());

        let copy = layer.clone();
        let original = layer.datasource().expect("datasource attached");
        let cloned = copy.datasource().expect("datasource attached");
        assert!(Arc::ptr_eq(original, cloned));
    }

    #[test]
    fn empty_name_and_missing_srs_are_legal() {
        let layer = Layer::new("");
        assert_eq!(layer.name(), "");
        assert_eq!(layer.srs(), None);
        assert!(layer.datasource().is_none());
    }
}
