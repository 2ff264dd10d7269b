//! Error types used by the crate.

use thiserror::Error;

/// Carta error type.
///
/// Every fallible operation of the crate reports its failure through this
/// enum; nothing is surfaced through side channels or panics.
#[derive(Debug, Error)]
pub enum CartaError {
    /// A required argument was missing, empty or malformed. Detected before
    /// any collaborator is invoked.
    #[error("{0}")]
    InvalidArgument(String),

    /// A datasource backend could not construct a datasource from the given
    /// parameters. The message is forwarded from the backend verbatim.
    #[error("failed to create datasource: {0}")]
    DatasourceConstruction(String),

    /// A map or style document could not be parsed.
    #[error("failed to parse document: {0}")]
    DocumentParse(String),

    /// A style with the given name was not present in the parsed document.
    #[error("style '{0}' not found in document")]
    StyleNotFound(String),

    /// The vector rendering backend is not compiled in (`vector` feature).
    #[error("vector rendering backend is not enabled")]
    VectorUnavailable,

    /// A raster render target does not match the map's dimensions.
    #[error(
        "render target size {target_width}x{target_height} does not match map size {map_width}x{map_height}"
    )]
    TargetSizeMismatch {
        /// Width of the map being rendered.
        map_width: u32,
        /// Height of the map being rendered.
        map_height: u32,
        /// Width of the given render target.
        target_width: u32,
        /// Height of the given render target.
        target_height: u32,
    },

    /// Image encoding error.
    #[error("image encoding failed: {0}")]
    ImageEncode(#[from] image::ImageError),

    /// Error reading/writing data to the FS.
    #[error("failed to read or write file: {0}")]
    FsIo(#[from] std::io::Error),

    /// Generic error - details are inside.
    #[error("{0}")]
    Generic(String),
}
