//! Error types for the `furrow-world` crate.
//!
//! Physics never fails: only catalog loading, grid construction and image
//! encoding can return a [`WorldError`].

/// Errors that can occur while loading the catalog, building a grid or
/// encoding a layer image.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// Failed to read a catalog manifest from disk.
    #[error("failed to read catalog manifest: {source}")]
    CatalogIo {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse a catalog manifest.
    #[error("failed to parse catalog YAML: {source}")]
    CatalogYaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The catalog parsed but its contents are inconsistent.
    #[error("invalid catalog: {reason}")]
    InvalidCatalog {
        /// Explanation of what is wrong.
        reason: String,
    },

    /// The requested region code is not in the catalog.
    #[error("unknown region: {0}")]
    UnknownRegion(String),

    /// A grid side length of zero, or one whose cell count overflows.
    #[error("invalid grid size: {0}")]
    InvalidGridSize(usize),

    /// A cell array does not match the declared grid size.
    #[error("grid of side {size} needs {expected} cells, got {actual}")]
    CellCountMismatch {
        /// Declared side length.
        size: usize,
        /// Cells required.
        expected: usize,
        /// Cells supplied.
        actual: usize,
    },

    /// A raster whose pixel buffer does not match its dimensions.
    #[error("raster of {width}x{height} cannot hold {pixels} pixels")]
    RasterShape {
        /// Width in pixels.
        width: usize,
        /// Height in pixels.
        height: usize,
        /// Pixels supplied.
        pixels: usize,
    },

    /// The PNG encoder failed.
    #[error("failed to encode layer image: {source}")]
    ImageEncode {
        /// The underlying encoder error.
        #[from]
        source: image::ImageError,
    },
}

impl From<serde_yml::Error> for WorldError {
    fn from(source: serde_yml::Error) -> Self {
        Self::CatalogYaml { source }
    }
}
