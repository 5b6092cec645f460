//! Error type shared by the loader, renderer and output stages.

use std::path::PathBuf;

use thiserror::Error;

/// Failures that abort report generation.
///
/// Missing or empty record fields are not errors; they resolve to the
/// placeholder in [`crate::record::IncidentRecord::display`].
#[derive(Debug, Error)]
pub enum ReportError {
    /// The input could not be parsed as a JSON object.
    #[error("incident record is not a valid JSON object")]
    MalformedInput(#[from] serde_json::Error),

    /// A field held a nested array or object instead of a scalar.
    #[error("field '{field}' holds a nested {kind}; only scalar values are supported")]
    UnsupportedValue {
        /// Name of the offending field.
        field: String,
        /// JSON kind that was found.
        kind: &'static str,
    },

    /// The required font faces could not be located or parsed.
    #[error("failed to load report fonts")]
    Fonts(#[source] genpdf::error::Error),

    /// The configured logo could not be decoded.
    #[error("failed to load logo image {}", path.display())]
    Logo {
        /// Path of the logo image.
        path: PathBuf,
        /// Decoder error.
        #[source]
        source: genpdf::error::Error,
    },

    /// Layout or serialization failed inside the PDF engine.
    #[error("failed to render PDF")]
    Render(#[source] genpdf::error::Error),

    /// Reading the input or writing the output failed.
    #[error("I/O error on {}", path.display())]
    Io {
        /// Path being read or written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Section outlines could not be embedded into the rendered PDF.
    #[cfg(feature = "bookmarks")]
    #[error("failed to embed section bookmarks")]
    Bookmarks(#[from] crate::bookmarks::BookmarkError),
}

impl ReportError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
