//! Rendering manifests back to text.

use thiserror::Error;

use super::Manifest;

/// Errors that can occur when rendering a manifest to text.
#[derive(Debug, Error)]
pub enum FormatError {
    /// The serializer rejected the manifest.
    #[error("failed to serialize manifest")]
    Serialize(#[source] serde_json::Error),
}

/// Renders a manifest into the text committed to the repository.
pub trait ManifestFormatter {
    /// Canonicalize the manifest into its serialized form.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest cannot be serialized.
    fn format(&self, manifest: &Manifest) -> Result<String, FormatError>;
}
