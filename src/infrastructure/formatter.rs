//! JSON rendering of manifests.

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::domain::{FormatError, Manifest, ManifestFormatter};

/// Renders manifests the way npm writes `package.json`: two-space indentation,
/// original key order and a trailing newline.
#[derive(Debug, Clone)]
pub struct JsonFormatter {
    /// Whitespace written per nesting level.
    indent: String,
}

impl JsonFormatter {
    /// A formatter indenting with `width` spaces.
    #[must_use]
    pub fn with_indent(width: usize) -> Self {
        Self {
            indent: " ".repeat(width),
        }
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::with_indent(2)
    }
}

impl ManifestFormatter for JsonFormatter {
    fn format(&self, manifest: &Manifest) -> Result<String, FormatError> {
        let mut buffer = Vec::new();
        let formatter = PrettyFormatter::with_indent(self.indent.as_bytes());
        let mut serializer = Serializer::with_formatter(&mut buffer, formatter);
        manifest
            .as_map()
            .serialize(&mut serializer)
            .map_err(FormatError::Serialize)?;

        // serde_json only ever writes UTF-8
        let mut text = String::from_utf8_lossy(&buffer).into_owned();
        text.push('\n');
        Ok(text)
    }
}
