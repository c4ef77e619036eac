//! Identifier extraction from rendered pages
//!
//! The extraction script runs inside the page and returns whatever the
//! storefront keeps in memory. Only an array of records is meaningful; every
//! other shape, and any evaluation failure, yields an empty sequence.

use crate::render::RenderSession;
use serde_json::Value;

/// Evaluates the extraction script and maps its result to identifiers
#[derive(Debug, Clone)]
pub struct IdentifierExtractor {
    script: String,
    field: String,
}

impl IdentifierExtractor {
    /// Creates an extractor
    ///
    /// # Arguments
    ///
    /// * `script` - JavaScript expression evaluated in the page
    /// * `field` - Field of each returned record holding the identifier
    pub fn new(script: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            field: field.into(),
        }
    }

    /// Extracts identifiers from the session's current page
    ///
    /// Never fails: evaluation errors are logged and map to an empty sequence.
    pub async fn extract<S: RenderSession + ?Sized>(&self, session: &mut S) -> Vec<String> {
        match session.evaluate(&self.script).await {
            Ok(value) => self.identifiers_from(&value),
            Err(e) => {
                tracing::debug!("Extraction script failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Maps an evaluation result to an ordered identifier sequence
    ///
    /// All or nothing: a single record without a usable identifier makes the
    /// whole page empty, so the first identifier is always the page's first
    /// record. Numeric identifiers are rendered as strings.
    pub fn identifiers_from(&self, value: &Value) -> Vec<String> {
        let Some(records) = value.as_array() else {
            return Vec::new();
        };

        let identifiers: Option<Vec<String>> = records
            .iter()
            .map(|record| match record.get(&self.field)? {
                Value::String(id) if !id.is_empty() => Some(id.clone()),
                Value::Number(id) => Some(id.to_string()),
                _ => None,
            })
            .collect();

        identifiers.unwrap_or_else(|| {
            tracing::debug!("Record without '{}' in extraction result", self.field);
            Vec::new()
        })
    }
}
