use serde::{Deserialize, Serialize};

/// Behavior switches of a loaded specification.
///
/// Every field has a default, so a partial configuration can be deserialized:
///
/// ```rust
/// use swagflow_core::SpecConfig;
///
/// let config: SpecConfig = serde_json::from_str(r#"{"validate_responses": false}"#)?;
/// assert!(!config.validate_responses);
/// assert!(!config.also_return_response);
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecConfig {
    /// Validate decoded response payloads against the declared schema.
    pub validate_responses: bool,

    /// Return the incoming response alongside the decoded value.
    pub also_return_response: bool,

    /// Fill properties declared in the schema but absent from the payload.
    ///
    /// Missing properties get their declared `default`, or `null`.
    pub include_missing_properties: bool,

    /// Derive the base path from the specification URL when the document has none.
    pub use_spec_url_for_base_path: bool,
}

impl Default for SpecConfig {
    fn default() -> Self {
        Self {
            validate_responses: true,
            also_return_response: false,
            include_missing_properties: false,
            use_spec_url_for_base_path: false,
        }
    }
}
