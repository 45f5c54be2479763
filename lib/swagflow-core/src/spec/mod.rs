//! The specification document and its configuration.
//!
//! A [`Spec`] owns the root document, the remote documents fetched while
//! following `$ref`s, the URL the document was loaded from and the
//! [`SpecConfig`]. It is immutable once built and shared through an `Arc`
//! by every operation of a client.

use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use percent_encoding::percent_decode_str;
use serde_json::Value;
use url::Url;

use crate::SwaggerClientError;

mod config;
pub use self::config::SpecConfig;

mod loader;
pub use self::loader::{LoadedSpec, Loader, load_file, load_url, spec_location};

mod model;
pub use self::model::unmarshal_schema_object;

mod validate;
pub use self::validate::{JsonSchemaValidator, ResponseValidator, ValidationError};

/// Nesting limit when inlining references.
const MAX_REF_DEPTH: usize = 64;

/// A `$ref` that cannot be followed.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("Cannot resolve '{reference}': {reason}")]
pub struct RefError {
    reference: String,
    reason: String,
}

impl RefError {
    fn new(reference: &str, reason: impl Into<String>) -> Self {
        Self {
            reference: reference.to_string(),
            reason: reason.into(),
        }
    }

    /// The reference that failed.
    pub fn reference(&self) -> &str {
        &self.reference
    }
}

/// A loaded API specification.
#[derive(derive_more::Debug)]
pub struct Spec {
    document: Value,
    origin_url: Option<Url>,
    documents: IndexMap<Url, Value>,
    config: SpecConfig,
    #[debug(skip)]
    validator: Arc<dyn ResponseValidator>,
}

impl Spec {
    /// Creates a specification from an in-memory document.
    ///
    /// `origin_url` is where the document comes from; it serves as base for
    /// relative references and as fallback for the API URL.
    pub fn from_document(document: Value, origin_url: Option<Url>, config: SpecConfig) -> Self {
        Self {
            document,
            origin_url,
            documents: IndexMap::new(),
            config,
            validator: Arc::new(JsonSchemaValidator),
        }
    }

    /// Creates a specification from the result of a [`Loader`].
    pub fn from_loaded(loaded: LoadedSpec, config: SpecConfig) -> Self {
        let LoadedSpec {
            document,
            origin_url,
            documents,
        } = loaded;
        Self {
            documents,
            ..Self::from_document(document, Some(origin_url), config)
        }
    }

    /// Replaces the validator used when `validate_responses` is enabled.
    #[must_use]
    pub fn with_validator(mut self, validator: Arc<dyn ResponseValidator>) -> Self {
        self.validator = validator;
        self
    }

    /// The root document.
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Where the root document comes from.
    pub fn origin_url(&self) -> Option<&Url> {
        self.origin_url.as_ref()
    }

    /// The remote documents fetched while loading, keyed by URL.
    pub fn remote_documents(&self) -> &IndexMap<Url, Value> {
        &self.documents
    }

    /// The configuration.
    pub fn config(&self) -> &SpecConfig {
        &self.config
    }

    /// The response validator.
    pub fn validator(&self) -> &dyn ResponseValidator {
        self.validator.as_ref()
    }

    /// Tells whether this is an OpenAPI 3 document, rather than Swagger 2.0.
    pub fn is_openapi_3(&self) -> bool {
        self.document.get("openapi").is_some()
    }

    /// Follows `$ref`s from the root document until a concrete value is found.
    ///
    /// # Errors
    ///
    /// Fails if a reference targets an unknown document or a missing pointer.
    pub fn deref<'a>(&'a self, value: &'a Value) -> Result<&'a Value, RefError> {
        self.deref_from(None, value).map(|(_, value)| value)
    }

    /// Same as [`deref`](Self::deref), also returning the document holding the value.
    pub(crate) fn deref_from<'a>(
        &'a self,
        base: Option<&Url>,
        value: &'a Value,
    ) -> Result<(Option<Url>, &'a Value), RefError> {
        let mut base = base.cloned();
        let mut current = value;
        for _ in 0..MAX_REF_DEPTH {
            let Some(reference) = ref_of(current) else {
                return Ok((base, current));
            };
            let (target_base, target) = self.resolve_ref(base.as_ref(), reference)?;
            base = target_base;
            current = target;
        }
        Err(RefError::new(
            ref_of(current).unwrap_or_default(),
            "too many chained references",
        ))
    }

    /// Returns a copy of the schema with every `$ref` inlined.
    ///
    /// Recursive references are replaced by the empty schema `{}`.
    ///
    /// # Errors
    ///
    /// Fails if a reference cannot be followed.
    pub fn resolve_schema(&self, schema: &Value) -> Result<Value, RefError> {
        let mut visiting = IndexSet::new();
        self.inline(None, schema, &mut visiting)
    }

    fn inline(
        &self,
        base: Option<&Url>,
        value: &Value,
        visiting: &mut IndexSet<String>,
    ) -> Result<Value, RefError> {
        match value {
            Value::Object(object) => {
                if let Some(reference) = ref_of(value) {
                    let key = self.absolute_ref(base, reference);
                    if visiting.contains(&key) || visiting.len() >= MAX_REF_DEPTH {
                        return Ok(Value::Object(serde_json::Map::new()));
                    }
                    let (target_base, target) = self.resolve_ref(base, reference)?;
                    visiting.insert(key.clone());
                    let inlined = self.inline(target_base.as_ref(), target, visiting);
                    visiting.shift_remove(&key);
                    return inlined;
                }
                let mut result = serde_json::Map::with_capacity(object.len());
                for (name, item) in object {
                    result.insert(name.clone(), self.inline(base, item, visiting)?);
                }
                Ok(Value::Object(result))
            }
            Value::Array(items) => items
                .iter()
                .map(|item| self.inline(base, item, visiting))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            other => Ok(other.clone()),
        }
    }

    fn absolute_ref(&self, base: Option<&Url>, reference: &str) -> String {
        match base.or(self.origin_url.as_ref()) {
            Some(base) => base
                .join(reference)
                .map_or_else(|_| reference.to_string(), String::from),
            None => reference.to_string(),
        }
    }

    fn resolve_ref<'a>(
        &'a self,
        base: Option<&Url>,
        reference: &str,
    ) -> Result<(Option<Url>, &'a Value), RefError> {
        let (location, fragment) = reference.split_once('#').unwrap_or((reference, ""));

        let (document_url, document) = if location.is_empty() {
            let document = base
                .and_then(|base| self.documents.get(&without_fragment(base)))
                .unwrap_or(&self.document);
            (base.cloned(), document)
        } else {
            let target = match base.or(self.origin_url.as_ref()) {
                Some(base) => base.join(location),
                None => Url::parse(location),
            }
            .map_err(|err| RefError::new(reference, err.to_string()))?;
            let target = without_fragment(&target);
            if let Some(document) = self.documents.get(&target) {
                (Some(target), document)
            } else if self.origin_url.as_ref().map(without_fragment) == Some(target.clone()) {
                (Some(target), &self.document)
            } else {
                return Err(RefError::new(reference, "unknown document"));
            }
        };

        let pointer = percent_decode_str(fragment).decode_utf8_lossy();
        let value = if pointer.is_empty() {
            document
        } else {
            document
                .pointer(&pointer)
                .ok_or_else(|| RefError::new(reference, "no value at this pointer"))?
        };
        Ok((document_url, value))
    }

    /// Builds the URL requests are sent to.
    ///
    /// Swagger 2.0 documents use `schemes`, `host` and `basePath`; OpenAPI 3
    /// documents use the first of `servers`. Missing parts come from the URL
    /// the document was loaded from.
    ///
    /// # Errors
    ///
    /// Fails when neither the document nor its origin provide a host.
    pub fn api_url(&self) -> Result<Url, SwaggerClientError> {
        if self.is_openapi_3() {
            self.openapi_api_url()
        } else {
            self.swagger_api_url()
        }
    }

    fn default_base_path(&self) -> String {
        match (&self.origin_url, self.config.use_spec_url_for_base_path) {
            (Some(origin), true) => {
                let path = origin.path();
                path.rsplit_once('/')
                    .map_or_else(|| "/".to_string(), |(dir, _)| format!("{dir}/"))
            }
            _ => "/".to_string(),
        }
    }

    fn swagger_api_url(&self) -> Result<Url, SwaggerClientError> {
        let origin = self.origin_url.as_ref();
        let schemes = self
            .document
            .get("schemes")
            .and_then(Value::as_array)
            .map(|schemes| schemes.iter().filter_map(Value::as_str).collect::<Vec<_>>())
            .unwrap_or_default();
        let scheme = match origin.map(Url::scheme) {
            Some(scheme) if schemes.is_empty() || schemes.contains(&scheme) => scheme,
            _ => schemes.first().copied().unwrap_or("http"),
        };

        let host = match self.document.get("host").and_then(Value::as_str) {
            Some(host) => host.to_string(),
            None => origin
                .and_then(|origin| {
                    let host = origin.host_str()?;
                    Some(match origin.port() {
                        Some(port) => format!("{host}:{port}"),
                        None => host.to_string(),
                    })
                })
                .ok_or_else(|| SwaggerClientError::MissingApiUrl {
                    reason: "no 'host' in the specification and no origin URL".to_string(),
                })?,
        };

        let base_path = self
            .document
            .get("basePath")
            .and_then(Value::as_str)
            .map_or_else(|| self.default_base_path(), ToString::to_string);

        let url = Url::parse(&format!("{scheme}://{host}"))?;
        Ok(url.join(&base_path)?)
    }

    fn openapi_api_url(&self) -> Result<Url, SwaggerClientError> {
        let server = self
            .document
            .pointer("/servers/0/url")
            .and_then(Value::as_str);

        match (server, &self.origin_url) {
            (Some(server), _) if Url::parse(server).is_ok() => Ok(Url::parse(server)?),
            (Some(server), Some(origin)) => Ok(origin.join(server)?),
            (None, Some(origin)) => Ok(origin.join(&self.default_base_path())?),
            (_, None) => Err(SwaggerClientError::MissingApiUrl {
                reason: "no absolute server URL in the specification and no origin URL"
                    .to_string(),
            }),
        }
    }
}

fn ref_of(value: &Value) -> Option<&str> {
    value.get("$ref").and_then(Value::as_str)
}

fn without_fragment(url: &Url) -> Url {
    let mut url = url.clone();
    url.set_fragment(None);
    url
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn spec(document: Value, origin: Option<&str>) -> Spec {
        let origin = origin.map(|origin| origin.parse().expect("valid url"));
        Spec::from_document(document, origin, SpecConfig::default())
    }

    #[test]
    fn should_deref_local_reference() {
        let spec = spec(
            json!({
                "definitions": {
                    "Pet": {"type": "object"},
                    "Alias": {"$ref": "#/definitions/Pet"}
                }
            }),
            None,
        );

        let alias = json!({"$ref": "#/definitions/Alias"});
        let value = spec.deref(&alias).expect("resolved");

        assert_eq!(value, &json!({"type": "object"}));
    }

    #[test]
    fn should_fail_on_missing_pointer() {
        let spec = spec(json!({"definitions": {}}), None);

        let error = spec
            .deref(&json!({"$ref": "#/definitions/Missing"}))
            .expect_err("missing");

        insta::assert_snapshot!(error, @"Cannot resolve '#/definitions/Missing': no value at this pointer");
    }

    #[test]
    fn should_deref_remote_reference() {
        let mut spec = spec(json!({}), Some("http://api.test/spec/swagger.json"));
        spec.documents.insert(
            "http://api.test/spec/models.json".parse().expect("valid url"),
            json!({"Pet": {"properties": {"tag": {"$ref": "#/Tag"}}}, "Tag": {"type": "string"}}),
        );

        let resolved = spec
            .resolve_schema(&json!({"$ref": "models.json#/Pet"}))
            .expect("resolved");

        assert_eq!(
            resolved,
            json!({"properties": {"tag": {"type": "string"}}})
        );
    }

    #[test]
    fn should_break_recursive_references() {
        let spec = spec(
            json!({
                "definitions": {
                    "Node": {
                        "type": "object",
                        "properties": {"children": {"type": "array", "items": {"$ref": "#/definitions/Node"}}}
                    }
                }
            }),
            None,
        );

        let resolved = spec
            .resolve_schema(&json!({"$ref": "#/definitions/Node"}))
            .expect("resolved");

        assert_eq!(
            resolved,
            json!({"type": "object", "properties": {"children": {"type": "array", "items": {}}}})
        );
    }

    #[test]
    fn should_build_swagger_api_url_from_document() {
        let spec = spec(
            json!({"swagger": "2.0", "schemes": ["https"], "host": "petstore.test", "basePath": "/v2"}),
            Some("http://docs.test/swagger.json"),
        );

        let url = spec.api_url().expect("api url");

        assert_eq!(url.as_str(), "https://petstore.test/v2");
    }

    #[test]
    fn should_build_swagger_api_url_from_origin() {
        let spec = spec(
            json!({"swagger": "2.0"}),
            Some("http://localhost:8080/api-docs/swagger.json"),
        );

        let url = spec.api_url().expect("api url");

        assert_eq!(url.as_str(), "http://localhost:8080/");
    }

    #[test]
    fn should_use_spec_url_for_base_path() {
        let config = SpecConfig {
            use_spec_url_for_base_path: true,
            ..SpecConfig::default()
        };
        let spec = Spec::from_document(
            json!({"swagger": "2.0"}),
            Some("http://localhost:8080/api-docs/swagger.json".parse().expect("valid url")),
            config,
        );

        let url = spec.api_url().expect("api url");

        assert_eq!(url.as_str(), "http://localhost:8080/api-docs/");
    }

    #[test]
    fn should_build_openapi_api_url_from_relative_server() {
        let spec = spec(
            json!({"openapi": "3.1.0", "servers": [{"url": "/api"}]}),
            Some("http://127.0.0.1:3000/api/openapi.json"),
        );

        let url = spec.api_url().expect("api url");

        assert_eq!(url.as_str(), "http://127.0.0.1:3000/api");
    }

    #[test]
    fn should_require_a_host() {
        let spec = spec(json!({"swagger": "2.0"}), None);

        let error = spec.api_url().expect_err("no host");

        assert!(matches!(error, SwaggerClientError::MissingApiUrl { .. }));
    }
}
