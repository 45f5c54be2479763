use std::collections::VecDeque;
use std::path::Path;

use http::HeaderMap;
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use crate::SwaggerClientError;
use crate::client::response::HttpError;
use crate::client::transport::{HttpTransport, ReqwestTransport, TransportRequest};

const YAML_CONTENT_TYPES: [&str; 3] = ["application/yaml", "application/x-yaml", "text/yaml"];

/// A document and the remote documents it references.
#[derive(Debug, Clone)]
pub struct LoadedSpec {
    /// The root document.
    pub document: Value,
    /// Where the root document was loaded from.
    pub origin_url: Url,
    /// Documents reached through `$ref`s, keyed by URL without fragment.
    pub documents: IndexMap<Url, Value>,
}

/// Turns a location (URL or file path) into a URL.
///
/// `http`, `https` and `file` URLs are kept as is; anything else is taken
/// as a path, relative to the current directory.
///
/// # Errors
///
/// Fails if the path cannot be made absolute.
pub fn spec_location(location: &str) -> Result<Url, SwaggerClientError> {
    if let Ok(url) = Url::parse(location)
        && matches!(url.scheme(), "http" | "https" | "file")
    {
        return Ok(url);
    }

    let invalid = || SwaggerClientError::InvalidSpecLocation {
        location: location.to_string(),
    };
    let path = std::path::absolute(Path::new(location)).map_err(|_| invalid())?;
    Url::from_file_path(path).map_err(|()| invalid())
}

/// Fetches specification documents through an [`HttpTransport`].
///
/// The same request headers are sent for the root document and for every
/// remote reference.
#[derive(Debug)]
pub struct Loader<'a, T> {
    transport: &'a T,
    request_headers: &'a HeaderMap,
}

impl<'a, T: HttpTransport> Loader<'a, T> {
    /// Creates a loader.
    pub fn new(transport: &'a T, request_headers: &'a HeaderMap) -> Self {
        Self {
            transport,
            request_headers,
        }
    }

    /// Loads the document at `url`, and every document it references.
    ///
    /// Local references of remote documents are rewritten as absolute
    /// references, so they resolve the same from anywhere.
    ///
    /// # Errors
    ///
    /// Fails if a document cannot be read or parsed.
    pub async fn load(&self, url: &Url) -> Result<LoadedSpec, SwaggerClientError> {
        info!(%url, "loading specification");
        let origin_url = without_fragment(url);
        let document = self.load_document(&origin_url).await?;

        let mut documents = IndexMap::new();
        let mut queue = VecDeque::new();
        collect_remote_refs(&origin_url, &document, &mut queue);

        while let Some(target) = queue.pop_front() {
            if target == origin_url || documents.contains_key(&target) {
                continue;
            }
            debug!(url = %target, "loading referenced document");
            let mut remote = self.load_document(&target).await?;
            absolutize_refs(&target, &mut remote);
            collect_remote_refs(&target, &remote, &mut queue);
            documents.insert(target, remote);
        }

        Ok(LoadedSpec {
            document,
            origin_url,
            documents,
        })
    }

    /// Loads and parses a single document.
    ///
    /// # Errors
    ///
    /// Fails if the document cannot be read or parsed.
    pub async fn load_document(&self, url: &Url) -> Result<Value, SwaggerClientError> {
        let (content, content_type) = match url.scheme() {
            "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|()| SwaggerClientError::InvalidSpecLocation {
                        location: url.to_string(),
                    })?;
                (tokio::fs::read(path).await?, None)
            }
            _ => {
                let request = TransportRequest::get(url.clone()).with_headers(self.request_headers);
                let response = self.transport.request(request).wait().await.clone()?;
                if !response.is_success() {
                    return Err(HttpError::new(response)
                        .with_message(format!("cannot load specification from {url}"))
                        .into());
                }
                let content_type = response.content_type().map(str::to_ascii_lowercase);
                (response.raw_bytes().to_vec(), content_type)
            }
        };

        if is_yaml(url, content_type.as_deref()) {
            parse_yaml(url, &content)
        } else {
            Ok(serde_json::from_slice(&content)?)
        }
    }
}

/// Loads a specification from a URL with the default transport.
///
/// # Errors
///
/// Fails if the document cannot be fetched or parsed.
pub async fn load_url(url: &Url) -> Result<LoadedSpec, SwaggerClientError> {
    let transport = ReqwestTransport::default();
    let headers = HeaderMap::new();
    Loader::new(&transport, &headers).load(url).await
}

/// Loads a specification from the file system.
///
/// # Errors
///
/// Fails if the file cannot be read or parsed.
pub async fn load_file(path: impl AsRef<Path>) -> Result<LoadedSpec, SwaggerClientError> {
    let location = path.as_ref().to_string_lossy();
    let url = spec_location(&location)?;
    load_url(&url).await
}

fn is_yaml(url: &Url, content_type: Option<&str>) -> bool {
    let path = url.path().to_ascii_lowercase();
    if path.ends_with(".yaml") || path.ends_with(".yml") {
        return true;
    }
    content_type
        .and_then(|content_type| content_type.split(';').next())
        .is_some_and(|essence| YAML_CONTENT_TYPES.contains(&essence.trim()))
}

#[cfg(feature = "yaml")]
fn parse_yaml(url: &Url, content: &[u8]) -> Result<Value, SwaggerClientError> {
    let text = String::from_utf8_lossy(content);
    serde_saphyr::from_str::<Value>(&text).map_err(|err| SwaggerClientError::YamlError {
        url: url.to_string(),
        message: err.to_string(),
    })
}

#[cfg(not(feature = "yaml"))]
fn parse_yaml(url: &Url, _content: &[u8]) -> Result<Value, SwaggerClientError> {
    Err(SwaggerClientError::YamlUnsupported {
        url: url.to_string(),
    })
}

fn without_fragment(url: &Url) -> Url {
    let mut url = url.clone();
    url.set_fragment(None);
    url
}

fn collect_remote_refs(base: &Url, value: &Value, queue: &mut VecDeque<Url>) {
    match value {
        Value::Object(object) => {
            if let Some(reference) = object.get("$ref").and_then(Value::as_str)
                && !reference.starts_with('#')
                && let Ok(target) = base.join(reference)
            {
                queue.push_back(without_fragment(&target));
            }
            object
                .values()
                .for_each(|item| collect_remote_refs(base, item, queue));
        }
        Value::Array(items) => items
            .iter()
            .for_each(|item| collect_remote_refs(base, item, queue)),
        _ => {}
    }
}

fn absolutize_refs(base: &Url, value: &mut Value) {
    match value {
        Value::Object(object) => {
            if let Some(Value::String(reference)) = object.get_mut("$ref")
                && let Ok(target) = base.join(reference)
            {
                *reference = target.to_string();
            }
            object
                .values_mut()
                .for_each(|item| absolutize_refs(base, item));
        }
        Value::Array(items) => items
            .iter_mut()
            .for_each(|item| absolutize_refs(base, item)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::client::mock::init_tracing;

    fn fixture(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join(name)
    }

    #[test]
    fn should_keep_http_urls() {
        let url = spec_location("https://petstore.test/v2/swagger.json").expect("location");

        assert_eq!(url.as_str(), "https://petstore.test/v2/swagger.json");
    }

    #[test]
    fn should_turn_paths_into_file_urls() {
        let url = spec_location("specs/swagger.json").expect("location");

        assert_eq!(url.scheme(), "file");
        assert!(url.path().ends_with("/specs/swagger.json"), "{url}");
    }

    #[rstest::rstest]
    #[case::yaml_extension("http://api.test/spec.yaml", None, true)]
    #[case::yml_extension("http://api.test/spec.YML", None, true)]
    #[case::yaml_content_type("http://api.test/spec", Some("application/x-yaml; charset=utf-8"), true)]
    #[case::text_yaml("http://api.test/spec", Some("text/yaml"), true)]
    #[case::json("http://api.test/spec.json", Some("application/json"), false)]
    fn should_detect_yaml(#[case] url: &str, #[case] content_type: Option<&str>, #[case] expected: bool) {
        let url = Url::parse(url).expect("valid url");

        assert_eq!(is_yaml(&url, content_type), expected);
    }

    #[tokio::test]
    async fn should_load_file_with_relative_references() {
        let loaded = load_file(fixture("petstore.json")).await.expect("loaded");

        assert_eq!(loaded.document["swagger"], "2.0");
        assert_eq!(loaded.documents.len(), 1);
        let (url, models) = loaded.documents.first().expect("models");
        assert!(url.path().ends_with("/fixtures/models.json"), "{url}");
        assert!(
            models["Pet"]["properties"]["category"]["$ref"]
                .as_str()
                .is_some_and(|reference| reference.starts_with("file://")),
            "{models}"
        );
    }

    #[cfg(feature = "yaml")]
    #[tokio::test]
    async fn should_load_yaml_file() {
        let loaded = load_file(fixture("minimal.yaml")).await.expect("loaded");

        assert_eq!(loaded.document["openapi"], "3.0.3");
        assert_eq!(loaded.document["info"]["title"], "Minimal");
    }

    #[tokio::test]
    async fn should_forward_headers_to_remote_references() {
        init_tracing();
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/swagger.json"))
            .and(header("x-api-key", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "swagger": "2.0",
                "paths": {},
                "definitions": {"Pet": {"$ref": "models.json#/Pet"}}
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/models.json"))
            .and(header("x-api-key", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Pet": {"type": "object"}})))
            .expect(1)
            .mount(&server)
            .await;

        let transport = ReqwestTransport::default();
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", "secret".parse().expect("valid header"));
        let url = Url::parse(&format!("{}/swagger.json", server.uri())).expect("valid url");

        let loaded = Loader::new(&transport, &headers).load(&url).await.expect("loaded");

        assert_eq!(loaded.documents.len(), 1);
    }

    #[tokio::test]
    async fn should_report_http_failure() {
        init_tracing();
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let url = Url::parse(&format!("{}/swagger.json", server.uri())).expect("valid url");

        let error = load_url(&url).await.expect_err("not found");

        let http = error.as_http().expect("an HTTP error");
        assert_eq!(http.status(), http::StatusCode::NOT_FOUND);
    }
}
