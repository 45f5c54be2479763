use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use http::StatusCode;
use serde_json::{Value, json};

use super::mock::{MockTransport, init_tracing, json_response};
use super::*;

fn petstore() -> Value {
    json!({
        "swagger": "2.0",
        "host": "petstore.test",
        "basePath": "/v2",
        "paths": {
            "/pet/{petId}": {
                "get": {
                    "operationId": "getPetById",
                    "tags": ["pet"],
                    "parameters": [{"name": "petId", "in": "path", "required": true, "type": "integer"}],
                    "responses": {
                        "200": {"description": "found", "schema": {"type": "object", "required": ["name"]}},
                        "404": {"description": "missing", "schema": {"type": "object"}}
                    }
                }
            },
            "/ping": {"get": {"operationId": "ping", "tags": ["my tag"], "responses": {"200": {"description": "pong"}}}}
        }
    })
}

fn client(transport: MockTransport) -> SwaggerClient<MockTransport> {
    init_tracing();
    SwaggerClient::builder()
        .with_transport(transport)
        .build(petstore(), None)
        .expect("client")
}

#[tokio::test]
async fn should_call_operation() {
    let transport = MockTransport::json(StatusCode::OK, r#"{"name":"Rex"}"#);
    let client = client(transport.clone());

    let output = client
        .resource("pet")
        .expect("pet")
        .operation("getPetById")
        .expect("getPetById")
        .call(CallParams::new().add_param("petId", 42))
        .expect("call")
        .await
        .expect("output");

    assert_eq!(output.result(), Some(&json!({"name": "Rex"})));
    let requests = transport.requests();
    let urls = requests.iter().map(|request| request.url.as_str()).collect::<Vec<_>>();
    assert_eq!(urls, vec!["http://petstore.test/v2/pet/42"]);
}

#[tokio::test]
async fn should_reach_resources_by_raw_and_sanitized_names() {
    let client = client(MockTransport::json(StatusCode::OK, "{}"));

    assert!(client.resource("my tag").is_ok());
    assert!(client.resource("my_tag").is_ok());
    let error = client.resource("foo").expect_err("unknown");
    insta::assert_snapshot!(error, @"Resource foo not found");
}

#[tokio::test]
async fn should_report_unknown_operation() {
    let client = client(MockTransport::json(StatusCode::OK, "{}"));

    let error = client
        .resource("pet")
        .expect("pet")
        .operation("deletePet")
        .expect_err("unknown");

    insta::assert_snapshot!(error, @"Operation deletePet not found in resource pet");
}

#[tokio::test]
async fn should_carry_declared_error_payload() {
    let client = client(MockTransport::json(StatusCode::NOT_FOUND, r#"{"message":"no pet"}"#));

    let error = client
        .resource("pet")
        .and_then(|pet| pet.operation("getPetById"))
        .and_then(|operation| operation.call(CallParams::new().add_param("petId", 1)))
        .expect("call")
        .await
        .expect_err("not found");

    let http = error.as_http().expect("an HTTP error");
    assert_eq!(http.status(), StatusCode::NOT_FOUND);
    assert_eq!(http.swagger_result(), Some(&json!({"message": "no pet"})));
}

#[tokio::test]
async fn should_reject_invalid_payload() {
    let client = client(MockTransport::json(StatusCode::OK, r#"{"age":3}"#));

    let error = client
        .resource("pet")
        .and_then(|pet| pet.operation("getPetById"))
        .and_then(|operation| operation.call(CallParams::new().add_param("petId", 1)))
        .expect("call")
        .await
        .expect_err("invalid");

    assert!(matches!(error, SwaggerClientError::Unmarshal(_)), "{error:?}");
}

#[tokio::test]
async fn should_combine_client_and_request_options() {
    let calls = Arc::new(AtomicUsize::new(0));
    let client_calls = Arc::clone(&calls);
    let request_calls = Arc::clone(&calls);
    let transport = MockTransport::json(StatusCode::OK, r#"{"name":"Rex"}"#);
    let client = SwaggerClient::builder()
        .with_transport(transport.clone())
        .add_response_callback(move |_, _| {
            client_calls.fetch_add(1, Ordering::SeqCst);
        })
        .build(petstore(), None)
        .expect("client");
    let options = RequestOptions::new()
        .try_with_header("x-request-id", "42")
        .expect("valid header")
        .add_response_callback(move |_, _| {
            request_calls.fetch_add(10, Ordering::SeqCst);
        })
        .also_return_response(true);

    let output = client
        .resource("pet")
        .and_then(|pet| pet.operation("getPetById"))
        .and_then(|operation| operation.call_with(CallParams::new().add_param("petId", 1), options))
        .expect("call")
        .await
        .expect("output");

    assert_eq!(calls.load(Ordering::SeqCst), 11);
    assert_eq!(output.response().map(|response| response.status()), Some(StatusCode::OK));
    assert_eq!(transport.requests()[0].headers["x-request-id"], "42");
}

#[tokio::test]
async fn should_send_raw_requests() {
    let transport = MockTransport::new(|_| Ok(json_response(StatusCode::OK, "pong")));
    let client = client(transport);
    let url = client.api_url().join("health").expect("valid url");

    let output = client
        .request_raw(TransportRequest::get(url))
        .await
        .expect("raw output");

    assert_eq!(output.response().map(|response| response.text()), Some("pong".to_string()));
}

#[test]
fn should_require_an_async_runtime() {
    let error = SwaggerClient::builder()
        .with_transport(MockTransport::json(StatusCode::OK, "{}").without_runtime())
        .build(petstore(), None)
        .expect_err("no runtime");

    let SwaggerClientError::NoAsyncRuntime { transport } = error else {
        panic!("expected a runtime error, got {error:?}");
    };
    assert!(transport.ends_with("MockTransport"), "{transport}");
}

#[test]
fn should_reject_default_transport_outside_runtime() {
    let error = SwaggerClient::builder()
        .build(petstore(), None)
        .expect_err("no runtime");

    assert!(matches!(error, SwaggerClientError::NoAsyncRuntime { .. }));
}
