use std::sync::Once;

use rstest::fixture;

mod test_app;
pub use self::test_app::*;

static TRACING: Once = Once::new();

/// Sends client and server logs to the test output.
pub fn init_tracing() {
    TRACING.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_target(false)
            .with_test_writer()
            .init();
    });
}

/// A running petstore, with a client loaded from its OpenAPI document.
#[fixture]
pub async fn app() -> TestApp {
    init_tracing();
    TestApp::start()
        .await
        .unwrap_or_else(|error| panic!("petstore did not start: {error:?}"))
}
