//! `test-utils` is used for testing in both `geobatch-lib` and `geobatch-bin`.
//! This crate does not depend on `geobatch-lib` or `geobatch-bin`, else we would get dependency cycles.
//! Macros are used instead, so that the importer is responsible for providing the dependencies.

/// Create a mock API server, which responds with a predefined status to
/// every request
///
/// Further arguments are applied to the `ResponseTemplate`, e.g.
/// `mock_server!(200, set_body_json(json!({"status": "OK"})))`.
#[macro_export]
macro_rules! mock_server {
    ($status:expr $(, $func:tt ($($arg:expr),*))*) => {{
        let mock_server = wiremock::MockServer::start().await;
        let response_template = wiremock::ResponseTemplate::new($status);
        let template = response_template$(.$func($($arg),*))*;
        wiremock::Mock::given(wiremock::matchers::any()).respond_with(template).mount(&mock_server).await;
        mock_server
    }};
}

/// Mount a JSON answer for requests whose `address` matches.
///
/// Geocoding requests carry the address in the query, validation requests in
/// the body. Both are matched.
#[macro_export]
macro_rules! mount_address {
    ($server:expr, $address:expr, $status:expr, $body:expr $(,)?) => {{
        let template = wiremock::ResponseTemplate::new($status).set_body_json($body);
        wiremock::Mock::given(wiremock::matchers::query_param("address", $address))
            .respond_with(template.clone())
            .mount($server)
            .await;
        wiremock::Mock::given(wiremock::matchers::body_partial_json(serde_json::json!({
            "address": { "addressLines": [$address] }
        })))
        .respond_with(template)
        .mount($server)
        .await;
    }};
}

/// Get the path to the `fixtures` directory.
#[macro_export]
macro_rules! fixtures_path {
    () => {
        std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .parent()
            .unwrap()
            .join("fixtures")
    };
}

/// Loads a fixture from the `fixtures` directory
#[macro_export]
macro_rules! load_fixture {
    ($filename:expr) => {{
        let path = fixtures_path!().join($filename);
        std::fs::read_to_string(path).unwrap()
    }};
}

/// Loads a JSON fixture from the `fixtures` directory
#[macro_export]
macro_rules! load_json_fixture {
    ($filename:expr) => {{
        let text = load_fixture!($filename);
        serde_json::from_str::<serde_json::Value>(&text).unwrap()
    }};
}

/// Gets the "main" binary command (e.g. `geobatch`)
#[macro_export]
macro_rules! main_command {
    () => {
        assert_cmd::cargo::cargo_bin_cmd!()
    };
}
