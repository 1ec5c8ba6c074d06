//! HTTP-level tests against a stub Twilio server.

use atb_backend_core::ToolBackend;
use serde_json::json;
use twilio_tools::TwilioToolset;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn send_whatsapp_prefixes_both_addresses() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/2010-04-01/Accounts/AC123/Messages.json"))
        .and(body_string_contains("whatsapp%3A%2B15550001111"))
        .and(body_string_contains("whatsapp%3A%2B15552223333"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "sid": "SM1",
            "status": "queued",
            "to": "whatsapp:+15550001111",
            "from": "whatsapp:+15552223333",
            "body": "hello",
            "error_message": null,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let toolset = TwilioToolset::with_base_url("AC123", "token", server.uri()).unwrap();
    let result = toolset
        .call(
            "send_whatsapp",
            json!({"to": "+15550001111", "from": "+15552223333", "body": "hello"}),
        )
        .await
        .unwrap();

    assert_eq!(result["success"], true);
    assert_eq!(result["data"]["sid"], "SM1");
    assert_eq!(result["data"]["error_message"], "");
}

#[tokio::test]
async fn unverified_number_is_an_envelope_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/2010-04-01/Accounts/AC123/Messages.json"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": "The number +1555 is unverified.",
            "code": 21608,
        })))
        .mount(&server)
        .await;

    let toolset = TwilioToolset::with_base_url("AC123", "token", server.uri()).unwrap();
    let result = toolset
        .call(
            "send_sms",
            json!({"to": "+1555", "from": "+15552223333", "body": "hi"}),
        )
        .await
        .unwrap();

    assert_eq!(result["success"], false);
    assert_eq!(result["error"], "HTTP 400: The number +1555 is unverified.");
}
