//! Sweep subcommand against a mock service.

use std::time::Duration;

use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use attest_cli::sweep::{trigger, Escalation};

#[tokio::test]
async fn test_sweep_parses_reports() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/acknowledgements/escalations/sweep"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"acknowledgement_id": "a1", "from": "none", "to": "escalated_to_hr", "overdue_days": 7}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let base = Url::parse(&server.uri()).unwrap();
    let reports = trigger(&base, Duration::from_secs(5)).await.unwrap();
    assert_eq!(
        reports,
        vec![Escalation {
            acknowledgement_id: "a1".into(),
            from: "none".into(),
            to: "escalated_to_hr".into(),
            overdue_days: 7,
        }]
    );
}

#[tokio::test]
async fn test_sweep_surfaces_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let base = Url::parse(&server.uri()).unwrap();
    let err = trigger(&base, Duration::from_secs(5)).await.unwrap_err();
    assert!(err.to_string().contains("503"), "{err:#}");
}
