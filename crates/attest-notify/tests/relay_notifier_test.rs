//! Tests for `RelayNotifier` against a mock HTTP relay.

use attest_notify::{escalation_notice, Notifier, NotifyConfig, NotifyError, RelayNotifier};
use attest_state::EscalationTier;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn relay_for(server: &MockServer) -> RelayNotifier {
    let url = format!("{}/send", server.uri()).parse().unwrap();
    RelayNotifier::new(url, 5).unwrap()
}

#[tokio::test]
async fn deliver_posts_notification_json() {
    let server = MockServer::start().await;
    let notice = escalation_notice(EscalationTier::Hr, "Infosec", "Ada", &NotifyConfig::default());

    Mock::given(method("POST"))
        .and(path("/send"))
        .and(body_json(&notice))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    relay_for(&server).deliver(&notice).await.unwrap();
}

#[tokio::test]
async fn deliver_reports_relay_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let notice = escalation_notice(EscalationTier::Cxo, "AUP", "Ada", &NotifyConfig::default());
    let err = relay_for(&server).deliver(&notice).await.unwrap_err();
    assert!(matches!(err, NotifyError::Rejected { status: 503, .. }));
}

#[tokio::test]
async fn deliver_to_closed_port_is_http_error() {
    let relay = RelayNotifier::new("http://127.0.0.1:1/send".parse().unwrap(), 2).unwrap();
    let notice = escalation_notice(EscalationTier::Hr, "Infosec", "Ada", &NotifyConfig::default());
    let err = relay.deliver(&notice).await.unwrap_err();
    assert!(matches!(err, NotifyError::Http { .. }));
}

#[tokio::test]
async fn send_is_fire_and_forget() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let notice = escalation_notice(EscalationTier::Hr, "Infosec", "Ada", &NotifyConfig::default());
    // A failing relay must not panic or surface an error to the caller.
    relay_for(&server).send(notice);
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    assert!(!server.received_requests().await.unwrap_or_default().is_empty());
}
