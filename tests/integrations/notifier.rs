//! Integration tests for the dispatch pipeline: token caching,
//! expiry recovery, message typing, and secret-file equivalence.

use std::io::Write;
use std::sync::Arc;
use wecom_notify::formatting::MarkdownRenderer;
use wecom_notify::{MessageType, NotifierConfig, NotifyError, WeComNotifier};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[path = "../helpers/mod.rs"]
mod helpers;

use helpers::{config_for, mount_send_ok, mount_token, no_cancel, notifier_for, test_alerts};

#[tokio::test]
async fn dispatch_delivers_a_text_payload() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 1).await;

    // The delivered payload is tagged `text` and authorized with the
    // fetched token as a bearer header, never a URL parameter.
    Mock::given(method("POST"))
        .and(path("/message/send"))
        .and(header("authorization", "Bearer tok-1"))
        .and(body_partial_json(serde_json::json!({ "msgtype": "text" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "errcode": 0, "errmsg": "ok" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let notifier = notifier_for(config_for(&server, "s3cret"));
    let (_guard, cancel) = no_cancel();
    notifier.notify(&test_alerts(), cancel).await.unwrap();
}

#[tokio::test]
async fn consecutive_dispatches_reuse_the_token() {
    let server = MockServer::start().await;
    // Exactly one authentication call for two deliveries.
    mount_token(&server, "tok-1", 1).await;
    mount_send_ok(&server, 2).await;

    let notifier = notifier_for(config_for(&server, "s3cret"));

    let (_guard, cancel) = no_cancel();
    notifier.notify(&test_alerts(), cancel.clone()).await.unwrap();
    notifier.notify(&test_alerts(), cancel).await.unwrap();
}

#[tokio::test]
async fn markdown_config_tags_the_payload_accordingly() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 1).await;

    Mock::given(method("POST"))
        .and(path("/message/send"))
        .and(body_partial_json(
            serde_json::json!({ "msgtype": "markdown" }),
        ))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "errcode": 0, "errmsg": "ok" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = NotifierConfig {
        message_type: MessageType::Markdown,
        ..config_for(&server, "s3cret")
    };
    let notifier = WeComNotifier::new(config, Arc::new(MarkdownRenderer)).unwrap();

    let (_guard, cancel) = no_cancel();
    notifier.notify(&test_alerts(), cancel).await.unwrap();
}

#[tokio::test]
async fn expired_token_triggers_one_refetch_and_resend() {
    let server = MockServer::start().await;
    // First authentication yields tok-1, the refresh yields tok-2.
    mount_token(&server, "tok-1", 1).await;
    mount_token(&server, "tok-2", 1).await;

    // The platform rejects tok-1 as expired and accepts tok-2.
    Mock::given(method("POST"))
        .and(path("/message/send"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            serde_json::json!({ "errcode": 42001, "errmsg": "access_token expired" }),
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/message/send"))
        .and(header("authorization", "Bearer tok-2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "errcode": 0, "errmsg": "ok" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let notifier = notifier_for(config_for(&server, "s3cret"));
    let (_guard, cancel) = no_cancel();
    notifier.notify(&test_alerts(), cancel).await.unwrap();
}

#[tokio::test]
async fn a_second_consecutive_expiry_is_a_delivery_error() {
    let server = MockServer::start().await;
    // One initial fetch plus exactly one refresh, never a third.
    mount_token(&server, "tok-stale", 2).await;

    Mock::given(method("POST"))
        .and(path("/message/send"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            serde_json::json!({ "errcode": 42001, "errmsg": "access_token expired" }),
        ))
        .expect(2)
        .mount(&server)
        .await;

    let notifier = notifier_for(config_for(&server, "s3cret"));
    let (_guard, cancel) = no_cancel();
    let err = notifier.notify(&test_alerts(), cancel).await.unwrap_err();

    assert!(matches!(err, NotifyError::Delivery(_)));
    assert!(err.to_string().contains("42001"));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn file_sourced_secret_dispatches_identically() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 1).await;
    mount_send_ok(&server, 1).await;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "s3cret").unwrap();

    let config = NotifierConfig {
        api_secret: None,
        api_secret_file: Some(file.path().to_path_buf()),
        ..config_for(&server, "ignored")
    };
    let notifier = notifier_for(config);

    let (_guard, cancel) = no_cancel();
    notifier.notify(&test_alerts(), cancel).await.unwrap();
}

#[tokio::test]
async fn http_error_from_the_message_endpoint_is_retryable() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 1).await;

    Mock::given(method("POST"))
        .and(path("/message/send"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = notifier_for(config_for(&server, "s3cret"));
    let (_guard, cancel) = no_cancel();
    let err = notifier.notify(&test_alerts(), cancel).await.unwrap_err();

    assert!(matches!(err, NotifyError::Delivery(_)));
    assert!(err.to_string().contains("502"));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn platform_rejection_is_a_delivery_error() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 1).await;

    Mock::given(method("POST"))
        .and(path("/message/send"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            serde_json::json!({ "errcode": 81013, "errmsg": "user not found" }),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = notifier_for(config_for(&server, "s3cret"));
    let (_guard, cancel) = no_cancel();
    let err = notifier.notify(&test_alerts(), cancel).await.unwrap_err();

    assert!(matches!(err, NotifyError::Delivery(_)));
    assert!(err.to_string().contains("user not found"));
}
