use anyhow::{anyhow, Result};
use axum::{
    body::{to_bytes, Body},
    http::{header::CONTENT_TYPE, Request, StatusCode},
    Router,
};
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};
use tower::ServiceExt;
use uuid::Uuid;
use verification::{
    api,
    pin::{Claims, Issuer, OsRandom, PinRecord, PinStore, RandomSource, Risk, StoreFuture},
};

#[derive(Default)]
struct RecordingStore {
    inserts: Mutex<Vec<PinRecord>>,
    fail_with: Option<String>,
}

impl RecordingStore {
    fn failing(message: &str) -> Self {
        Self {
            inserts: Mutex::new(Vec::new()),
            fail_with: Some(message.to_string()),
        }
    }

    fn inserts(&self) -> Vec<PinRecord> {
        self.inserts
            .lock()
            .map(|inserts| inserts.clone())
            .unwrap_or_default()
    }
}

impl PinStore for RecordingStore {
    fn insert_pin<'a>(
        &'a self,
        code: &'a str,
        risks: &'a [Risk],
        claims: &'a Claims,
        valid_for: Duration,
    ) -> StoreFuture<'a, PinRecord> {
        Box::pin(async move {
            let record = PinRecord {
                id: Uuid::now_v7(),
                code: code.to_string(),
                risks: risks.to_vec(),
                claims: claims.clone(),
                valid_for,
            };
            self.inserts
                .lock()
                .map_err(|_| anyhow!("store mutex poisoned"))?
                .push(record.clone());

            match &self.fail_with {
                Some(message) => Err(anyhow!(message.clone())),
                None => Ok(record),
            }
        })
    }
}

struct FixedRandom([u8; 6]);

impl RandomSource for FixedRandom {
    fn fill(&self, dest: &mut [u8]) -> Result<()> {
        dest.copy_from_slice(&self.0);
        Ok(())
    }
}

struct FailingRandom(&'static str);

impl RandomSource for FailingRandom {
    fn fill(&self, _dest: &mut [u8]) -> Result<()> {
        Err(anyhow!(self.0))
    }
}

fn app(store: Arc<RecordingStore>, random: Arc<dyn RandomSource>, claims: Claims) -> Router {
    api::router(Arc::new(Issuer::new(store, random, claims)))
}

async fn post_issue(app: Router, body: &str) -> Result<(StatusCode, serde_json::Value)> {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/issue")
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))?,
        )
        .await?;

    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await?;
    Ok((status, serde_json::from_slice(&body)?))
}

fn is_base64_standard(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '+' || c == '/'
}

#[tokio::test]
async fn issues_pin_from_fixed_bytes() -> Result<()> {
    let store = Arc::new(RecordingStore::default());
    let app = app(
        store.clone(),
        Arc::new(FixedRandom([0x00, 0x01, 0x02, 0x03, 0x04, 0x05])),
        Claims::default(),
    );

    let (status, payload) = post_issue(app, r#"{"risks":["low"],"validFor":"24h"}"#).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["pin"], "AAECAwQF");
    assert_eq!(payload["error"], "");

    let inserts = store.inserts();
    assert_eq!(inserts.len(), 1);
    assert_eq!(inserts[0].code, "AAECAwQF");
    assert_eq!(inserts[0].risks, vec![Risk::new("low")]);
    assert_eq!(inserts[0].valid_for, Duration::from_secs(24 * 60 * 60));
    Ok(())
}

#[tokio::test]
async fn issues_pin_with_os_randomness() -> Result<()> {
    let store = Arc::new(RecordingStore::default());
    let app = app(store.clone(), Arc::new(OsRandom), Claims::default());

    let (status, payload) =
        post_issue(app, r#"{"risks":["low","high"],"validFor":3600000000000}"#).await?;

    assert_eq!(status, StatusCode::OK);
    let pin = payload["pin"].as_str().unwrap_or_default();
    assert_eq!(pin.len(), 8);
    assert!(pin.chars().all(is_base64_standard), "unexpected pin {pin}");
    assert!(!pin.contains('='));
    assert_eq!(payload["error"], "");

    let inserts = store.inserts();
    assert_eq!(inserts.len(), 1);
    assert_eq!(inserts[0].code, pin);
    assert_eq!(inserts[0].valid_for, Duration::from_secs(3600));
    Ok(())
}

#[tokio::test]
async fn attaches_the_same_claims_regardless_of_input() -> Result<()> {
    let store = Arc::new(RecordingStore::default());
    let claims: Claims = [("lab", "north"), ("batch", "42")].into_iter().collect();

    for body in [
        r#"{"risks":[],"validFor":"1m"}"#,
        r#"{"risks":["high"],"validFor":"48h"}"#,
        r#"{"risks":["lab","batch"],"validFor":"1h30m","claims":{"lab":"override"}}"#,
    ] {
        let app = app(store.clone(), Arc::new(OsRandom), claims.clone());
        let (status, _) = post_issue(app, body).await?;
        assert_eq!(status, StatusCode::OK);
    }

    let inserts = store.inserts();
    assert_eq!(inserts.len(), 3);
    assert!(inserts.iter().all(|record| record.claims == claims));
    Ok(())
}

#[tokio::test]
async fn default_claims_are_the_placeholder_pairs() -> Result<()> {
    let store = Arc::new(RecordingStore::default());
    let app = app(store.clone(), Arc::new(OsRandom), Claims::default());

    let (status, _) = post_issue(app, r#"{"risks":["low"],"validFor":"24h"}"#).await?;
    assert_eq!(status, StatusCode::OK);

    let inserts = store.inserts();
    assert_eq!(inserts.len(), 1);
    assert_eq!(inserts[0].claims.len(), 2);
    assert_eq!(inserts[0].claims.get("lab"), Some("test r us"));
    assert_eq!(inserts[0].claims.get("batch"), Some("test batch number"));
    Ok(())
}

#[tokio::test]
async fn malformed_requests_are_rejected_before_any_side_effect() -> Result<()> {
    for body in [
        r#"{"risks":"low","validFor":"24h"}"#,
        r#"{"risks":["low"],"validFor":"forever"}"#,
        r#"{"risks":["low"],"validFor":"0s"}"#,
        r#"{"risks":["low"],"validFor":"340282366920938463463374607431768211.999us"}"#,
        r#"{"risks":["low"]}"#,
        "not json",
    ] {
        let store = Arc::new(RecordingStore::default());
        let app = app(
            store.clone(),
            Arc::new(FailingRandom("random source must not be used")),
            Claims::default(),
        );

        let (status, payload) = post_issue(app, body).await?;

        assert_eq!(status, StatusCode::BAD_REQUEST, "body {body}");
        assert_eq!(payload["pin"], "");
        assert!(
            payload["error"].as_str().is_some_and(|error| !error.is_empty()),
            "body {body}"
        );
        assert!(store.inserts().is_empty(), "body {body}");
    }
    Ok(())
}

#[tokio::test]
async fn missing_content_type_is_a_bad_request() -> Result<()> {
    let store = Arc::new(RecordingStore::default());
    let app = app(store.clone(), Arc::new(OsRandom), Claims::default());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/issue")
                .body(Body::from(r#"{"risks":["low"],"validFor":"24h"}"#))?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(store.inserts().is_empty());
    Ok(())
}

#[tokio::test]
async fn random_source_failure_is_a_server_error() -> Result<()> {
    let store = Arc::new(RecordingStore::default());
    let app = app(
        store.clone(),
        Arc::new(FailingRandom("entropy source exhausted")),
        Claims::default(),
    );

    let (status, payload) = post_issue(app, r#"{"risks":["low"],"validFor":"24h"}"#).await?;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(payload["error"], "entropy source exhausted");
    assert_eq!(payload["pin"], "");
    assert!(store.inserts().is_empty());
    Ok(())
}

#[tokio::test]
async fn store_failure_is_a_server_error() -> Result<()> {
    let store = Arc::new(RecordingStore::failing(
        "duplicate key value violates unique constraint \"pins_code_key\"",
    ));
    let app = app(store.clone(), Arc::new(OsRandom), Claims::default());

    let (status, payload) = post_issue(app, r#"{"risks":["low"],"validFor":"24h"}"#).await?;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        payload["error"],
        "duplicate key value violates unique constraint \"pins_code_key\""
    );
    assert_eq!(payload["pin"], "");
    assert_eq!(store.inserts().len(), 1);
    Ok(())
}

#[tokio::test]
async fn repeated_calls_issue_independent_codes() -> Result<()> {
    let store = Arc::new(RecordingStore::default());
    let router = app(store.clone(), Arc::new(OsRandom), Claims::default());

    let (_, first) = post_issue(router.clone(), r#"{"risks":[],"validFor":"1h"}"#).await?;
    let (_, second) = post_issue(router, r#"{"risks":[],"validFor":"1h"}"#).await?;

    assert_ne!(first["pin"], second["pin"]);
    assert_eq!(store.inserts().len(), 2);
    Ok(())
}

#[tokio::test]
async fn responses_carry_a_request_id() -> Result<()> {
    let store = Arc::new(RecordingStore::default());
    let app = app(store, Arc::new(OsRandom), Claims::default());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/issue")
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"risks":[],"validFor":"1h"}"#))?,
        )
        .await?;
    let generated = response.headers().get(api::REQUEST_ID_HEADER);
    assert!(generated.is_some());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/issue")
                .header(CONTENT_TYPE, "application/json")
                .header(api::REQUEST_ID_HEADER, "req-123")
                .body(Body::from(r#"{"risks":[],"validFor":"1h"}"#))?,
        )
        .await?;
    assert_eq!(
        response
            .headers()
            .get(api::REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok()),
        Some("req-123")
    );
    Ok(())
}

#[tokio::test]
async fn serves_the_openapi_document() -> Result<()> {
    let store = Arc::new(RecordingStore::default());
    let app = app(store, Arc::new(OsRandom), Claims::default());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api-docs/openapi.json")
                .body(Body::empty())?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await?;
    let doc: serde_json::Value = serde_json::from_slice(&body)?;
    assert!(doc["paths"]["/api/issue"]["post"].is_object());
    Ok(())
}
