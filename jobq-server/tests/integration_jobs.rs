use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use jobq_server::build_router;
use jobq_server::state::AppState;
use jobq_store::{async_trait, JobStatus, JobStore, JobStoreError, MemoryJobStore, NewJob};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

/// Store that refuses every call, standing in for a database outage.
struct FailingStore;

#[async_trait]
impl JobStore for FailingStore {
    async fn insert_job(&self, _job: &NewJob) -> Result<Uuid, JobStoreError> {
        Err(JobStoreError::InvalidIdentifier(
            "connection refused to db.internal:5432".to_string(),
        ))
    }

    async fn ping(&self) -> Result<(), JobStoreError> {
        Err(JobStoreError::Unavailable)
    }
}

fn router_with(store: MemoryJobStore) -> Router {
    build_router(Arc::new(AppState::from_store(store)))
}

async fn post_raw(router: Router, body: Body, content_type: Option<&str>) -> (StatusCode, Value) {
    let mut req = Request::builder().method("POST").uri("/jobs");
    if let Some(ct) = content_type {
        req = req.header(header::CONTENT_TYPE, ct);
    }
    let resp = router.oneshot(req.body(body).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn post_job(router: Router, body: Value) -> (StatusCode, Value) {
    post_raw(
        router,
        Body::from(body.to_string()),
        Some("application/json"),
    )
    .await
}

fn job_id_of(body: &Value) -> Uuid {
    body["job_id"]
        .as_str()
        .and_then(|s| Uuid::parse_str(s).ok())
        .expect("job_id is a uuid string")
}

#[tokio::test]
async fn valid_submission_with_priority() {
    let store = MemoryJobStore::new();
    let (status, body) = post_job(
        router_with(store.clone()),
        json!({
            "queue_name": "emails",
            "job_type": "welcome",
            "payload": { "to": "a@x.com" },
            "job_priority": 5
        }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Job created successfully");
    let job_id = job_id_of(&body);

    let job = store.get(job_id).await.expect("job recorded");
    assert_eq!(job.queue_name, "emails");
    assert_eq!(job.job_type, "welcome");
    assert_eq!(job.payload, json!({ "to": "a@x.com" }));
    assert_eq!(job.job_priority, 5);
    assert_eq!(job.job_status, JobStatus::Pending);
}

#[tokio::test]
async fn priority_defaults_to_zero() {
    let store = MemoryJobStore::new();
    let (status, body) = post_job(
        router_with(store.clone()),
        json!({ "queue_name": "reports", "job_type": "daily", "payload": [1, 2, 3] }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    let job = store.get(job_id_of(&body)).await.unwrap();
    assert_eq!(job.job_priority, 0);
    assert_eq!(job.payload, json!([1, 2, 3]));
}

#[tokio::test]
async fn negative_priority_is_accepted() {
    let store = MemoryJobStore::new();
    let (status, body) = post_job(
        router_with(store.clone()),
        json!({ "queue_name": "q", "job_type": "t", "payload": { "a": 1 }, "job_priority": -3 }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(store.get(job_id_of(&body)).await.unwrap().job_priority, -3);
}

#[tokio::test]
async fn missing_payload_is_rejected() {
    let store = MemoryJobStore::new();
    let (status, body) = post_job(
        router_with(store.clone()),
        json!({ "queue_name": "emails", "job_type": "welcome" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Missing required fields" }));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn every_missing_or_blank_field_gets_same_response() {
    let store = MemoryJobStore::new();
    let bodies = [
        json!({ "job_type": "welcome", "payload": {} }),
        json!({ "queue_name": "emails", "payload": {} }),
        json!({ "queue_name": "", "job_type": "welcome", "payload": {} }),
        json!({ "queue_name": "emails", "job_type": "", "payload": {} }),
        json!({ "queue_name": "emails", "job_type": "welcome", "payload": null }),
        json!({ "queue_name": "emails", "job_type": "welcome", "payload": "" }),
        json!({}),
    ];

    for request in bodies {
        let (status, body) = post_job(router_with(store.clone()), request.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "request {request}");
        assert_eq!(body, json!({ "error": "Missing required fields" }));
    }
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn falsy_priority_is_stored_as_zero() {
    let store = MemoryJobStore::new();

    for priority in [json!(false), json!(""), json!(0), Value::Null] {
        let (status, body) = post_job(
            router_with(store.clone()),
            json!({ "queue_name": "q", "job_type": "t", "payload": {}, "job_priority": priority }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "priority {priority}");
        assert_eq!(store.get(job_id_of(&body)).await.unwrap().job_priority, 0);
    }
    assert_eq!(store.len().await, 4);
}

#[tokio::test]
async fn integral_float_priority_is_accepted() {
    let store = MemoryJobStore::new();
    let (status, body) = post_job(
        router_with(store.clone()),
        json!({ "queue_name": "q", "job_type": "t", "payload": {}, "job_priority": 5.0 }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(store.get(job_id_of(&body)).await.unwrap().job_priority, 5);
}

#[tokio::test]
async fn non_integer_priority_is_rejected() {
    let store = MemoryJobStore::new();
    for priority in [json!("high"), json!(2.5)] {
        let (status, body) = post_job(
            router_with(store.clone()),
            json!({ "queue_name": "q", "job_type": "t", "payload": {}, "job_priority": priority }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Missing required fields" }));
    }
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn malformed_or_absent_body_is_rejected() {
    let store = MemoryJobStore::new();

    let (status, body) = post_raw(
        router_with(store.clone()),
        Body::from("{\"queue_name\": \"emails\","),
        Some("application/json"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Missing required fields" }));

    let (status, body) = post_raw(router_with(store.clone()), Body::empty(), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Missing required fields" }));

    assert!(store.is_empty().await);
}

#[tokio::test]
async fn store_failure_is_opaque() {
    let router = build_router(Arc::new(AppState::from_store(FailingStore)));
    let (status, body) = post_job(
        router,
        json!({ "queue_name": "emails", "job_type": "welcome", "payload": { "to": "a@x.com" } }),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Internal Server Error" }));
    assert!(!body.to_string().contains("db.internal"));
}

#[tokio::test]
async fn identical_submissions_create_distinct_jobs() {
    let store = MemoryJobStore::new();
    let request = json!({ "queue_name": "emails", "job_type": "welcome", "payload": { "to": "a@x.com" } });

    let (first, second) = tokio::join!(
        post_job(router_with(store.clone()), request.clone()),
        post_job(router_with(store.clone()), request.clone()),
    );

    assert_eq!(first.0, StatusCode::CREATED);
    assert_eq!(second.0, StatusCode::CREATED);
    assert_ne!(job_id_of(&first.1), job_id_of(&second.1));
    assert_eq!(store.len().await, 2);
}

#[tokio::test]
async fn health_and_readiness() {
    let router = router_with(MemoryJobStore::new());
    let resp = router
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = router
        .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn readiness_reports_unreachable_store() {
    let router = build_router(Arc::new(AppState::from_store(FailingStore)));

    let resp = router
        .clone()
        .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    // liveness does not depend on the store
    let resp = router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[cfg(feature = "sqlite")]
mod sqlite {
    use super::*;
    use jobq_store::{create_lazy_pool, create_pool, DbConnectionConfig, SqlJobStore};

    async fn migrated_store() -> SqlJobStore {
        let config = DbConnectionConfig::new("sqlite::memory:")
            .with_pool_size(1, 1)
            .without_idle_timeout();
        let store = SqlJobStore::new(create_pool(&config).await.expect("create pool"));
        store.migrate().await.expect("migrate");
        store
    }

    #[tokio::test]
    async fn submission_lands_in_jobs_table() {
        let store = migrated_store().await;
        let router = build_router(Arc::new(AppState::from_store(store.clone())));

        let (status, body) = post_job(
            router,
            json!({
                "queue_name": "emails",
                "job_type": "welcome",
                "payload": { "to": "a@x.com", "tags": ["new"] },
                "job_priority": 2
            }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let job = store
            .find_job(job_id_of(&body))
            .await
            .unwrap()
            .expect("row exists");
        assert_eq!(job.queue_name, "emails");
        assert_eq!(job.payload, json!({ "to": "a@x.com", "tags": ["new"] }));
        assert_eq!(job.job_priority, 2);
        assert_eq!(job.job_status, JobStatus::Pending);
    }

    #[tokio::test]
    async fn rejected_submission_writes_nothing() {
        let store = migrated_store().await;
        let router = build_router(Arc::new(AppState::from_store(store.clone())));

        let (status, _) = post_job(router, json!({ "queue_name": "emails", "job_type": "welcome" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(store.count_jobs().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn store_without_schema_at_boot_recovers() {
        // nothing migrated at startup, as when the database was down then
        let config = DbConnectionConfig::new("sqlite::memory:")
            .with_pool_size(1, 1)
            .without_idle_timeout();
        let store = SqlJobStore::new(create_lazy_pool(&config).expect("lazy pool"))
            .with_auto_migrate(true);
        let router = build_router(Arc::new(AppState::from_store(store.clone())));

        let (status, body) = post_job(
            router.clone(),
            json!({ "queue_name": "emails", "job_type": "welcome", "payload": { "to": "a@x.com" } }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(store.find_job(job_id_of(&body)).await.unwrap().is_some());

        let resp = router
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
