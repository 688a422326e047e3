use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, Json};
use axum::http::StatusCode;
use serde_json::Value;

use crate::handlers::jobs::dto::{SubmitJobDto, SubmitJobResponse};
use crate::{error::ApiError, state::AppState};

/// `POST /jobs`: validate a submission and enqueue it as a pending job.
///
/// A body that is absent or not valid JSON is treated like one with no
/// fields. Nothing reaches the store unless every required field is present.
pub async fn submit(
    Extension(state): Extension<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmitJobResponse>), ApiError> {
    let body = match body {
        Ok(Json(value)) => value,
        Err(rejection) => {
            tracing::debug!(%rejection, "unreadable job submission body");
            Value::Null
        }
    };

    let job = SubmitJobDto::from_body(body).into_new_job().map_err(|error| {
        tracing::debug!(%error, "rejected job submission");
        ApiError::from(error)
    })?;

    let job_id = state.job_store().insert_job(&job).await.map_err(|error| {
        tracing::error!(
            %error,
            queue_name = %job.queue_name(),
            job_type = %job.job_type(),
            "failed to enqueue job"
        );
        ApiError::from(error)
    })?;

    tracing::info!(
        %job_id,
        queue_name = %job.queue_name(),
        job_type = %job.job_type(),
        job_priority = job.job_priority(),
        "job enqueued"
    );

    Ok((StatusCode::CREATED, Json(SubmitJobResponse::created(job_id))))
}
