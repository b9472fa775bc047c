use crate::pin::{Issuer, Risk, ValidFor};
use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, instrument};
use utoipa::ToSchema;

#[derive(ToSchema, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct IssueRequest {
    #[schema(value_type = Vec<String>, example = json!(["low"]))]
    pub risks: Vec<Risk>,
    /// Duration string (`24h`, `1h30m`) or integer nanoseconds.
    #[schema(value_type = String, example = "24h")]
    pub valid_for: ValidFor,
}

/// Exactly one of `pin` and `error` is non-empty.
#[derive(ToSchema, Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
pub struct IssueResponse {
    pub pin: String,
    pub error: String,
}

impl IssueResponse {
    fn pin(pin: String) -> Self {
        Self {
            pin,
            error: String::new(),
        }
    }

    fn error(error: impl Into<String>) -> Self {
        Self {
            pin: String::new(),
            error: error.into(),
        }
    }
}

#[utoipa::path(
    post,
    path= "/api/issue",
    request_body = IssueRequest,
    responses (
        (status = 200, description = "PIN issued", body = IssueResponse),
        (status = 400, description = "Malformed request body", body = IssueResponse),
        (status = 500, description = "Random source or store failure", body = IssueResponse),
    ),
    tag= "issue"
)]
// axum handler for issuing a PIN
#[instrument(skip(issuer, payload))]
pub async fn issue(
    Extension(issuer): Extension<Arc<Issuer>>,
    payload: Result<Json<IssueRequest>, JsonRejection>,
) -> (StatusCode, Json<IssueResponse>) {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            debug!("Rejected issue request: {}", rejection.body_text());

            return (
                StatusCode::BAD_REQUEST,
                Json(IssueResponse::error(rejection.body_text())),
            );
        }
    };

    match issuer
        .issue(&request.risks, request.valid_for.as_duration())
        .await
    {
        Ok(record) => (StatusCode::OK, Json(IssueResponse::pin(record.code))),
        Err(err) => {
            error!("Failed to issue PIN: {}", err);

            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(IssueResponse::error(err.message())),
            )
        }
    }
}
