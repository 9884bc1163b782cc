//! Admission review endpoint.
//!
//! The API server posts an admission review for every create, update and
//! delete of a bare-metal set. Rejections are answered with `allowed: false`
//! and HTTP 200; only reviews that cannot be evaluated get a problem response.

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use bmset_admission::{AdmissionError, BaremetalSet, RequestMeta};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::error::ApiError;
use crate::api::request_context::RequestContext;
use crate::state::AppState;

const DEFAULT_API_VERSION: &str = "admission.k8s.io/v1";
const REVIEW_KIND: &str = "AdmissionReview";

pub fn routes() -> Router<AppState> {
    Router::new().route("/validate", post(validate))
}

/// Incoming admission review.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReview {
    #[serde(default)]
    pub api_version: Option<String>,
    #[serde(default)]
    pub request: Option<AdmissionRequest>,
}

/// The request part of a review.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionRequest {
    pub uid: String,
    pub operation: ReviewOperation,
    #[serde(default)]
    pub object: Option<BaremetalSet>,
    #[serde(default)]
    pub old_object: Option<BaremetalSet>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReviewOperation {
    Create,
    Update,
    Delete,
}

/// Outgoing admission review.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReviewResponse {
    pub api_version: String,
    pub kind: String,
    pub response: AdmissionResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionResponse {
    pub uid: String,
    pub allowed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ReviewStatus>,
}

/// Why a review was denied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewStatus {
    pub code: u16,
    pub reason: String,
    pub message: String,
}

impl ReviewStatus {
    fn from_error(err: &AdmissionError) -> Self {
        Self {
            code: status_code(err),
            reason: err.reason().to_string(),
            message: err.to_string(),
        }
    }
}

/// Status code carried in a denial.
pub fn status_code(err: &AdmissionError) -> u16 {
    match err {
        AdmissionError::NameSyntax { .. } | AdmissionError::ImmutableSelection { .. } => 422,
        AdmissionError::ReferenceIntegrity { .. }
        | AdmissionError::InsufficientCandidates { .. } => 409,
        AdmissionError::InventoryUnavailable(_) => 503,
    }
}

async fn validate(
    State(state): State<AppState>,
    ctx: RequestContext,
    payload: Result<Json<AdmissionReview>, JsonRejection>,
) -> Result<Json<AdmissionReviewResponse>, ApiError> {
    let Json(review) = payload.map_err(|e| {
        ApiError::bad_request("invalid_review", e.body_text()).with_request_id(&ctx.request_id)
    })?;

    let api_version = review
        .api_version
        .unwrap_or_else(|| DEFAULT_API_VERSION.to_string());
    let request = review.request.ok_or_else(|| {
        ApiError::bad_request("missing_request", "admission review has no request")
            .with_request_id(&ctx.request_id)
    })?;

    let meta = RequestMeta {
        request_id: ctx.typed_request_id(),
        correlation_id: Some(request.uid.clone()),
    };
    let validator = state.validator();

    debug!(uid = %request.uid, operation = ?request.operation, "Received admission review");

    let result = match request.operation {
        ReviewOperation::Create => {
            let new = require(request.object.as_ref(), "missing_object", "object", &ctx)?;
            validator.validate_create(new, &meta).await.map(|_| ())
        }
        ReviewOperation::Update => {
            let new = require(request.object.as_ref(), "missing_object", "object", &ctx)?;
            let old = require(
                request.old_object.as_ref(),
                "missing_old_object",
                "oldObject",
                &ctx,
            )?;
            validator.validate_update(old, new, &meta).await.map(|_| ())
        }
        ReviewOperation::Delete => {
            let old = require(
                request.old_object.as_ref(),
                "missing_old_object",
                "oldObject",
                &ctx,
            )?;
            validator.validate_delete(old, &meta);
            Ok(())
        }
    };

    Ok(Json(AdmissionReviewResponse {
        api_version,
        kind: REVIEW_KIND.to_string(),
        response: AdmissionResponse {
            uid: request.uid,
            allowed: result.is_ok(),
            status: result.err().as_ref().map(ReviewStatus::from_error),
        },
    }))
}

fn require<'a>(
    object: Option<&'a BaremetalSet>,
    code: &'static str,
    field: &str,
    ctx: &RequestContext,
) -> Result<&'a BaremetalSet, ApiError> {
    object.ok_or_else(|| {
        ApiError::bad_request(code, format!("admission request has no {field}"))
            .with_request_id(&ctx.request_id)
    })
}
