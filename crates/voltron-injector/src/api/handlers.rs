use axum::{
    body::Bytes,
    extract::{self, rejection::BytesRejection},
    http::{Method, StatusCode, header},
    response::{IntoResponse, Response},
};
use injector_admission::{
    admission_request::AdmissionRequest, admission_response::AdmissionResponse,
    admission_review::AdmissionReview, admitter::Admitter,
};
use std::sync::Arc;
use tracing::{Span, debug, info, warn};

use crate::api::{api_error::ApiError, state::ApiServerState};

#[tracing::instrument(
    name = "mutate",
    fields(
        request_uid=tracing::field::Empty,
        host=crate::config::HOSTNAME.as_str(),
        name=tracing::field::Empty,
        namespace=tracing::field::Empty,
        operation=tracing::field::Empty,
        kind_group=tracing::field::Empty,
        kind_version=tracing::field::Empty,
        kind=tracing::field::Empty,
        allowed=tracing::field::Empty,
        mutated=tracing::field::Empty,
    ),
    skip_all)]
/// Admit the Pod wrapped by an AdmissionReview, answering with the review
/// extended with a JSON patch.
pub(crate) async fn mutate_handler(
    extract::State(state): extract::State<Arc<ApiServerState>>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    match mutate(state.admitter.as_ref(), body) {
        Ok(response) => {
            info!("Successfully handled a webhook request");
            response
        }
        Err(error) => {
            warn!(
                status = error.status.as_u16(),
                error = error.message.as_str(),
                "Could not handle a webhook request"
            );
            error.into_response()
        }
    }
}

/// Reject every method other than POST on the mutation endpoint, without
/// looking at the body.
pub(crate) async fn method_not_allowed_handler(method: Method) -> ApiError {
    let error = ApiError::method_not_allowed(&method);
    warn!(
        status = error.status.as_u16(),
        error = error.message.as_str(),
        "Could not handle a webhook request"
    );
    error
}

pub(crate) async fn readiness_handler() -> StatusCode {
    StatusCode::OK
}

fn mutate(
    admitter: &dyn Admitter,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, ApiError> {
    let body = body?;

    let admission_review: AdmissionReview = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("could not parse the request body: {e}")))?;
    let request = admission_review.request.as_ref().ok_or_else(|| {
        ApiError::bad_request("malformed admission review: request is missing")
    })?;

    populate_span_with_admission_request_data(request);

    let response = admitter.admit(request).map_err(|e| {
        ApiError::bad_request(format!("could not admit the requested resource: {e}"))
    })?;

    populate_span_with_admission_response_data(&response);
    debug!(response =? &response, "pod admitted");

    let body = serde_json::to_vec(&admission_review.into_answer(response))
        .map_err(|e| ApiError::internal(format!("could not serialize the response body: {e}")))?;

    Ok((
        [(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())],
        body,
    )
        .into_response())
}

fn populate_span_with_admission_request_data(adm_req: &AdmissionRequest) {
    Span::current().record("kind", adm_req.kind.kind.as_str());
    Span::current().record("kind_group", adm_req.kind.group.as_str());
    Span::current().record("kind_version", adm_req.kind.version.as_str());
    Span::current().record("name", adm_req.name.clone().unwrap_or_default().as_str());
    Span::current().record(
        "namespace",
        adm_req.namespace.clone().unwrap_or_default().as_str(),
    );
    Span::current().record("operation", adm_req.operation.as_str());
    Span::current().record("request_uid", adm_req.uid.as_str());
}

fn populate_span_with_admission_response_data(response: &AdmissionResponse) {
    Span::current().record("allowed", response.allowed);
    Span::current().record("mutated", response.patch.is_some());
}
