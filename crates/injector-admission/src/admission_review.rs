use crate::admission_request::AdmissionRequest;
use crate::admission_response::AdmissionResponse;

pub const ADMISSION_REVIEW_API_VERSION: &str = "admission.k8s.io/v1";
pub const ADMISSION_REVIEW_KIND: &str = "AdmissionReview";

/// The envelope exchanged with the API server. Requests carry `request`,
/// answers carry both the echoed `request` and the new `response`.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReview {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<AdmissionRequest>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<AdmissionResponse>,
}

impl Default for AdmissionReview {
    fn default() -> Self {
        AdmissionReview {
            api_version: Some(String::from(ADMISSION_REVIEW_API_VERSION)),
            kind: Some(String::from(ADMISSION_REVIEW_KIND)),
            request: None,
            response: None,
        }
    }
}

impl AdmissionReview {
    /// Build the answer to this review: same envelope type, request echoed,
    /// `response` attached.
    pub fn into_answer(self, response: AdmissionResponse) -> AdmissionReview {
        AdmissionReview {
            api_version: self
                .api_version
                .or_else(|| Some(String::from(ADMISSION_REVIEW_API_VERSION))),
            kind: self
                .kind
                .or_else(|| Some(String::from(ADMISSION_REVIEW_KIND))),
            request: self.request,
            response: Some(response),
        }
    }
}
