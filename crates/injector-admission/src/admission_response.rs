use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Serialize};

/// This models the admission/v1/AdmissionResponse object of Kubernetes
/// See https://pkg.go.dev/k8s.io/kubernetes/pkg/apis/admission#AdmissionResponse
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Eq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionResponse {
    /// UID is an identifier for the individual request/response.
    /// This must be copied over from the corresponding AdmissionRequest.
    pub uid: String,

    /// Allowed indicates whether or not the admission request was permitted.
    pub allowed: bool,

    /// The type of Patch. Currently we only allow "JSONPatch".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch_type: Option<PatchType>,

    /// The patch body, base64 encoded. Currently we only support "JSONPatch"
    /// which implements RFC 6902.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,
}

/// PatchType is the type of patch being used to represent the mutated object
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Eq, Clone)]
pub enum PatchType {
    #[serde(rename = "JSONPatch")]
    #[default]
    JSONPatch,
}

impl AdmissionResponse {
    /// Allow the request and ask the API server to apply `patch` to the object.
    pub fn allow_with_patch(
        uid: String,
        patch: &json_patch::Patch,
    ) -> Result<AdmissionResponse, serde_json::Error> {
        let patch = serde_json::to_string(patch).map(|s| general_purpose::STANDARD.encode(s))?;

        Ok(AdmissionResponse {
            uid,
            allowed: true,
            patch_type: Some(PatchType::JSONPatch),
            patch: Some(patch),
        })
    }

    /// Decode the base64 patch carried by the response, if any.
    pub fn decoded_patch(&self) -> Option<Vec<u8>> {
        self.patch
            .as_ref()
            .and_then(|p| general_purpose::STANDARD.decode(p).ok())
    }
}
