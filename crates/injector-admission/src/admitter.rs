use json_patch::Patch;
use k8s_openapi::api::core::v1::Pod;
use serde::Deserialize;
use tracing::debug;

use crate::{
    admission_request::{AdmissionRequest, GroupVersionKind},
    admission_response::AdmissionResponse,
    errors::AdmissionError,
    patch_builder::{InjectionConfig, compute_mutation_patch},
};

/// Core API group name as written by admission clients. The API server
/// itself serializes the core group as an empty string, both are accepted.
const CORE_GROUP: &str = "core";
const POD_VERSION: &str = "v1";
const POD_KIND: &str = "Pod";

/// Validates an admission request and admits it, possibly mutating the object.
pub trait Admitter: Send + Sync {
    fn admit(&self, request: &AdmissionRequest) -> Result<AdmissionResponse, AdmissionError>;
}

/// Admits Pods by injecting the configured scaffolding into them.
#[derive(Clone, Debug, Default)]
pub struct PodAdmitter {
    config: InjectionConfig,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TypeMeta {
    api_version: Option<String>,
    kind: Option<String>,
}

impl PodAdmitter {
    pub fn new(config: InjectionConfig) -> Self {
        PodAdmitter { config }
    }

    pub fn config(&self) -> &InjectionConfig {
        &self.config
    }

    fn decode_pod(request: &AdmissionRequest) -> Result<Pod, AdmissionError> {
        let object = request
            .object
            .as_ref()
            .map(|raw| &raw.0)
            .filter(|value| !value.is_null())
            .ok_or_else(|| AdmissionError::Decode(String::from("the object is empty")))?;

        let type_meta = TypeMeta::deserialize(object)
            .map_err(|e| AdmissionError::Decode(e.to_string()))?;
        let kind = type_meta
            .kind
            .ok_or_else(|| AdmissionError::Decode(String::from("the object has no kind")))?;
        let api_version = type_meta.api_version.unwrap_or_default();
        if kind != POD_KIND || !(api_version.is_empty() || api_version == POD_VERSION) {
            return Err(AdmissionError::TypeMismatch(format!("{api_version}/{kind}")));
        }

        Pod::deserialize(object).map_err(|e| AdmissionError::Decode(e.to_string()))
    }
}

/// Whether `kind` designates a core v1 Pod.
pub fn is_pod(kind: &GroupVersionKind) -> bool {
    (kind.group == CORE_GROUP || kind.group.is_empty())
        && kind.version == POD_VERSION
        && kind.kind == POD_KIND
}

impl Admitter for PodAdmitter {
    fn admit(&self, request: &AdmissionRequest) -> Result<AdmissionResponse, AdmissionError> {
        if !is_pod(&request.kind) {
            return Err(AdmissionError::InvalidKind(request.kind.clone()));
        }

        let pod = Self::decode_pod(request)?;
        let spec = pod.spec.unwrap_or_default();
        if spec.containers.is_empty() {
            return Err(AdmissionError::NoContainers);
        }

        let patch = Patch(compute_mutation_patch(&self.config, &spec));
        debug!(
            request_uid = request.uid.as_str(),
            operations = patch.0.len(),
            "mutation patch computed"
        );

        AdmissionResponse::allow_with_patch(request.uid.clone(), &patch)
            .map_err(AdmissionError::Serialization)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admission_response::PatchType;
    use k8s_openapi::apimachinery::pkg::runtime::RawExtension;
    use rstest::*;
    use serde_json::{Value, json};

    fn pod_kind() -> GroupVersionKind {
        GroupVersionKind::new("core", "v1", "Pod")
    }

    fn request(kind: GroupVersionKind, object: Option<Value>) -> AdmissionRequest {
        AdmissionRequest {
            uid: String::from("705ab4f5-6393-11e8-b7cc-42010a800002"),
            kind,
            object: object.map(RawExtension),
            ..Default::default()
        }
    }

    fn pod_with_one_container() -> Value {
        json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "spec": {"containers": [{"name": "foo", "image": "foo:latest"}]}
        })
    }

    #[test]
    fn fails_invalid_admission_request_kind() {
        // the object is a valid Pod: the kind check comes first
        let req = request(
            GroupVersionKind::new("autoscaling", "v1", "Scale"),
            Some(pod_with_one_container()),
        );

        let err = PodAdmitter::default().admit(&req).unwrap_err();
        assert!(matches!(err, AdmissionError::InvalidKind(_)), "got {err:?}");
    }

    #[rstest]
    #[case::core_group("core")]
    #[case::empty_group("")]
    fn succeeds_if_valid_admission_request_kind(#[case] group: &str) {
        let req = request(
            GroupVersionKind::new(group, "v1", "Pod"),
            Some(pod_with_one_container()),
        );

        assert!(PodAdmitter::default().admit(&req).is_ok());
    }

    #[rstest]
    #[case::wrong_version(GroupVersionKind::new("core", "v2", "Pod"))]
    #[case::wrong_kind(GroupVersionKind::new("core", "v1", "Service"))]
    #[case::zero_filled(GroupVersionKind::default())]
    fn rejects_other_kinds(#[case] kind: GroupVersionKind) {
        let req = request(kind, Some(pod_with_one_container()));

        let err = PodAdmitter::default().admit(&req).unwrap_err();
        assert!(matches!(err, AdmissionError::InvalidKind(_)), "got {err:?}");
    }

    #[rstest]
    #[case::nil_object(None)]
    #[case::null_object(Some(Value::Null))]
    #[case::not_an_object(Some(json!("a pod")))]
    #[case::no_kind(Some(json!({"apiVersion": "v1", "spec": {"containers": []}})))]
    #[case::bad_shape(Some(json!({"apiVersion": "v1", "kind": "Pod", "spec": {"containers": "foo"}})))]
    fn fails_if_object_cannot_be_decoded(#[case] object: Option<Value>) {
        let req = request(pod_kind(), object);

        let err = PodAdmitter::default().admit(&req).unwrap_err();
        assert!(matches!(err, AdmissionError::Decode(_)), "got {err:?}");
    }

    #[test]
    fn fails_if_object_is_not_a_pod() {
        let pv = json!({"apiVersion": "v1", "kind": "PersistentVolume", "spec": {}});
        let req = request(pod_kind(), Some(pv));

        let err = PodAdmitter::default().admit(&req).unwrap_err();
        match err {
            AdmissionError::TypeMismatch(found) => assert_eq!(found, "v1/PersistentVolume"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[rstest]
    #[case::empty_containers(json!({"apiVersion": "v1", "kind": "Pod", "spec": {"containers": []}}))]
    #[case::no_spec(json!({"apiVersion": "v1", "kind": "Pod"}))]
    fn fails_if_pod_has_no_containers(#[case] pod: Value) {
        let req = request(pod_kind(), Some(pod));

        let err = PodAdmitter::default().admit(&req).unwrap_err();
        assert!(matches!(err, AdmissionError::NoContainers), "got {err:?}");
    }

    #[test]
    fn returns_json_patch() {
        let req = request(pod_kind(), Some(pod_with_one_container()));

        let response = PodAdmitter::default().admit(&req).unwrap();

        assert_eq!(response.uid, "705ab4f5-6393-11e8-b7cc-42010a800002");
        assert!(response.allowed);
        assert_eq!(response.patch_type, Some(PatchType::JSONPatch));

        let patch: Value = serde_json::from_slice(&response.decoded_patch().unwrap()).unwrap();
        let paths: Vec<&str> = patch
            .as_array()
            .unwrap()
            .iter()
            .map(|op| op["path"].as_str().unwrap())
            .collect();
        assert_eq!(
            paths,
            vec![
                "/spec/volumes",
                "/spec/initContainers",
                "/spec/containers/0/volumeMounts",
                "/spec/containers/0/command",
            ]
        );
    }

    #[test]
    fn uses_the_injection_config() {
        let admitter = PodAdmitter::new(InjectionConfig {
            binary_name: String::from("launcher"),
            ..Default::default()
        });
        let req = request(pod_kind(), Some(pod_with_one_container()));

        let response = admitter.admit(&req).unwrap();
        let patch: Value = serde_json::from_slice(&response.decoded_patch().unwrap()).unwrap();

        assert_eq!(patch[3]["value"], json!(["/bin/voltron/launcher"]));
    }
}
