//! Computation of the JSON patch that injects the Voltron scaffolding into a
//! Pod: a shared in-memory volume, an init container populating it, and the
//! first container rewired to start through the injected binary.

use json_patch::{AddOperation, PatchOperation, ReplaceOperation, jsonptr::PointerBuf};
use k8s_openapi::api::core::v1::PodSpec;
use serde_json::{Value, json};

pub const DEFAULT_VOLUME_NAME: &str = "voltron-env";
pub const DEFAULT_INIT_CONTAINER_NAME: &str = "nginx";
pub const DEFAULT_INIT_CONTAINER_IMAGE: &str = "nginx:latest";
pub const DEFAULT_MOUNT_PATH: &str = "/bin/voltron";
pub const DEFAULT_BINARY_NAME: &str = "injector";

/// What gets injected into every admitted Pod.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InjectionConfig {
    pub volume_name: String,
    pub init_container_name: String,
    pub init_container_image: String,
    pub mount_path: String,
    pub binary_name: String,
}

impl Default for InjectionConfig {
    fn default() -> Self {
        InjectionConfig {
            volume_name: DEFAULT_VOLUME_NAME.to_owned(),
            init_container_name: DEFAULT_INIT_CONTAINER_NAME.to_owned(),
            init_container_image: DEFAULT_INIT_CONTAINER_IMAGE.to_owned(),
            mount_path: DEFAULT_MOUNT_PATH.to_owned(),
            binary_name: DEFAULT_BINARY_NAME.to_owned(),
        }
    }
}

impl InjectionConfig {
    /// Path of the binary the first container is started with.
    pub fn injected_binary_path(&self) -> String {
        format!(
            "{}/{}",
            self.mount_path.trim_end_matches('/'),
            self.binary_name
        )
    }

    fn volume(&self) -> Value {
        json!({
            "name": self.volume_name,
            "emptyDir": { "medium": "Memory" },
        })
    }

    fn volume_mount(&self) -> Value {
        json!({
            "name": self.volume_name,
            "mountPath": self.mount_path,
        })
    }

    fn init_container(&self) -> Value {
        json!({
            "name": self.init_container_name,
            "image": self.init_container_image,
            "volumeMounts": [self.volume_mount()],
        })
    }
}

/// Compute the operations turning `spec` into the injected Pod spec.
///
/// Arrays are appended to by position: an empty or absent array is added
/// whole at `/<array>`, otherwise the new item goes to `/<array>/<len>`.
/// Only the first container is rewired; a spec without containers gets the
/// volume and the init container only; callers reject such Pods beforehand.
///
/// The patch is not idempotent: applying it to an already injected Pod
/// appends a second volume and init container.
pub fn compute_mutation_patch(config: &InjectionConfig, spec: &PodSpec) -> Vec<PatchOperation> {
    let mut operations = Vec::with_capacity(4);

    operations.push(append(
        &["spec", "volumes"],
        spec.volumes.as_ref().map_or(0, Vec::len),
        config.volume(),
    ));
    operations.push(append(
        &["spec", "initContainers"],
        spec.init_containers.as_ref().map_or(0, Vec::len),
        config.init_container(),
    ));

    if let Some(container) = spec.containers.first() {
        operations.push(append(
            &["spec", "containers", "0", "volumeMounts"],
            container.volume_mounts.as_ref().map_or(0, Vec::len),
            config.volume_mount(),
        ));

        let binary_path = config.injected_binary_path();
        let has_command = container.command.as_ref().is_some_and(|c| !c.is_empty());
        if has_command {
            // only the executable is swapped, its arguments are kept
            operations.push(PatchOperation::Replace(ReplaceOperation {
                path: pointer(&["spec", "containers", "0", "command", "0"]),
                value: Value::String(binary_path),
            }));
        } else {
            operations.push(PatchOperation::Add(AddOperation {
                path: pointer(&["spec", "containers", "0", "command"]),
                value: json!([binary_path]),
            }));
        }
    }

    operations
}

fn append(array: &[&str], len: usize, item: Value) -> PatchOperation {
    if len == 0 {
        PatchOperation::Add(AddOperation {
            path: pointer(array),
            value: Value::Array(vec![item]),
        })
    } else {
        let index = len.to_string();
        let mut tokens = array.to_vec();
        tokens.push(index.as_str());
        PatchOperation::Add(AddOperation {
            path: pointer(&tokens),
            value: item,
        })
    }
}

fn pointer(tokens: &[&str]) -> PointerBuf {
    PointerBuf::from_tokens(tokens.iter().map(|t| t.to_string()))
}
