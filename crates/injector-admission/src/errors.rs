use thiserror::Error;

use crate::admission_request::GroupVersionKind;

#[derive(Error, Debug)]
pub enum AdmissionError {
    #[error("invalid admission request kind \"{0}\", only Pods can be admitted")]
    InvalidKind(GroupVersionKind),

    #[error("cannot decode the admission request object: {0}")]
    Decode(String),

    #[error("the admission request object is a {0}, not a Pod")]
    TypeMismatch(String),

    #[error("the pod has no containers")]
    NoContainers,

    #[error("cannot serialize the JSON patch: {0}")]
    Serialization(#[source] serde_json::Error),
}
