extern crate k8s_openapi;

pub mod admission_request;
pub mod admission_response;
pub mod admission_review;
pub mod admitter;
pub mod errors;
pub mod patch_builder;
