//! Product Lens Common Library
//!
//! CLIとワークフローで共有される型と判定ロジック（I/Oなし）

pub mod catalog;
pub mod error;
pub mod parser;
pub mod prompts;
pub mod types;
pub mod validator;

pub use catalog::{
    empty_catalog_message, ModelCatalog, ModelVersion, VersionStatus, MIN_INFERENCE_UNITS, RUNNING,
};
pub use error::{Error, Result};
pub use parser::{parse_description_envelope, parse_detection_response, DescriptionEnvelope};
pub use types::{
    BoundingBox, DataUrl, DescriptionResult, DetectionResult, Geometry, Label, UploadedImage,
    ViewportRect,
};
pub use validator::{validate, Validation, MAX_IMAGE_BYTES};
