pub mod model;
pub mod path;
pub mod progress;
pub mod transfer;
pub mod validate;
pub mod service;
pub mod http;

pub use model::{BatchMetadata, CommitPhotoPayload, FileFailure, LocalFile, UploadReport, UploadStage};
pub use progress::{NoProgress, ProgressSink, UploadProgress};
pub use transfer::{ByteTransfer, HttpTransfer};
pub use validate::{content_type_for_name, UploadLimits};
pub use service::*;
pub use http::*;
