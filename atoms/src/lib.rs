//! Gallery domain atoms: photos, categories, uploads and the stores behind them.
//!
//! Every operation takes its collaborators as trait objects; nothing here
//! builds an AWS client.

pub mod auth;
pub mod categories;
pub mod dynamo;
pub mod error;
pub mod http;
pub mod photos;
pub mod storage;
pub mod store;
pub mod uploads;

pub use dynamo::DynamoStore;
pub use error::{FileOutcome, GalleryError, GalleryResult};
pub use storage::{ObjectStore, S3ObjectStore, UploadTicket};
pub use store::{CategoryStore, PhotoQuery, PhotoStore};
