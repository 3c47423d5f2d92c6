// Re-export model types and service functions
pub mod model;
pub mod service;
pub mod http;

pub use model::{
    FeedCursor, ListPhotosParams, NewPhoto, Photo, PhotoPage, PhotoWithCategories,
    UpdatePhotoPayload,
};
pub use service::*;
pub use http::*;
