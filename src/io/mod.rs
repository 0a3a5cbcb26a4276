mod blob;
mod s3_store;

pub use blob::BlobStore;
pub use s3_store::{create_s3_client, S3BlobStore};
