pub mod config;
pub mod parquet;
pub mod s3;
pub mod writer;

pub use config::StorageConfig;
pub use crate::parquet::{read_parquet, write_parquet};
pub use s3::S3Uploader;
pub use writer::DatasetWriter;
