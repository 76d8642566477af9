pub mod common;
mod pipeline_tests;
mod s3_tests;
mod writer_tests;
