//! AWS-oriented adapters and handlers for the DataZone catalog pipeline.
//!
//! This crate owns runtime integration details (Lambda handlers, DataZone,
//! S3, SNS and CloudFormation callback adapters). Domain shaping lives in
//! `datazone_pipeline_core`.

pub mod adapters;
pub mod config;
pub mod handlers;
pub mod telemetry;
