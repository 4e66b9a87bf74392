//! Shared domain primitives for the DataZone catalog pipeline.
//!
//! This crate owns request parsing, principal and policy shaping, retry
//! scheduling, custom resource contracts and asset metadata rendering. It
//! intentionally excludes AWS SDK and Lambda runtime concerns.

pub mod asset_metadata;
pub mod custom_resource;
pub mod error;
pub mod grant_request;
pub mod policy_detail;
pub mod principal;
pub mod retry;
