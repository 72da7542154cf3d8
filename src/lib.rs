//! Quotaguard - request guards for a contractor marketplace API
//!
//! This crate holds the pieces of the marketplace backend that carry real
//! logic: identity-keyed fixed-window quotas for the API call sites, the
//! upload validation pipeline, and completion tracking for the multi-step
//! estimate and signup forms. The `http` module wires them into an axum
//! service.

pub mod config;
pub mod error;
pub mod form;
pub mod http;
pub mod ratelimit;
pub mod upload;
