//! HTTP request handlers
//!
//! - `api` - Health check endpoint
//! - `actions` - Action discovery and invocation

pub mod actions;
pub mod api;
