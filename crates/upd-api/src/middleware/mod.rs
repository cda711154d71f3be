//! # Middleware
//!
//! Tower/axum layers wrapped around every route.

pub mod cors;
pub mod tracing_layer;
