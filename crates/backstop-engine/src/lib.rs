//! Error resolution for Backstop
//!
//! [`ErrorResolver`] runs an error through the classifier chain, picks the
//! HTTP status, logs the diagnostics and produces an [`ErrorResponse`] ready
//! to be written by a web framework adapter. With the `http` feature the
//! [`http`](crate::http) module provides that adapter for axum.

#![allow(clippy::must_use_candidate)]

mod contract;
mod logging;
pub mod metrics;
mod resolver;
mod response;

#[cfg(feature = "http")]
pub mod http;

pub use contract::{ContractCode, ContractError, ErrorContract};
pub use logging::{RequestLogging, render_stack_trace};
pub use metrics::Outcome;
pub use resolver::{
    DEFAULT_ERROR_ID_HEADER, ErrorResolver, LAST_DITCH_CODE, LAST_DITCH_HTTP_STATUS, LAST_DITCH_MESSAGE,
    ResolverOptions,
};
pub use response::ErrorResponse;
