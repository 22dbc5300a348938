//! Error model and project error catalog for Backstop
//!
//! An [`ApiError`] is the client-safe description of one failure. A
//! [`ProjectErrorCatalog`] is the complete, validated set of errors a service
//! may return, and decides which HTTP status wins when several errors are
//! reported together.

#![allow(clippy::must_use_candidate)]

mod api_error;
pub mod catalog;
mod core_errors;
mod error;
pub mod headers;
mod range;
mod request;
mod sorted_set;

pub use api_error::{ApiError, Metadata};
pub use catalog::{CatalogBuilder, DEFAULT_STATUS_CODE_PRIORITY_ORDER, ProjectErrorCatalog};
pub use core_errors::{CoreErrors, CoreRole};
pub use error::CatalogError;
pub use headers::{HeaderRedaction, NameOrPattern};
pub use range::ErrorCodeRange;
pub use request::RequestInfo;
pub use sorted_set::SortedErrorSet;
