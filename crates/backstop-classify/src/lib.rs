//! Error shapes and the classifiers that recognise them
//!
//! A [`ClassifierChain`] asks each [`Classifier`] in turn whether it
//! recognises an error. The first one that does decides which catalog errors
//! the client sees and which diagnostic details are logged.

#![allow(clippy::must_use_candidate)]

mod api_exception;
mod classifier;
mod downstream;
mod framework;
mod type_names;
mod validation;

pub use api_exception::{ApiException, ApiExceptionBuilder, ApiExceptionClassifier};
pub use classifier::{
    BoxError, Claimed, Classification, Classifier, ClassifierChain, ClassifierOptions, Handled, StackTraceLogging,
    find_cause,
};
pub use downstream::{DownstreamError, DownstreamFailure, DownstreamNetworkClassifier};
pub use framework::{FieldError, FieldValidationClassifier, FrameworkClassifier, FrameworkError, ParameterLocation};
pub use type_names::coarse_type_name;
pub use validation::{
    ClientDataValidationClassifier, ClientDataValidationError, ConstraintViolation, ServersideValidationClassifier,
    ServersideValidationError,
};
