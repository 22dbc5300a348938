use std::error::Error;
use std::sync::Arc;

use backstop_core::{ApiError, ProjectErrorCatalog, SortedErrorSet};

use crate::{
    ApiExceptionClassifier, ClientDataValidationClassifier, DownstreamNetworkClassifier, FieldValidationClassifier,
    FrameworkClassifier, ServersideValidationClassifier,
};

/// Boxed error used as an optional cause on the error shapes in this crate
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// Whether the resolver logs the error's cause chain and debug rendering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StackTraceLogging {
    /// Log it for server errors (status >= 500) only
    #[default]
    DeferToDefault,
    /// Always log it
    Force,
    /// Never log it
    Suppress,
}

impl StackTraceLogging {
    /// Apply this preference to a resolved status
    pub const fn should_log(self, http_status_code: u16) -> bool {
        match self {
            Self::DeferToDefault => http_status_code >= 500,
            Self::Force => true,
            Self::Suppress => false,
        }
    }
}

/// What a classifier extracted from an error it recognised
#[derive(Debug, Clone, Default)]
pub struct Handled {
    /// Errors to report to the client
    pub errors: SortedErrorSet,
    /// Diagnostic key/value pairs, logged in order
    pub log_details: Vec<(String, String)>,
    /// Extra response headers, each with one or more values
    pub headers: Vec<(String, Vec<String>)>,
    /// Stack trace logging preference
    pub stack_trace: StackTraceLogging,
}

impl Handled {
    /// Result reporting `errors` with no extra detail
    pub const fn new(errors: SortedErrorSet) -> Self {
        Self {
            errors,
            log_details: Vec::new(),
            headers: Vec::new(),
            stack_trace: StackTraceLogging::DeferToDefault,
        }
    }

    /// Result reporting a single error
    pub fn single(error: ApiError) -> Self {
        Self::new(SortedErrorSet::singleton_of(error))
    }

    /// Append a diagnostic detail
    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.log_details.push((key.into(), value.into()));
        self
    }

    /// Append a response header
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, values: Vec<String>) -> Self {
        self.headers.push((name.into(), values));
        self
    }

    /// Override the stack trace logging preference
    #[must_use]
    pub const fn with_stack_trace(mut self, stack_trace: StackTraceLogging) -> Self {
        self.stack_trace = stack_trace;
        self
    }
}

/// Outcome of asking one classifier about an error
#[derive(Debug, Clone)]
pub enum Classification {
    /// The classifier does not recognise the error
    Ignore,
    /// The classifier claims the error
    Handle(Handled),
}

impl Classification {
    /// Whether the error was claimed
    pub const fn is_handled(&self) -> bool {
        matches!(self, Self::Handle(_))
    }
}

/// One rule mapping an error shape to catalog errors
///
/// Implementations must be cheap and side-effect free: they run inline on
/// whatever thread or task is handling the failed request.
pub trait Classifier: Send + Sync {
    /// Short name used in logs and metrics
    fn name(&self) -> &'static str;

    /// Inspect `error` and claim it or let it pass
    fn classify(&self, error: &(dyn Error + 'static)) -> Classification;
}

/// Find the first error of type `T` in `error`'s source chain, `error` included
pub fn find_cause<'a, T>(error: &'a (dyn Error + 'static)) -> Option<&'a T>
where
    T: Error + 'static,
{
    std::iter::successors(Some(error), |&current| current.source()).find_map(|current| current.downcast_ref::<T>())
}

/// Knobs the standard classifiers accept
#[derive(Debug, Clone, Copy)]
pub struct ClassifierOptions {
    /// Forward a downstream 429 to the caller as 429
    pub propagate_downstream_too_many_requests: bool,
    /// Log the downstream response body next to the error
    pub log_downstream_response_body: bool,
}

impl Default for ClassifierOptions {
    fn default() -> Self {
        Self {
            propagate_downstream_too_many_requests: true,
            log_downstream_response_body: true,
        }
    }
}

/// A classification together with the classifier that produced it
#[derive(Debug, Clone)]
pub struct Claimed {
    /// Name of the winning classifier
    pub classifier: &'static str,
    /// What it extracted
    pub handled: Handled,
}

/// Ordered list of classifiers; the first one to claim an error wins
///
/// More specific rules must come before more generic ones. Later classifiers
/// are never consulted once an earlier one has claimed the error.
#[derive(Default)]
pub struct ClassifierChain {
    classifiers: Vec<Box<dyn Classifier>>,
}

impl ClassifierChain {
    /// Empty chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Chain with every built-in classifier in its intended order
    pub fn standard(catalog: &Arc<ProjectErrorCatalog>, options: ClassifierOptions) -> Self {
        Self::new()
            .with(ApiExceptionClassifier::new(Arc::clone(catalog)))
            .with(ClientDataValidationClassifier::new(Arc::clone(catalog)))
            .with(ServersideValidationClassifier::new(Arc::clone(catalog)))
            .with(DownstreamNetworkClassifier::new(Arc::clone(catalog), options))
            .with(FieldValidationClassifier::new(Arc::clone(catalog)))
            .with(FrameworkClassifier::new(Arc::clone(catalog)))
    }

    /// Append a classifier at the lowest precedence
    #[must_use]
    pub fn with(mut self, classifier: impl Classifier + 'static) -> Self {
        self.classifiers.push(Box::new(classifier));
        self
    }

    /// Insert a classifier ahead of every existing one
    #[must_use]
    pub fn with_first(mut self, classifier: impl Classifier + 'static) -> Self {
        self.classifiers.insert(0, Box::new(classifier));
        self
    }

    /// Run the classifiers in order until one claims `error`
    pub fn classify(&self, error: &(dyn Error + 'static)) -> Option<Claimed> {
        self.classifiers.iter().find_map(|classifier| match classifier.classify(error) {
            Classification::Handle(handled) => Some(Claimed {
                classifier: classifier.name(),
                handled,
            }),
            Classification::Ignore => None,
        })
    }

    /// Classifier names in evaluation order
    pub fn names(&self) -> Vec<&'static str> {
        self.classifiers.iter().map(|classifier| classifier.name()).collect()
    }

    /// Number of classifiers
    pub fn len(&self) -> usize {
        self.classifiers.len()
    }

    /// Whether the chain has no classifiers
    pub fn is_empty(&self) -> bool {
        self.classifiers.is_empty()
    }
}

impl std::fmt::Debug for ClassifierChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierChain")
            .field("classifiers", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use backstop_core::ErrorCodeRange;

    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("widget exploded")]
    struct WidgetError;

    #[derive(Debug, thiserror::Error)]
    #[error("while assembling order")]
    struct Wrapper(#[source] WidgetError);

    struct Fixed {
        name: &'static str,
        claims: bool,
        calls: Arc<AtomicUsize>,
    }

    impl Classifier for Fixed {
        fn name(&self) -> &'static str {
            self.name
        }

        fn classify(&self, _error: &(dyn Error + 'static)) -> Classification {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.claims {
                Classification::Handle(Handled::single(ApiError::new(self.name, "1", "", 400)))
            } else {
                Classification::Ignore
            }
        }
    }

    fn fixed(name: &'static str, claims: bool) -> (Fixed, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Fixed {
                name,
                claims,
                calls: Arc::clone(&calls),
            },
            calls,
        )
    }

    #[test]
    fn first_claiming_classifier_wins() {
        let (ignores, ignores_calls) = fixed("IGNORES", false);
        let (claims, claims_calls) = fixed("CLAIMS", true);
        let (also_claims, also_claims_calls) = fixed("ALSO_CLAIMS", true);

        let chain = ClassifierChain::new().with(ignores).with(claims).with(also_claims);
        let claimed = chain.classify(&WidgetError).unwrap();

        assert_eq!(claimed.classifier, "CLAIMS");
        assert_eq!(claimed.handled.errors.names(), ["CLAIMS"]);
        assert_eq!(ignores_calls.load(Ordering::SeqCst), 1);
        assert_eq!(claims_calls.load(Ordering::SeqCst), 1);
        assert_eq!(also_claims_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn with_first_takes_precedence() {
        let (claims, _) = fixed("CLAIMS", true);
        let (urgent, _) = fixed("URGENT", true);

        let chain = ClassifierChain::new().with(claims).with_first(urgent);
        assert_eq!(chain.names(), ["URGENT", "CLAIMS"]);
        assert_eq!(chain.classify(&WidgetError).unwrap().classifier, "URGENT");
    }

    #[test]
    fn empty_chain_claims_nothing() {
        assert!(ClassifierChain::new().classify(&WidgetError).is_none());
    }

    #[test]
    fn find_cause_walks_the_source_chain() {
        let wrapped = Wrapper(WidgetError);
        assert!(find_cause::<WidgetError>(&wrapped).is_some());
        assert!(find_cause::<Wrapper>(&wrapped).is_some());
        assert!(find_cause::<Wrapper>(&WidgetError).is_none());

        let erased = anyhow::Error::new(WidgetError).context("loading widget");
        assert!(find_cause::<WidgetError>(erased.as_ref()).is_some());
    }

    #[test]
    fn standard_chain_order() {
        let catalog = Arc::new(ProjectErrorCatalog::builder(ErrorCodeRange::AllowAll).build().unwrap());
        let chain = ClassifierChain::standard(&catalog, ClassifierOptions::default());

        assert_eq!(
            chain.names(),
            [
                "api_exception",
                "client_data_validation",
                "serverside_validation",
                "downstream_network",
                "field_validation",
                "framework",
            ]
        );
    }

    #[test]
    fn stack_trace_preference() {
        assert!(StackTraceLogging::DeferToDefault.should_log(500));
        assert!(!StackTraceLogging::DeferToDefault.should_log(499));
        assert!(StackTraceLogging::Force.should_log(400));
        assert!(!StackTraceLogging::Suppress.should_log(503));
    }
}
