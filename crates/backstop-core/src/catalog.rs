//! Authoritative set of errors a service can return

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::{ApiError, CatalogError, CoreErrors, CoreRole, ErrorCodeRange, SortedErrorSet};

/// Default ranking of HTTP statuses, highest precedence first
///
/// Authorization problems trump everything, server-side failures trump client
/// mistakes, and throttling trumps plain validation failures.
pub const DEFAULT_STATUS_CODE_PRIORITY_ORDER: &[u16] = &[403, 401, 503, 500, 429, 400, 405, 404, 415, 406];

/// Core plus project-specific errors with their invariants enforced
///
/// Built once at startup and shared read-only (typically behind an `Arc`).
#[derive(Debug, Clone)]
pub struct ProjectErrorCatalog {
    core: CoreErrors,
    project: Vec<ApiError>,
    range: ErrorCodeRange,
    priority_order: Vec<u16>,
    // core errors first, then project errors that are not core errors
    errors: Vec<ApiError>,
    by_name: HashMap<String, usize>,
}

impl ProjectErrorCatalog {
    /// Start building a catalog whose project errors must fall in `range`
    pub fn builder(range: ErrorCodeRange) -> CatalogBuilder {
        CatalogBuilder {
            core: CoreErrors::default(),
            project: Vec::new(),
            range,
            priority_order: DEFAULT_STATUS_CODE_PRIORITY_ORDER.to_vec(),
        }
    }

    /// Build and validate a catalog
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if names collide, codes collide between
    /// errors that are not wrappers of each other, a project error falls
    /// outside `range`, or the priority order is empty, has duplicates, or
    /// misses a status some error uses
    pub fn new(
        core: CoreErrors,
        project: Vec<ApiError>,
        range: ErrorCodeRange,
        priority_order: Vec<u16>,
    ) -> Result<Self, CatalogError> {
        let mut errors: Vec<ApiError> = core.iter().map(|(_, error)| error.clone()).collect();
        errors.extend(project.iter().filter(|error| !core.contains(error)).cloned());

        let by_name = index_unique_names(&errors)?;
        check_codes(&errors)?;
        check_range(&core, &project, &range)?;
        check_priority_order(&errors, &priority_order)?;

        tracing::debug!(
            core_errors = core.len(),
            project_errors = project.len(),
            range = %range,
            "project error catalog built"
        );

        Ok(Self {
            core,
            project,
            range,
            priority_order,
            errors,
            by_name,
        })
    }

    /// Look up an error by its exact name
    ///
    /// This is how free-form strings (e.g. a constraint violation message) are
    /// turned into structured errors. Unknown or empty names yield `None`.
    pub fn convert_to_api_error(&self, name: &str) -> Option<&ApiError> {
        if name.is_empty() {
            return None;
        }
        self.by_name.get(name).map(|&index| &self.errors[index])
    }

    /// Look up an error by name, returning `fallback` on a miss
    pub fn convert_to_api_error_or<'a>(&'a self, name: &str, fallback: &'a ApiError) -> &'a ApiError {
        self.convert_to_api_error(name).unwrap_or(fallback)
    }

    /// Pick the HTTP status to return for a collection of errors
    ///
    /// The first status in the priority order that any error uses wins, so
    /// the result does not depend on iteration order. When none of the
    /// statuses are ranked, errors that all share one status yield it (a
    /// single error always yields its own status); anything else is `None`.
    pub fn determine_highest_priority_http_status_code<'a, I>(&self, errors: I) -> Option<u16>
    where
        I: IntoIterator<Item = &'a ApiError>,
    {
        let statuses: BTreeSet<u16> = errors.into_iter().map(ApiError::http_status_code).collect();

        if let Some(&status) = self.priority_order.iter().find(|status| statuses.contains(status)) {
            return Some(status);
        }

        let mut statuses = statuses.into_iter();
        match (statuses.next(), statuses.next()) {
            (Some(only), None) => Some(only),
            _ => None,
        }
    }

    /// Subset of `errors` whose status is `http_status_code`
    pub fn sublist_with_http_status_code<'a, I>(errors: I, http_status_code: u16) -> SortedErrorSet
    where
        I: IntoIterator<Item = &'a ApiError>,
    {
        errors
            .into_iter()
            .filter(|error| error.http_status_code() == http_status_code)
            .cloned()
            .collect()
    }

    /// Whether `error` shares code, message and status with some core error
    pub fn is_wrapper_around_core_error(error: &ApiError, core: &CoreErrors) -> bool {
        core.iter().any(|(_, core_error)| error.is_wrapper_of(core_error))
    }

    /// Core error filling `role`
    pub fn core(&self, role: CoreRole) -> &ApiError {
        self.core.get(role)
    }

    /// Shorthand for the generic service error
    pub fn generic_service_error(&self) -> &ApiError {
        self.core.get(CoreRole::GenericServiceError)
    }

    /// All core errors
    pub const fn core_errors(&self) -> &CoreErrors {
        &self.core
    }

    /// Project-specific errors as declared
    pub fn project_errors(&self) -> &[ApiError] {
        &self.project
    }

    /// Every error in the catalog, core errors first
    pub fn errors(&self) -> &[ApiError] {
        &self.errors
    }

    /// Range project errors must fall into
    pub const fn range(&self) -> &ErrorCodeRange {
        &self.range
    }

    /// HTTP statuses ranked from highest to lowest precedence
    pub fn status_code_priority_order(&self) -> &[u16] {
        &self.priority_order
    }
}

/// Builder for [`ProjectErrorCatalog`]
#[derive(Debug, Clone)]
pub struct CatalogBuilder {
    core: CoreErrors,
    project: Vec<ApiError>,
    range: ErrorCodeRange,
    priority_order: Vec<u16>,
}

impl CatalogBuilder {
    /// Replace the baseline core errors
    #[must_use]
    pub fn core_errors(mut self, core: CoreErrors) -> Self {
        self.core = core;
        self
    }

    /// Add one project-specific error
    #[must_use]
    pub fn error(mut self, error: ApiError) -> Self {
        self.project.push(error);
        self
    }

    /// Add several project-specific errors
    #[must_use]
    pub fn errors(mut self, errors: impl IntoIterator<Item = ApiError>) -> Self {
        self.project.extend(errors);
        self
    }

    /// Replace the status code priority order
    #[must_use]
    pub fn status_code_priority_order(mut self, order: impl Into<Vec<u16>>) -> Self {
        self.priority_order = order.into();
        self
    }

    /// Validate and build the catalog
    ///
    /// # Errors
    ///
    /// See [`ProjectErrorCatalog::new`]
    pub fn build(self) -> Result<ProjectErrorCatalog, CatalogError> {
        ProjectErrorCatalog::new(self.core, self.project, self.range, self.priority_order)
    }
}

fn index_unique_names(errors: &[ApiError]) -> Result<HashMap<String, usize>, CatalogError> {
    let mut by_name = HashMap::with_capacity(errors.len());

    for (index, error) in errors.iter().enumerate() {
        if by_name.insert(error.name().to_owned(), index).is_some() {
            return Err(CatalogError::DuplicateName {
                name: error.name().to_owned(),
            });
        }
    }

    Ok(by_name)
}

fn check_codes(errors: &[ApiError]) -> Result<(), CatalogError> {
    let mut first_by_code: HashMap<&str, &ApiError> = HashMap::new();

    for error in errors {
        // being wrappers is an equivalence, comparing against the first holder is enough
        match first_by_code.get(error.error_code()) {
            Some(first) if !error.is_wrapper_of(first) => {
                return Err(CatalogError::CollidingCode {
                    code: error.error_code().to_owned(),
                    first: first.name().to_owned(),
                    second: error.name().to_owned(),
                });
            }
            Some(_) => {}
            None => {
                first_by_code.insert(error.error_code(), error);
            }
        }
    }

    Ok(())
}

fn check_range(core: &CoreErrors, project: &[ApiError], range: &ErrorCodeRange) -> Result<(), CatalogError> {
    let offender = project.iter().find(|error| {
        !core.contains(error)
            && !ProjectErrorCatalog::is_wrapper_around_core_error(error, core)
            && !range.contains(error)
    });

    match offender {
        Some(error) => Err(CatalogError::OutOfRange {
            name: error.name().to_owned(),
            code: error.error_code().to_owned(),
            range: range.to_string(),
        }),
        None => Ok(()),
    }
}

fn check_priority_order(errors: &[ApiError], priority_order: &[u16]) -> Result<(), CatalogError> {
    if priority_order.is_empty() {
        return Err(CatalogError::EmptyPriorityOrder);
    }

    let mut ranked = HashSet::with_capacity(priority_order.len());
    for &status in priority_order {
        if !ranked.insert(status) {
            return Err(CatalogError::DuplicatePriority { status });
        }
    }

    match errors.iter().find(|error| !ranked.contains(&error.http_status_code())) {
        Some(error) => Err(CatalogError::MissingPriority {
            status: error.http_status_code(),
            name: error.name().to_owned(),
        }),
        None => Ok(()),
    }
}
