use thiserror::Error;

/// Catalog misconfiguration detected at construction time
///
/// These are programmer errors. Callers are expected to propagate them out of
/// startup so the service never runs with an inconsistent catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// Two distinct errors share a name
    #[error("duplicate error name `{name}` in catalog")]
    DuplicateName { name: String },

    /// Two errors share a code without describing the same logical error
    #[error("errors `{first}` and `{second}` share error code `{code}` but are not wrappers of each other")]
    CollidingCode { code: String, first: String, second: String },

    /// A project error is neither core, a core wrapper, nor inside the project range
    #[error("error `{name}` has code `{code}` outside the project range {range} and does not wrap a core error")]
    OutOfRange { name: String, code: String, range: String },

    /// An error uses a status the priority order cannot rank
    #[error("http status {status} used by `{name}` is missing from the status code priority order")]
    MissingPriority { status: u16, name: String },

    /// The priority order ranks a status twice
    #[error("status code priority order lists {status} more than once")]
    DuplicatePriority { status: u16 },

    /// No priority order was provided
    #[error("status code priority order must not be empty")]
    EmptyPriorityOrder,
}
