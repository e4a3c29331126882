use thiserror::Error;

/// Failure of a checked pointer access.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Error)]
pub enum PointerError {
    /// The pointer does not own or observe any value.
    #[error("dereferenced an empty pointer")]
    Empty,
    /// Every strong handle to the observed value has been dropped.
    #[error("weak pointer has expired")]
    Expired,
}
