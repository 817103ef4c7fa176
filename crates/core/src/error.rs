/// Result alias that carries the custom [`BeatfillError`] type.
pub type Result<T> = std::result::Result<T, BeatfillError>;

/// Common error type for the core crate.
///
/// A scheduling pass either completes and returns a full effect list or
/// aborts with one of these before producing any output. A beat that simply
/// cannot host an effect is not an error; the scheduler skips it.
#[derive(Debug, thiserror::Error)]
pub enum BeatfillError {
    /// Malformed caller input such as unsorted beats or a zero-length
    /// interval.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// A policy table, palette or threshold that fails pre-flight
    /// validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A persisted duration string that does not follow the `PT[#M]#S`
    /// shape.
    #[error("malformed duration `{0}`")]
    MalformedDuration(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl BeatfillError {
    /// Creates a [`BeatfillError::InvalidInput`] from the provided message.
    pub fn input<T: Into<String>>(msg: T) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Creates a [`BeatfillError::InvalidConfig`] from the provided message.
    pub fn config<T: Into<String>>(msg: T) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
