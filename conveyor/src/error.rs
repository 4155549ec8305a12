//! Error types and result definitions for conveyor operations.
//!
//! Per-item transformation failures are *not* represented here; they travel
//! through the error sink as [`crate::types::StageFailure`] records and never
//! abort the pipeline. [`ConveyorError`] covers operational failures of the
//! pipeline machinery itself, such as a worker task panicking, and supports
//! aggregating several worker failures into a single error.

use std::borrow::Cow;
use std::error;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

/// Convenient result type for conveyor operations using [`ConveyorError`] as the error type.
pub type ConveyorResult<T> = Result<T, ConveyorError>;

/// Detailed payload stored for single [`ConveyorError`] instances.
#[derive(Debug, Clone)]
struct ErrorPayload {
    kind: ErrorKind,
    description: Cow<'static, str>,
    detail: Option<Cow<'static, str>>,
    source: Option<Arc<dyn error::Error + Send + Sync>>,
    location: &'static Location<'static>,
}

/// Main error type for conveyor operations.
///
/// [`ConveyorError`] can represent a single classified error or multiple
/// aggregated errors, which is the shape produced when several worker tasks
/// fail while a pool is joined.
#[derive(Debug, Clone)]
pub struct ConveyorError {
    repr: ErrorRepr,
}

#[derive(Debug, Clone)]
enum ErrorRepr {
    /// Single error payload holding classification and captured metadata.
    Single(ErrorPayload),
    /// Multiple aggregated errors, mainly used to capture multiple worker failures.
    Many {
        errors: Vec<ConveyorError>,
        location: &'static Location<'static>,
    },
}

/// Specific categories of errors that can occur during conveyor operations.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Invalid or rejected configuration.
    ConfigError,
    /// An operation was attempted in a state that does not allow it.
    InvalidState,
    /// A stage worker task panicked or was cancelled.
    StageWorkerPanic,
    /// A fan-in forwarder task panicked or was cancelled.
    FanInWorkerPanic,
    /// The feeder task panicked before closing the input stream.
    FeederPanic,
    /// Unknown or uncategorized failure.
    Unknown,
}

impl ConveyorError {
    /// Returns the [`ErrorKind`] of this error.
    ///
    /// For aggregated errors, returns the kind of the first error or
    /// [`ErrorKind::Unknown`] if the error list is empty.
    pub fn kind(&self) -> ErrorKind {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.kind,
            ErrorRepr::Many { ref errors, .. } => errors
                .first()
                .map(|err| err.kind())
                .unwrap_or(ErrorKind::Unknown),
        }
    }

    /// Returns all [`ErrorKind`]s present in this error.
    pub fn kinds(&self) -> Vec<ErrorKind> {
        match self.repr {
            ErrorRepr::Single(ref payload) => vec![payload.kind],
            ErrorRepr::Many { ref errors, .. } => {
                errors.iter().flat_map(|err| err.kinds()).collect()
            }
        }
    }

    /// Returns the detailed error information if available.
    pub fn detail(&self) -> Option<&str> {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.detail.as_deref(),
            ErrorRepr::Many { ref errors, .. } => errors.iter().find_map(|e| e.detail()),
        }
    }

    /// Returns the captured callsite location for this error.
    pub fn location(&self) -> &'static Location<'static> {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.location,
            ErrorRepr::Many { location, .. } => location,
        }
    }

    /// Attaches an originating [`error::Error`] to this error and returns the modified instance.
    ///
    /// Has no effect on aggregated errors, which forward the first contained
    /// error as their source.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        if let ErrorRepr::Single(ref mut payload) = self.repr {
            payload.source = Some(Arc::new(source));
        }
        self
    }

    #[track_caller]
    fn from_components(
        kind: ErrorKind,
        description: Cow<'static, str>,
        detail: Option<Cow<'static, str>>,
    ) -> Self {
        ConveyorError {
            repr: ErrorRepr::Single(ErrorPayload {
                kind,
                description,
                detail,
                source: None,
                location: Location::caller(),
            }),
        }
    }
}

impl PartialEq for ConveyorError {
    fn eq(&self, other: &ConveyorError) -> bool {
        match (&self.repr, &other.repr) {
            (ErrorRepr::Single(a), ErrorRepr::Single(b)) => a.kind == b.kind,
            (ErrorRepr::Many { errors: a, .. }, ErrorRepr::Many { errors: b, .. }) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(a, b)| a == b)
            }
            _ => false,
        }
    }
}

impl fmt::Display for ConveyorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            ErrorRepr::Single(payload) => {
                write!(
                    f,
                    "[{:?}] {} @ {}:{}:{}",
                    payload.kind,
                    payload.description,
                    payload.location.file(),
                    payload.location.line(),
                    payload.location.column()
                )?;

                if let Some(detail) = payload.detail.as_deref() {
                    write!(f, "\n  Detail: {detail}")?;
                }

                Ok(())
            }
            ErrorRepr::Many { errors, location } => {
                let count = errors.len();
                write!(
                    f,
                    "[Many] {} error{} aggregated @ {}:{}:{}",
                    count,
                    if count == 1 { "" } else { "s" },
                    location.file(),
                    location.line(),
                    location.column()
                )?;

                for (index, error) in errors.iter().enumerate() {
                    let rendered = format!("{error}");
                    for (line_index, line) in rendered.lines().enumerate() {
                        if line_index == 0 {
                            write!(f, "\n  {}. {}", index + 1, line)?;
                        } else {
                            write!(f, "\n     {line}")?;
                        }
                    }
                }

                Ok(())
            }
        }
    }
}

impl error::Error for ConveyorError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match &self.repr {
            ErrorRepr::Single(payload) => payload
                .source
                .as_ref()
                .map(|source| source as &(dyn error::Error + 'static)),
            // For aggregated errors, we forward the first contained error as the source.
            ErrorRepr::Many { errors, .. } => errors
                .first()
                .map(|error| error as &(dyn error::Error + 'static)),
        }
    }
}

/// Creates a [`ConveyorError`] from an error kind and static description.
impl From<(ErrorKind, &'static str)> for ConveyorError {
    #[track_caller]
    fn from((kind, desc): (ErrorKind, &'static str)) -> ConveyorError {
        ConveyorError::from_components(kind, Cow::Borrowed(desc), None)
    }
}

/// Creates a [`ConveyorError`] from an error kind, static description, and dynamic detail.
impl<D> From<(ErrorKind, &'static str, D)> for ConveyorError
where
    D: Into<Cow<'static, str>>,
{
    #[track_caller]
    fn from((kind, desc, detail): (ErrorKind, &'static str, D)) -> ConveyorError {
        ConveyorError::from_components(kind, Cow::Borrowed(desc), Some(detail.into()))
    }
}

/// Creates a [`ConveyorError`] from a vector of errors for aggregation.
///
/// If the vector contains exactly one error, returns that error directly
/// without wrapping it.
impl<E> From<Vec<E>> for ConveyorError
where
    E: Into<ConveyorError>,
{
    #[track_caller]
    fn from(errors: Vec<E>) -> ConveyorError {
        let location = Location::caller();

        let mut errors: Vec<ConveyorError> = errors.into_iter().map(Into::into).collect();

        if errors.len() == 1 {
            return errors.pop().expect("just checked length is 1");
        }

        ConveyorError {
            repr: ErrorRepr::Many { errors, location },
        }
    }
}
