use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,  // Missing or inconsistent relation setup
    Validation,     // Bad column reference, capability mismatch, missing value
    MalformedKey,   // Wildcard key where a concrete key is required
    DuplicateKey,   // Insert over an existing key
    EmptyQuery,     // Query build with zero clauses
    IndexEngine,    // I/O or engine-level failure
}

#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub context: String,
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl Error {
    pub fn new(kind: ErrorKind, context: impl Into<String>) -> Self {
        Error {
            kind,
            context: context.into(),
            source: None,
        }
    }

    pub fn with_source<E>(kind: ErrorKind, context: impl Into<String>, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        Error {
            kind,
            context: context.into(),
            source: Some(source.into()),
        }
    }

    pub fn configuration(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::Configuration, context)
    }

    pub fn validation(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::Validation, context)
    }

    pub fn malformed_key(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::MalformedKey, context)
    }

    pub fn duplicate_key(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::DuplicateKey, context)
    }

    pub fn engine(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::IndexEngine, context)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.context)?;
        if let Some(source) = &self.source {
            write!(f, " ({})", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::with_source(ErrorKind::IndexEngine, "I/O failure", err)
    }
}

impl From<tantivy::TantivyError> for Error {
    fn from(err: tantivy::TantivyError) -> Self {
        Error::with_source(ErrorKind::IndexEngine, "index engine failure", err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Configuration, "cannot read relation descriptor", err)
    }
}

/// Attaches operation context to foreign errors while keeping them as the cause.
pub(crate) trait ResultExt<T> {
    fn context(self, kind: ErrorKind, context: &str) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, kind: ErrorKind, context: &str) -> Result<T> {
        self.map_err(|err| Error::with_source(kind, context, err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
