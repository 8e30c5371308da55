use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UpstreamFetch,      // Object store unreachable or ref invalid
    UnknownSortColumn,  // sort_by names a column the schema doesn't have
    MalformedRecord,    // Cached line doesn't match the schema
    CacheWrite,         // Could not build or publish a cache table
    MissingBaseTable,   // Sorted view requested before the base table exists
    SortFailed,         // External sort exited with an error
    InvalidArgument,
    Io,
    Parse,
}

#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub context: String,
}

impl Error {
    pub fn new(kind: ErrorKind, context: String) -> Self {
        Error { kind, context }
    }

    pub fn upstream(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::UpstreamFetch, context.into())
    }

    pub fn cache_write(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::CacheWrite, context.into())
    }

    pub fn malformed_record(collection: &str, line: &str, cause: impl fmt::Display) -> Self {
        Error::new(
            ErrorKind::MalformedRecord,
            format!("Error parsing {} record from: [{}]; cause: {}", collection, line, cause),
        )
    }

    pub fn unknown_sort_column(column: &str, valid: &[&str]) -> Self {
        Error::new(
            ErrorKind::UnknownSortColumn,
            format!("Unknown column name '{}', please use one of {:?}", column, valid),
        )
    }

    /// Caller mistakes, as opposed to faults inside the service or upstream.
    pub fn is_user_error(&self) -> bool {
        matches!(self.kind, ErrorKind::UnknownSortColumn | ErrorKind::InvalidArgument)
    }

    /// Re-tag a low-level error as a cache write failure, keeping its message.
    pub fn into_cache_write(self) -> Self {
        match self.kind {
            ErrorKind::Io | ErrorKind::Parse => Error::cache_write(self.context),
            _ => self,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.context)
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error {
            kind: ErrorKind::Io,
            context: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error {
            kind: ErrorKind::Parse,
            context: err.to_string(),
        }
    }
}

impl From<tempfile::PersistError> for Error {
    fn from(err: tempfile::PersistError) -> Self {
        Error {
            kind: ErrorKind::CacheWrite,
            context: format!("Failed to publish cache file: {}", err.error),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_retag_as_cache_write() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::Other, "disk full").into();
        assert_eq!(err.kind, ErrorKind::Io);

        let err = err.into_cache_write();
        assert_eq!(err.kind, ErrorKind::CacheWrite);
        assert!(err.context.contains("disk full"));
    }

    #[test]
    fn unknown_column_lists_valid_names() {
        let err = Error::unknown_sort_column("nope", &["id", "type"]);
        assert!(err.is_user_error());
        assert!(err.to_string().contains("\"id\""));
        assert!(err.to_string().contains("'nope'"));
    }
}
