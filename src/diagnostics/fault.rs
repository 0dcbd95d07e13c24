//! Fault taxonomy shared by the server and the client.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a failed exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FaultKind {
    /// No route matched, or the addressed record does not exist.
    NotFound,
    /// A body was required but the response had none.
    EmptyBody,
    /// The client could not decode the response body as JSON.
    ParseError,
    /// A handler failed while serving the request.
    ServerFault,
}

impl FaultKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FaultKind::NotFound => "NotFound",
            FaultKind::EmptyBody => "EmptyBody",
            FaultKind::ParseError => "ParseError",
            FaultKind::ServerFault => "ServerFault",
        }
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FaultKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NotFound" => Ok(FaultKind::NotFound),
            "EmptyBody" => Ok(FaultKind::EmptyBody),
            "ParseError" => Ok(FaultKind::ParseError),
            "ServerFault" => Ok(FaultKind::ServerFault),
            other => Err(format!("unknown fault kind '{}'", other)),
        }
    }
}

/// Where in the source a fault was raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    /// The location of the caller, through any `#[track_caller]` frames.
    #[track_caller]
    pub fn caller() -> Self {
        std::panic::Location::caller().into()
    }
}

impl From<&std::panic::Location<'_>> for SourceLocation {
    fn from(location: &std::panic::Location<'_>) -> Self {
        Self {
            file: location.file().to_string(),
            line: location.line(),
            column: location.column(),
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

impl std::str::FromStr for SourceLocation {
    type Err = String;

    /// Parses `file:line:column`; the file part may itself contain colons.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.rsplitn(3, ':');
        let column = parts.next().and_then(|c| c.parse().ok());
        let line = parts.next().and_then(|l| l.parse().ok());
        match (parts.next(), line, column) {
            (Some(file), Some(line), Some(column)) if !file.is_empty() => Ok(Self {
                file: file.to_string(),
                line,
                column,
            }),
            _ => Err(format!("malformed location '{}'", s)),
        }
    }
}

/// A categorized error condition attached to a response or record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fault {
    pub kind: FaultKind,
    pub message: String,
    pub location: Option<SourceLocation>,
}

impl Fault {
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            location: None,
        }
    }

    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(FaultKind::NotFound, message)
    }

    pub fn server(message: impl Into<String>, location: SourceLocation) -> Self {
        Self::new(FaultKind::ServerFault, message).at(location)
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if let Some(location) = &self.location {
            write!(f, " at {}", location)?;
        }
        Ok(())
    }
}
