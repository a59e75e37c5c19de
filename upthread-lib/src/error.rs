use crate::comms::ToOverlordMessage;
use std::panic::Location;

/// Error kinds that can occur in upthread-lib
#[derive(Debug)]
pub enum ErrorKind {
    EmptyUsername,
    General(String),
    Graphql(Vec<String>),
    HttpStatus(u16),
    Io(std::io::Error),
    MissingData(&'static str),
    MpscSend(tokio::sync::mpsc::error::SendError<ToOverlordMessage>),
    NotSignedIn,
    ReqwestHttpError(reqwest::Error),
    SerdeJson(serde_json::Error),
    ShuttingDown,
    UnknownCommand(String),
    UrlParse(url::ParseError),
    Usage(String, String), // error, usage line
}

/// Errors that can occur in upthread-lib, including the file and line number
/// where they were generated
#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    location: &'static Location<'static>,
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.kind, self.location)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use ErrorKind::*;
        match self {
            EmptyUsername => write!(f, "Username is empty"),
            General(s) => write!(f, "{s}"),
            Graphql(messages) => write!(f, "GraphQL: {}", messages.join("; ")),
            HttpStatus(code) => write!(f, "HTTP status {code}"),
            Io(e) => write!(f, "I/O Error: {e}"),
            MissingData(s) => write!(f, "Response is missing {s}"),
            MpscSend(e) => write!(f, "Error sending mpsc: {e}"),
            NotSignedIn => write!(f, "You need to be logged in to vote!"),
            ReqwestHttpError(e) => write!(f, "HTTP (reqwest) error: {e}"),
            SerdeJson(e) => write!(f, "SerdeJson Error: {e}"),
            ShuttingDown => write!(f, "Shutting down"),
            UnknownCommand(s) => write!(f, "Unknown command: {s}"),
            UrlParse(e) => write!(f, "URL parse: {e}"),
            Usage(e, u) => write!(f, "{}\n\nUsage: {}", e, u),
        }
    }
}

// Note: we impl Into because our typical pattern is InnerError::Variant.into()
//       when we tried implementing From, the location was deep in rust code's
//       blanket into implementation, which wasn't the line number we wanted.
//
//       As for converting other error types, the try! macro uses From so it
//       is correct.
#[allow(clippy::from_over_into)]
impl Into<Error> for ErrorKind {
    #[track_caller]
    fn into(self) -> Error {
        Error {
            kind: self,
            location: Location::caller(),
        }
    }
}

impl From<std::io::Error> for Error {
    #[track_caller]
    fn from(e: std::io::Error) -> Error {
        Error {
            kind: ErrorKind::Io(e),
            location: Location::caller(),
        }
    }
}

impl From<tokio::sync::mpsc::error::SendError<ToOverlordMessage>> for Error {
    #[track_caller]
    fn from(e: tokio::sync::mpsc::error::SendError<ToOverlordMessage>) -> Error {
        Error {
            kind: ErrorKind::MpscSend(e),
            location: Location::caller(),
        }
    }
}

impl From<reqwest::Error> for Error {
    #[track_caller]
    fn from(e: reqwest::Error) -> Error {
        Error {
            kind: ErrorKind::ReqwestHttpError(e),
            location: Location::caller(),
        }
    }
}

impl From<serde_json::Error> for Error {
    #[track_caller]
    fn from(e: serde_json::Error) -> Error {
        Error {
            kind: ErrorKind::SerdeJson(e),
            location: Location::caller(),
        }
    }
}

impl From<url::ParseError> for Error {
    #[track_caller]
    fn from(e: url::ParseError) -> Error {
        Error {
            kind: ErrorKind::UrlParse(e),
            location: Location::caller(),
        }
    }
}
