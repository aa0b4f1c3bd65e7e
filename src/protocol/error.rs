//! Error taxonomy for batch and per-call failures.
//!
//! # Responsibilities
//! - Batch-level rejections (`BatchError`) carrying an HTTP status
//! - Handler-raised errors (`HandlerError`) with optional status/code/data
//! - Dispatcher classification of per-call failures (`CallError`)
//! - Wire shape of a per-call error (`ErrorInfo`)
//!
//! # Design Decisions
//! - Only "recognised" handler errors put their message on the wire
//! - Internal details are logged, the wire sees "Internal Server Error"
//! - Timeouts share the wire shape of a generic 500

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const INTERNAL_SERVER_ERROR: &str = "Internal Server Error";
pub const NOT_FOUND: &str = "Not Found";
pub const MIDDLEWARE_RETURNED_VALUE: &str =
    "Middleware should not return anything but may mutate context";
pub const RESULT_NOT_OBJECT: &str = "Result should be an object";

fn default_status() -> u16 {
    500
}

/// Error payload in position 4 of a response item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub message: String,

    #[serde(default = "default_status")]
    pub status: u16,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ErrorInfo {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status,
            code: None,
            data: None,
        }
    }

    pub fn internal() -> Self {
        Self::new(500, INTERNAL_SERVER_ERROR)
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Whole-batch rejection. Nothing is dispatched when this is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct BatchError {
    pub status: u16,
    pub message: String,
}

impl BatchError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: 400,
            message: message.into(),
        }
    }
}

/// Error raised from inside a handler chain.
///
/// Build one with [`HandlerError::new`] when the message is meant for the
/// caller. Use [`HandlerError::internal`] to wrap anything else: its text is
/// logged but the caller only sees "Internal Server Error".
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
    status: u16,
    code: Option<String>,
    data: Option<Value>,
    exposed: bool,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: 500,
            code: None,
            data: None,
            exposed: true,
        }
    }

    pub fn internal(err: impl fmt::Display) -> Self {
        Self {
            exposed: false,
            ..Self::new(err.to_string())
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_exposed(&self) -> bool {
        self.exposed
    }

    pub fn to_error_info(&self) -> ErrorInfo {
        if !self.exposed {
            return ErrorInfo {
                status: self.status,
                ..ErrorInfo::internal()
            };
        }
        let message = if self.message.is_empty() {
            INTERNAL_SERVER_ERROR.to_string()
        } else {
            self.message.clone()
        };
        ErrorInfo {
            message,
            status: self.status,
            code: self.code.clone(),
            data: self.data.clone(),
        }
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        HandlerError::new(format!("Invalid parameters: {err}")).with_status(400)
    }
}

/// Why a single call failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CallError {
    #[error("route not found: {0}")]
    NotFound(String),

    #[error("call exceeded its {0}ms timeout")]
    Timeout(u64),

    #[error(transparent)]
    Handler(#[from] HandlerError),

    #[error("{0}")]
    ResultShape(&'static str),

    #[error("handler panicked")]
    Panicked,
}

impl CallError {
    pub fn to_error_info(&self) -> ErrorInfo {
        match self {
            CallError::NotFound(_) => ErrorInfo::new(404, NOT_FOUND),
            CallError::Timeout(_) | CallError::Panicked => ErrorInfo::internal(),
            CallError::Handler(err) => err.to_error_info(),
            CallError::ResultShape(message) => ErrorInfo::new(500, *message),
        }
    }
}
