//! envelope
//!
//! The single value every gateway operation returns.
//!
//! # Wire Shape
//!
//! ```json
//! {"status": "success", "result": {"issue": {"number": 3}}}
//! {"status": "error", "error": {"kind": "not_found", "message": "..."}}
//! ```
//!
//! Keys inside `result` keep their insertion order.
//!
//! # Example
//!
//! ```
//! use hubgate::envelope::{Envelope, ErrorKind, Payload};
//!
//! let ok = Envelope::success(Payload::new().field("merged", true).unwrap());
//! assert_eq!(ok.encode(), r#"{"status":"success","result":{"merged":true}}"#);
//!
//! let err = Envelope::error(ErrorKind::NotFound, "Issue #9 not found");
//! assert_eq!(err.error_kind(), Some(ErrorKind::NotFound));
//! assert_eq!(Envelope::decode(&err.encode()).unwrap(), err);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Failure categories, in the order they are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Credential or host could not be resolved.
    Configuration,
    /// Missing, empty or malformed input; no remote call was made.
    InvalidArgument,
    /// The remote reports the referenced resource does not exist.
    NotFound,
    /// A precondition on remote state failed (e.g. already merged).
    InvalidState,
    /// No client handle could be built.
    RemoteUnavailable,
    /// Network, timeout, rate limit or other remote API failure.
    Transport,
    /// Anything else, including panics inside an operation.
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidState => "invalid_state",
            ErrorKind::RemoteUnavailable => "remote_unavailable",
            ErrorKind::Transport => "transport",
            ErrorKind::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error half of an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
}

/// Uniform operation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Envelope {
    Success { result: Map<String, Value> },
    Error { error: ErrorBody },
}

impl Envelope {
    pub fn success(payload: Payload) -> Self {
        Envelope::Success {
            result: payload.into_map(),
        }
    }

    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Envelope::Error {
            error: ErrorBody {
                kind,
                message: message.into(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Envelope::Success { .. })
    }

    /// The success payload, if any.
    pub fn result(&self) -> Option<&Map<String, Value>> {
        match self {
            Envelope::Success { result } => Some(result),
            Envelope::Error { .. } => None,
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Envelope::Success { .. } => None,
            Envelope::Error { error } => Some(error.kind),
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Envelope::Success { .. } => None,
            Envelope::Error { error } => Some(&error.message),
        }
    }

    /// Structured form.
    pub fn to_value(&self) -> Value {
        match self {
            Envelope::Success { result } => json!({
                "status": "success",
                "result": result,
            }),
            Envelope::Error { error } => json!({
                "status": "error",
                "error": {
                    "kind": error.kind.as_str(),
                    "message": error.message,
                },
            }),
        }
    }

    /// Compact JSON text.
    pub fn encode(&self) -> String {
        self.to_value().to_string()
    }

    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Ordered success payload under construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload(Map<String, Value>);

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `key`, builder style.
    ///
    /// # Errors
    ///
    /// Fails only if `value` cannot be represented as JSON.
    pub fn field(mut self, key: &str, value: impl Serialize) -> Result<Self, serde_json::Error> {
        self.0.insert(key.to_string(), serde_json::to_value(value)?);
        Ok(self)
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}
