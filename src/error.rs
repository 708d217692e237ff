//! Error taxonomy shared by every resolution stage.
//!
//! Every failure is a value of [`Error`]. Each variant maps onto one of the six
//! stable [`ErrorCode`]s that callers switch on; the `Display` text is the
//! human-readable message.
use std::path::PathBuf;

use serde::Serialize;

/// Stable error identifiers consumed by UIs to choose message templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The reference string is malformed.
    InvalidRequest,
    /// A member was requested that the resolved shape does not have.
    MemberNotFound,
    /// The module specifier did not resolve to a file or known global.
    ModuleNotFound,
    /// Catch-all for oracle, configuration, and I/O failures.
    ParseError,
    /// The module exists but does not export the requested symbol.
    SymbolNotFound,
    /// The symbol exists but cannot be used the way the reference asks.
    TypeError,
}

impl ErrorCode {
    /// The wire spelling of the code.
    pub const fn as_str(self) -> &'static str {
        return match self {
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::MemberNotFound => "MEMBER_NOT_FOUND",
            Self::ModuleNotFound => "MODULE_NOT_FOUND",
            Self::ParseError => "PARSE_ERROR",
            Self::SymbolNotFound => "SYMBOL_NOT_FOUND",
            Self::TypeError => "TYPE_ERROR",
        };
    }
}

/// Every resolution failure carries enough context to render a useful message
/// without a debugger.
#[allow(clippy::error_impl_error, reason = "crate-level error type")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Source file exceeds the parser size limit.
    #[error("file too large ({size_bytes} bytes, max {max_bytes}): {}", file.display())]
    FileTooLarge {
        /// File that exceeded the size limit.
        file: PathBuf,
        /// Maximum allowed file size in bytes.
        max_bytes: u64,
        /// Actual file size in bytes.
        size_bytes: u64,
    },

    /// The reference string could not be parsed.
    #[error("{reason}")]
    InvalidRequest {
        /// Which grammar rule was violated.
        reason: String,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// The requested member does not exist on the resolved shape.
    #[error(
        "Member '{member}' not found on '{owner}'. {}",
        list_alternatives("members", "No members available", available)
    )]
    MemberNotFound {
        /// Every member name of the shape that was searched.
        available: Vec<String>,
        /// Member name that was requested.
        member: String,
        /// Symbol whose static or instance side was searched.
        owner: String,
    },

    /// The module specifier resolved to nothing.
    #[error("Cannot find module '{specifier}'")]
    ModuleNotFound {
        /// Specifier exactly as written in the reference.
        specifier: String,
    },

    /// The parser rejected a source file.
    #[error("parse failed: {}: {reason}", file.display())]
    ParseFailed {
        /// File that failed to parse.
        file: PathBuf,
        /// Description of the parse failure.
        reason: String,
    },

    /// A tsconfig/jsconfig file is malformed or its `extends` chain is broken.
    #[error("invalid project config {}: {reason}", path.display())]
    ProjectConfig {
        /// Config file that failed.
        path: PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// The module does not export the requested symbol.
    #[error(
        "Symbol '{symbol}' not found in module '{module}'. {}",
        list_alternatives("exports", "Module has no exports", available)
    )]
    SymbolNotFound {
        /// Every export name of the module.
        available: Vec<String>,
        /// Module specifier that was searched.
        module: String,
        /// Symbol name that was requested.
        symbol: String,
    },

    /// TOML deserialization of `.symdoc.toml` failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),

    /// The symbol cannot be used the way the reference asks.
    #[error("{reason}")]
    TypeMismatch {
        /// Why the symbol has no usable shape.
        reason: String,
    },

    /// No tree-sitter grammar registered for this file extension.
    #[error("no grammar for extension: .{ext}")]
    UnsupportedLanguage {
        /// File extension without the leading dot.
        ext: String,
    },

    /// The filesystem watcher could not be set up.
    #[error("watch: {reason}")]
    WatchFailed {
        /// Description of the watcher failure.
        reason: String,
    },
}

impl Error {
    /// Stable code for this failure.
    pub const fn code(&self) -> ErrorCode {
        return match self {
            Self::InvalidRequest { .. } => ErrorCode::InvalidRequest,
            Self::MemberNotFound { .. } => ErrorCode::MemberNotFound,
            Self::ModuleNotFound { .. } => ErrorCode::ModuleNotFound,
            Self::SymbolNotFound { .. } => ErrorCode::SymbolNotFound,
            Self::TypeMismatch { .. } => ErrorCode::TypeError,
            Self::FileTooLarge { .. }
            | Self::Io(_)
            | Self::ParseFailed { .. }
            | Self::ProjectConfig { .. }
            | Self::TomlDe(_)
            | Self::UnsupportedLanguage { .. }
            | Self::WatchFailed { .. } => ErrorCode::ParseError,
        };
    }

    /// Structured extras for machine consumers.
    pub fn details(&self) -> Option<serde_json::Value> {
        return match self {
            Self::MemberNotFound { available, member, owner } => Some(serde_json::json!({
                "available": available,
                "member": member,
                "symbol": owner,
            })),
            Self::ModuleNotFound { specifier } => {
                Some(serde_json::json!({ "specifier": specifier }))
            },
            Self::FileTooLarge { file, .. } | Self::ParseFailed { file, .. } => {
                Some(serde_json::json!({ "file": file.display().to_string() }))
            },
            Self::ProjectConfig { path, .. } => {
                Some(serde_json::json!({ "config": path.display().to_string() }))
            },
            Self::SymbolNotFound { available, module, symbol } => Some(serde_json::json!({
                "available": available,
                "module": module,
                "symbol": symbol,
            })),
            _ => None,
        };
    }

    /// Shorthand for an `INVALID_REQUEST` failure.
    pub fn invalid(reason: impl Into<String>) -> Self {
        return Self::InvalidRequest { reason: reason.into() };
    }

    /// The `{ "error": { code, message, details } }` wire shape.
    pub fn to_envelope(&self) -> ErrorEnvelope {
        return ErrorEnvelope {
            error: ErrorBody {
                code: self.code(),
                details: self.details(),
                message: self.to_string(),
            },
        };
    }
}

/// Body of the serialized error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    /// Stable code.
    pub code: ErrorCode,
    /// Optional structured extras.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Human-readable message.
    pub message: String,
}

/// Serialized error record, `{ "error": { ... } }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorEnvelope {
    /// The error payload.
    pub error: ErrorBody,
}

/// Render the "Available ..." suffix used by the not-found messages.
fn list_alternatives(noun: &str, empty: &str, available: &[String]) -> String {
    if available.is_empty() {
        return empty.to_string();
    }
    return format!("Available {noun}: {}", available.join(", "));
}
