use serde::Deserialize;
use thiserror::Error;

/// Postgres SQLSTATE codes PostgREST passes through in its error body.
pub mod sqlstate {
    pub const FOREIGN_KEY_VIOLATION: &str = "23503";
    pub const UNIQUE_VIOLATION: &str = "23505";
    pub const CHECK_VIOLATION: &str = "23514";
    pub const INVALID_TEXT_REPRESENTATION: &str = "22P02";
}

#[derive(Error, Debug)]
pub enum SupabaseError {
    #[error("Authentication error ({status}): {message}")]
    Auth { status: u16, message: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("API error ({status}){}: {message}", code_suffix(.code))]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid request header: {0}")]
    InvalidHeader(String),
}

fn code_suffix(code: &Option<String>) -> String {
    code.as_ref().map(|c| format!(" [{}]", c)).unwrap_or_default()
}

/// Error body shape returned by PostgREST.
#[derive(Debug, Default, Deserialize)]
struct PostgrestErrorBody {
    code: Option<String>,
    message: Option<String>,
    details: Option<String>,
}

impl SupabaseError {
    pub(crate) fn from_response(status: u16, body: &str) -> Self {
        let parsed: PostgrestErrorBody = serde_json::from_str(body).unwrap_or_default();
        let message = match (parsed.message, parsed.details) {
            (Some(message), Some(details)) => format!("{} ({})", message, details),
            (Some(message), None) => message,
            (None, _) => body.to_string(),
        };

        match status {
            401 | 403 => SupabaseError::Auth { status, message },
            404 if parsed.code.is_none() => SupabaseError::NotFound(message),
            _ => SupabaseError::Api {
                status,
                code: parsed.code,
                message,
            },
        }
    }

    /// SQLSTATE or PostgREST code, when the store reported one.
    pub fn code(&self) -> Option<&str> {
        match self {
            SupabaseError::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self.code(),
            Some(sqlstate::FOREIGN_KEY_VIOLATION)
                | Some(sqlstate::UNIQUE_VIOLATION)
                | Some(sqlstate::CHECK_VIOLATION)
        )
    }

    /// The store never gave a verdict: the request may or may not have been applied.
    pub fn is_outcome_unknown(&self) -> bool {
        matches!(self, SupabaseError::Transport(_) | SupabaseError::Decode(_))
    }
}
