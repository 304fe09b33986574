//! Permission denial errors raised by the injected permission checker

use thiserror::Error;

/// Permission-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PermissionError {
    /// The user lacks the required right on the scope
    #[error("User {user_id} may not {action} {scope}")]
    Denied {
        user_id: i32,
        action: String,
        scope: String,
    },
}

impl PermissionError {
    pub fn denied(user_id: i32, action: &str, scope: impl Into<String>) -> Self {
        Self::Denied {
            user_id,
            action: action.to_string(),
            scope: scope.into(),
        }
    }
}
