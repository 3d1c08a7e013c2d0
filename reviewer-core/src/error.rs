//! Error types for the reviewer service

use std::fmt;

use thiserror::Error;

/// Result type alias for reviewer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Business-rule conflicts reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    /// A team with this name already exists
    TeamExists,
    /// A pull request with this id already exists
    PrExists,
    /// The pull request is merged and can no longer change reviewers
    PrMerged,
    /// The user does not occupy a review slot on the pull request
    NotAssigned,
    /// No active user in the team can take over the slot
    NoCandidate,
}

impl ConflictKind {
    /// Stable wire code for this conflict
    pub fn code(&self) -> &'static str {
        match self {
            ConflictKind::TeamExists => "TEAM_EXISTS",
            ConflictKind::PrExists => "PR_EXISTS",
            ConflictKind::PrMerged => "PR_MERGED",
            ConflictKind::NotAssigned => "NOT_ASSIGNED",
            ConflictKind::NoCandidate => "NO_CANDIDATE",
        }
    }

    fn message(&self) -> &'static str {
        match self {
            ConflictKind::TeamExists => "team_name already exists",
            ConflictKind::PrExists => "PR id already exists",
            ConflictKind::PrMerged => "cannot reassign on merged PR",
            ConflictKind::NotAssigned => "reviewer is not assigned to this PR",
            ConflictKind::NoCandidate => "no active replacement candidate in team",
        }
    }
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Error type for reviewer operations
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed input, rejected before touching the store
    #[error("Validation error: {0}")]
    Validation(String),

    /// Referenced entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// State-dependent business rule violation
    #[error("{}", .kind.message())]
    Conflict { kind: ConflictKind },

    /// Transaction or storage layer failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a conflict error of the given kind
    pub fn conflict(kind: ConflictKind) -> Self {
        Error::Conflict { kind }
    }

    /// Wire code used in error responses
    pub fn code(&self) -> &'static str {
        match self {
            Error::Validation(_) => "BAD_REQUEST",
            Error::NotFound(_) => "NOT_FOUND",
            Error::Conflict { kind } => kind.code(),
            Error::Storage(_) | Error::Config(_) | Error::Io(_) => "INTERNAL",
        }
    }

    /// Returns the conflict kind, if this is a conflict
    pub fn conflict_kind(&self) -> Option<ConflictKind> {
        match self {
            Error::Conflict { kind } => Some(*kind),
            _ => None,
        }
    }
}

/// Reject empty identifiers before any store access
pub(crate) fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("{} is required", field)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_codes() {
        let err = Error::conflict(ConflictKind::NoCandidate);
        assert_eq!(err.code(), "NO_CANDIDATE");
        assert_eq!(err.to_string(), "no active replacement candidate in team");
        assert_eq!(err.conflict_kind(), Some(ConflictKind::NoCandidate));
    }

    #[test]
    fn test_storage_errors_are_internal() {
        assert_eq!(Error::Storage("disk I/O error".into()).code(), "INTERNAL");
        assert_eq!(Error::NotFound("PR not found".into()).code(), "NOT_FOUND");
    }

    #[test]
    fn test_require() {
        assert!(require("team_name", "backend").is_ok());
        let err = require("team_name", "  ").unwrap_err();
        assert_eq!(err.to_string(), "Validation error: team_name is required");
    }
}
