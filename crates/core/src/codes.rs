//! Numeric result codes for the response envelope.
//!
//! A code is `domain * 10000 + kind`, so `20001` reads as "node, not found".

/// Functional area an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    Common = 1,
    Node = 2,
    Candidate = 3,
    Workspace = 4,
    Member = 5,
    Auth = 6,
}

impl Domain {
    /// Map a [`CoreError`](crate::error::CoreError) entity name to its domain.
    ///
    /// Unknown entities fall back to [`Domain::Common`].
    pub fn for_entity(entity: &str) -> Self {
        match entity {
            "Node" | "NodeTree" => Self::Node,
            "Candidate" => Self::Candidate,
            "Workspace" => Self::Workspace,
            "Member" => Self::Member,
            _ => Self::Common,
        }
    }
}

/// What went wrong, independent of the domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound = 1,
    Invalid = 2,
    Conflict = 3,
    NotSupported = 4,
    LimitExceeded = 5,
    Unauthorized = 6,
    Forbidden = 7,
    Internal = 9,
}

impl ErrorKind {
    /// Machine-readable label used in the `error` field of failure bodies.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::Invalid => "VALIDATION_ERROR",
            Self::Conflict => "CONFLICT",
            Self::NotSupported => "NOT_SUPPORTED",
            Self::LimitExceeded => "LIMIT_EXCEEDED",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::Internal => "INTERNAL_ERROR",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorCode {
    pub domain: Domain,
    pub kind: ErrorKind,
}

impl ErrorCode {
    pub const fn new(domain: Domain, kind: ErrorKind) -> Self {
        Self { domain, kind }
    }

    pub fn value(self) -> u32 {
        self.domain as u32 * 10_000 + self.kind as u32
    }
}
