use crate::codes::{Domain, ErrorCode, ErrorKind};
use crate::types::DbId;

/// Domain-level error shared by every crate in the workspace.
///
/// Entity names are static strings (`"Node"`, `"Candidate"`, ...) so the
/// API layer can derive the numeric domain code from them.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// A requested operation is not allowed for this kind of entity
    /// (for example a STORY directly under a PROJECT).
    #[error("{message}")]
    Unsupported {
        entity: &'static str,
        message: String,
    },

    /// A per-entity quota would be exceeded.
    #[error("{message}")]
    LimitExceeded {
        entity: &'static str,
        message: String,
    },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Numeric domain + kind code reported in the response envelope.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { entity, .. } => {
                ErrorCode::new(Domain::for_entity(entity), ErrorKind::NotFound)
            }
            Self::Validation(_) => ErrorCode::new(Domain::Common, ErrorKind::Invalid),
            Self::Conflict(_) => ErrorCode::new(Domain::Common, ErrorKind::Conflict),
            Self::Unsupported { entity, .. } => {
                ErrorCode::new(Domain::for_entity(entity), ErrorKind::NotSupported)
            }
            Self::LimitExceeded { entity, .. } => {
                ErrorCode::new(Domain::for_entity(entity), ErrorKind::LimitExceeded)
            }
            Self::Unauthorized(_) => ErrorCode::new(Domain::Auth, ErrorKind::Unauthorized),
            Self::Forbidden(_) => ErrorCode::new(Domain::Auth, ErrorKind::Forbidden),
            Self::Internal(_) => ErrorCode::new(Domain::Common, ErrorKind::Internal),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_entity_and_id() {
        let err = CoreError::NotFound {
            entity: "Node",
            id: 7,
        };
        assert_eq!(err.to_string(), "Node with id 7 not found");
        assert_eq!(err.code().value(), 20001);
    }

    #[test]
    fn unsupported_uses_entity_domain() {
        let err = CoreError::Unsupported {
            entity: "Node",
            message: "STORY cannot be placed under PROJECT".into(),
        };
        assert_eq!(err.code().value(), 20004);
        assert_eq!(err.to_string(), "STORY cannot be placed under PROJECT");
    }

    #[test]
    fn candidate_limit_code() {
        let err = CoreError::LimitExceeded {
            entity: "Candidate",
            message: "too many".into(),
        };
        assert_eq!(err.code().value(), 30005);
    }

    #[test]
    fn validation_is_common_domain() {
        assert_eq!(CoreError::Validation("x".into()).code().value(), 10002);
    }
}
