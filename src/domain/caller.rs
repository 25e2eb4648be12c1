//! Explicit caller identity passed into every core operation

use crate::shared::errors::{DomainError, DomainResult};

/// Who is performing an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: String,
    pub is_admin: bool,
}

impl Caller {
    pub fn admin(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            is_admin: true,
        }
    }

    pub fn user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            is_admin: false,
        }
    }

    /// Lot management is reserved to administrators
    pub fn require_admin(&self) -> DomainResult<()> {
        if self.is_admin {
            Ok(())
        } else {
            Err(DomainError::Forbidden("administrator access required".into()))
        }
    }

    /// Administrators manage lots; they do not park
    pub fn require_driver(&self) -> DomainResult<()> {
        if self.is_admin {
            Err(DomainError::Forbidden(
                "administrators cannot book parking spots".into(),
            ))
        } else {
            Ok(())
        }
    }
}
