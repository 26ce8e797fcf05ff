//! Identity gate consulted before guarded cart mutations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::Email;

/// Answers whether the current actor is signed in.
pub trait IdentityGate {
    fn is_authenticated(&self) -> bool;
}

/// A signed-in shopper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub email: Email,
    pub signed_in_at: DateTime<Utc>,
}

impl Customer {
    #[must_use]
    pub fn new(email: Email) -> Self {
        Self {
            email,
            signed_in_at: Utc::now(),
        }
    }
}

/// Who is driving a shopper session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Identity {
    #[default]
    Anonymous,
    Authenticated(Customer),
}

impl Identity {
    /// The signed-in customer, if any.
    #[must_use]
    pub const fn customer(&self) -> Option<&Customer> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(customer) => Some(customer),
        }
    }
}

impl IdentityGate for Identity {
    fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}
