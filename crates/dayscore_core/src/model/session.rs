//! Explicit caller context for user-scoped operations.
//!
//! Every record/stats call takes a `&Session` instead of reading an ambient
//! credential. Authenticating the user that a session names happens outside
//! this crate.

use crate::model::user::UserId;

/// Acting user for one or more service calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    user_id: UserId,
}

impl Session {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }
}
