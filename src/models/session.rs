use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::role::Role;
use crate::utils::redact::mask_token;

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub role: Role,
    pub username: String,
    #[serde(default)]
    pub user_id: Option<i64>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &mask_token(&self.token))
            .field("role", &self.role)
            .field("username", &self.username)
            .field("user_id", &self.user_id)
            .finish()
    }
}

/// What the dashboard shows about the signed-in user; never carries the token.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionIdentity {
    pub role: Role,
    pub username: String,
    pub user_id: Option<i64>,
}

impl From<&Session> for SessionIdentity {
    fn from(session: &Session) -> Self {
        Self {
            role: session.role,
            username: session.username.clone(),
            user_id: session.user_id,
        }
    }
}
