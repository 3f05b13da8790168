use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity bound into a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
    pub id: Uuid,
    pub email: String,
    pub role: String,
}

/// JWT payload used for authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: Uuid,      // user ID
    pub email: String, // login email
    pub role: String,  // account role
    pub iat: i64,      // issued at (unix timestamp)
    pub exp: i64,      // expires at (unix timestamp)
    pub iss: String,   // issuer
    pub aud: String,   // audience
}

impl Claims {
    pub fn identity(&self) -> SessionIdentity {
        SessionIdentity {
            id: self.id,
            email: self.email.clone(),
            role: self.role.clone(),
        }
    }
}
