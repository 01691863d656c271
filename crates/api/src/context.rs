use labtrack_auth::{PrincipalId, SessionClaims};

/// Signed-in user for a request.
///
/// Inserted by the session middleware whenever a valid token was presented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    principal_id: PrincipalId,
    email: Option<String>,
    role: Option<String>,
}

impl SessionContext {
    pub fn new(claims: SessionClaims) -> Self {
        Self {
            principal_id: claims.sub,
            email: claims.email,
            role: claims.role,
        }
    }

    pub fn principal_id(&self) -> PrincipalId {
        self.principal_id
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }
}
