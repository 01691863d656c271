//! `labtrack-auth`: session boundary.
//!
//! Verifies session tokens issued by the hosted auth service and decides which
//! requests need one. Decoupled from HTTP and storage: the API layer extracts
//! the token and maps a [`GuardDecision`] onto a response.

pub mod claims;
pub mod guard;
pub mod jwt;
pub mod principal;

pub use claims::{SessionClaims, TokenValidationError, validate_claims};
pub use guard::{GuardDecision, RouteClass, classify, decide, safe_next};
pub use jwt::{Hs256JwtValidator, JwtValidator};
pub use principal::PrincipalId;
