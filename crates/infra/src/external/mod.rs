//! Clients for hosted services: the generative-AI API and the auth service.

pub mod gemini;
pub mod supabase_auth;

pub use gemini::{GeminiClient, GeminiError};
pub use supabase_auth::{AuthClientError, AuthSession, SupabaseAuthClient};
