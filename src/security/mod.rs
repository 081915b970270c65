pub mod authentication;
pub mod context;

pub use authentication::{
    Authentication, NOT_APPLICABLE_CREDENTIALS, OAuth2AuthenticationToken, PreauthenticatedToken,
    RawProfile,
};
pub use context::{SECURITY_CONTEXT_KEY, SecurityContext};
