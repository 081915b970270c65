pub mod oauth;
pub mod profile;
pub mod resolver;

pub use oauth::OAuthClient;
pub use profile::ProviderProfile;
pub use resolver::{Resolved, SESSION_USER_KEY, SocialUserResolver};
