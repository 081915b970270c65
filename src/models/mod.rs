pub mod social_type;
pub mod user;

pub use social_type::{SocialType, UnknownSocialType};
pub use user::{NewUser, User};
