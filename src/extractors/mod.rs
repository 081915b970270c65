pub mod social_user;

pub use social_user::{SocialUser, current_user};
