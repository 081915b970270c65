#[cfg(test)]
pub mod memory;
pub mod user;

pub use user::{UserRepository, UserStore};
