pub mod health;
pub mod logout;
pub mod me;
pub mod oauth;

pub use health::health_check;
pub use logout::logout;
pub use me::me;
pub use oauth::{authorize, callback};
