pub mod key_code;
pub mod user;

pub use key_code::KeyCode;
pub use user::{NewUser, User};
