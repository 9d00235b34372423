pub mod key_code;
pub mod user;

pub use key_code::{KeyCodeRepository, SqliteKeyCodeRepository};
pub use user::{SqliteUserRepository, UserRepository};
