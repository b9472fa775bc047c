pub mod health;
pub use self::health::health;

pub mod issue;
pub use self::issue::issue;
