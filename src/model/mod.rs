pub mod user;

pub use user::{Company, NewUser, UserRecord};
