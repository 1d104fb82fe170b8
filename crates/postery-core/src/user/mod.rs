//! User accounts and login sessions

pub mod model;
pub mod password;
pub mod repository;

pub use model::{User, UserRecord};
pub use repository::{UserRepository, UserStore};
