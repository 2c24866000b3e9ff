pub mod error;
pub mod memory_user_repo;
pub mod user_repo;
pub mod user_store;

pub use memory_user_repo::MemoryUserStore;
pub use user_repo::PgUserStore;
pub use user_store::{NewUser, User, UserStore};
