pub mod claims;
pub mod password;
pub mod role;
pub mod token;

pub use claims::Claims;
pub use role::Role;
pub use token::{SigningError, TokenCodec, VerificationError};
