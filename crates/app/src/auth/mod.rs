//! Authentication

mod claims;
mod errors;
mod password;
pub mod permissions;
mod token;

pub use claims::*;
pub use errors::*;
pub use password::*;
pub use token::*;
