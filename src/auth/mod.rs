//! Authentication: accounts, JWT access/refresh tokens

pub mod service;
pub mod store;
pub mod token;

pub use service::{AuthError, AuthResult, AuthService, Principal};
pub use store::{MemoryUserStore, PostgresUserStore, UserStore};
pub use token::{Claims, TokenKind, TokenPair};
