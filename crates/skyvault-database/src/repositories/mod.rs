//! Concrete `UserStore` implementations.

pub mod memory;
pub mod user;

pub use memory::MemoryUserRepository;
pub use user::UserRepository;
