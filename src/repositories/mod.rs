pub mod contact;
#[cfg(test)]
pub mod memory;
pub mod service;
pub mod user;

pub use contact::{ContactRepository, ContactStore, NewContact};
#[cfg(test)]
pub use memory::{InMemoryContactStore, InMemoryServiceStore, InMemoryUserStore};
pub use service::{NewService, ServiceChanges, ServiceRepository, ServiceStore};
pub use user::{UserRepository, UserStore};
