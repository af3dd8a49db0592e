pub mod contact;
pub mod service;
pub mod user;

pub use contact::{Contact, ContactStatus};
pub use service::{Service, ServiceImage};
pub use user::{PublicUser, Role, User};
