pub mod catalog;
pub mod contacts;
pub mod health;
pub mod login;
pub mod otp;
pub mod password_reset;
pub mod register;
pub mod users;

pub use catalog::{create_service, delete_service, get_service, list_services, update_service};
pub use contacts::{create_contact, delete_contact, list_contacts, update_contact_status};
pub use health::health_check;
pub use login::login;
pub use otp::{send_otp, verify_otp};
pub use password_reset::{forgot_password, reset_password};
pub use register::register;
pub use users::list_users;
