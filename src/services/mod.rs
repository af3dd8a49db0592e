pub mod auth;
pub mod email;
pub mod otp;
pub mod password;
pub mod password_reset;
pub mod token;

pub use auth::{AuthService, LoginOutcome};
pub use email::{EmailService, LogTransport, MailMessage, MailTransport};
#[cfg(test)]
pub use email::MemoryTransport;
pub use otp::OtpService;
pub use password::PasswordService;
pub use password_reset::PasswordResetService;
pub use token::{Claims, TokenService};
