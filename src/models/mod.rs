mod delivery;
mod password_reset;
mod user;

pub use delivery::{Delivery, DeliveryStatus, NewDelivery};
pub use password_reset::{NewPasswordReset, PasswordReset, ResetTokenError};
pub use user::{NewUser, User};
