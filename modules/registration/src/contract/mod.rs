pub mod client;
pub mod error;
pub mod model;

pub use client::RegistrationApi;
pub use error::RegistrationError;
pub use model::{NewUser, User};
