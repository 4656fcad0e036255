pub mod validation;

pub use validation::{login_problems, password_problems, validate_registration};
