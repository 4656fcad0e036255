pub mod auth;
pub mod request;
pub mod response;

pub use auth::*;
pub use request::*;
pub use response::*;
