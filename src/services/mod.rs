pub mod backend;
pub mod policy;
pub mod route_guard;
pub mod session_store;
pub mod storage;
pub mod token;
