pub mod cache;
pub mod realtime;
pub mod session;
