pub mod accounts;
pub mod codes;
pub mod handlers;
pub mod password;
pub mod session;
