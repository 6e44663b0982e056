pub mod connect;
pub mod home;
