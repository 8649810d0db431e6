pub mod cookies;
pub mod jwt;
pub mod sessions;
pub mod shifts;
pub mod users;
