#![allow(dead_code)]

pub mod helpers;
pub mod test_app;

pub use helpers::{create_user, generate_test_email, open_session, TEST_PASSWORD};
pub use test_app::TestApp;
