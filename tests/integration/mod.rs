//! Gateway behavior exercised over real HTTP against a mock backend.

pub mod auth_test;
pub mod health_test;
