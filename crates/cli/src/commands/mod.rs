//! CLI Commands

pub mod allure_env;
pub mod clean_env;
