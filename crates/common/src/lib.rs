//! qaflow Common Library
//!
//! Self-contained logic behind the qaflow end-to-end test framework:
//! fixture body mutation, Allure environment report handling, run-scoped
//! session state, configuration and test data.

pub mod browser;
pub mod config;
pub mod env;
pub mod environment;
pub mod error;
pub mod json_path;
pub mod logging;
pub mod properties;
pub mod session;
pub mod testdata;

// Re-export commonly used types
pub use browser::{Browser, DisplayResolution, LaunchPlan};
pub use config::FrameworkConfig;
pub use environment::EnvironmentReport;
pub use error::{Error, Result};
pub use json_path::{
    modify_json, FixtureBody, JsonOperation, JsonOperationKind, PathMutator, SequenceGrowth,
};
pub use logging::LogLevel;
pub use properties::{PropertiesReconciler, ReconcileReport, SelectionPolicy};
pub use session::RunSession;

/// qaflow version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
