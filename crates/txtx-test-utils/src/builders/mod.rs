//! Test builders for creating test scenarios easily

mod runbook_builder;

pub use runbook_builder::{hcl_value, RunbookBuilder, TEST_RUNBOOK_FILE};
