//! Static semantic analysis of Txtx runbooks
//!
//! The doctor checks a runbook without running it: undefined or forward
//! references, action output fields the addon does not produce, flow
//! attributes missing from some flows and `env.*` values the manifest does
//! not provide. Everything is reported at once in a [`ValidationResult`].
//!
//! ```no_run
//! use txtx_doctor::{validate_source, DoctorConfig, ManifestSnapshot, StaticAddonRegistry};
//!
//! let addons = StaticAddonRegistry::new().with_action("evm::send_eth", ["tx_hash"]);
//! let manifest = ManifestSnapshot::new()
//!     .with_defaults([("rpc_url", "http://localhost:8545")])
//!     .with_current_environment("defaults");
//! let source = std::fs::read_to_string("runbook.tx").unwrap();
//!
//! let result = validate_source(&source, "runbook.tx", &addons, Some(&manifest), &DoctorConfig::new());
//! print!("{}", txtx_doctor::report::render_text(&result));
//! std::process::exit(txtx_doctor::report::exit_code(&result));
//! ```

pub mod addons;
pub mod ast;
pub mod config;
pub mod errors;
pub mod location;
pub mod manifest;
pub mod report;
pub mod validation;

pub use addons::{AddonRegistry, StaticAddonRegistry};
pub use ast::hcl::{lower_body, parse_runbook};
pub use ast::{Block, BlockKind, Body, Expression, Runbook};
pub use config::DoctorConfig;
pub use errors::DoctorError;
pub use location::SourceLocation;
pub use manifest::{ManifestSnapshot, DEFAULTS_ENVIRONMENT};
pub use validation::{
    validate_runbook, validate_source, Diagnostic, DiagnosticCategory, Severity, ValidationResult,
};

pub use hcl_edit as hcl;
