//! Static validation of runbooks
//!
//! Two passes over the AST: [`symbols`] collects declarations, [`resolver`]
//! checks every reference against them. The references it hands on feed the
//! [`flows`] and [`environment`] checks, and [`aggregator`] merges all
//! findings into a [`ValidationResult`].

pub mod aggregator;
pub mod environment;
pub mod errors;
pub mod flows;
pub mod resolver;
pub mod rule_id;
pub mod rules;
pub mod symbols;
pub mod types;
pub mod validator;

pub use aggregator::{DiagnosticAggregator, Phase};
pub use environment::{
    validate_environment, EnvironmentOutcome, EnvironmentResolver, ResolvedValue, ValueSource,
};
pub use errors::ValidationError;
pub use flows::check_flow_consistency;
pub use resolver::{collect_references, resolve_references, Reference, Resolution};
pub use rule_id::{AddonScope, CoreRuleId, RuleIdentifier};
pub use rules::{
    apply_rules, default_rules, strict_rules, CliInputOverrideRule, InputNamingConventionRule,
    ManifestValidationRule, NoDefaultValuesRule, RuleContext, SensitiveDataRule,
    ValidationOutcome,
};
pub use symbols::{build_symbol_table, Symbol, SymbolKind, SymbolTable};
pub use types::{Diagnostic, DiagnosticCategory, RelatedLocation, Severity, ValidationResult};
pub use validator::{validate_runbook, validate_source};
