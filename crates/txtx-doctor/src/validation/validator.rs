//! High-level validation API for runbooks

use std::collections::HashSet;

use tracing::debug;

use super::aggregator::{DiagnosticAggregator, Phase};
use super::environment::validate_environment;
use super::flows::check_flow_consistency;
use super::resolver::{resolve_references, Reference, Resolution};
use super::rules::{apply_rules, ManifestValidationRule};
use super::symbols::build_symbol_table;
use super::types::ValidationResult;
use crate::addons::AddonRegistry;
use crate::ast::hcl::parse_runbook;
use crate::ast::Runbook;
use crate::config::DoctorConfig;
use crate::manifest::ManifestSnapshot;

/// Validate a runbook. Every finding is reported; nothing short-circuits.
///
/// Without a manifest, `env.*` and `input.*` references are not checked.
pub fn validate_runbook(
    runbook: &Runbook,
    addons: &dyn AddonRegistry,
    manifest: Option<&ManifestSnapshot>,
    config: &DoctorConfig,
) -> ValidationResult {
    let span = tracing::debug_span!(
        "validate_runbook",
        file = %config.file_path,
        blocks = runbook.blocks.len(),
        environment = manifest.and_then(|m| m.current_environment.as_deref()),
    );
    let _guard = span.enter();

    let mut aggregator = DiagnosticAggregator::new();

    let (symbols, symbol_diagnostics) = build_symbol_table(runbook);
    debug!(symbols = symbols.len(), diagnostics = symbol_diagnostics.len(), "collected declarations");
    aggregator.extend(Phase::Symbols, symbol_diagnostics);

    let Resolution { diagnostics, flow_refs, env_refs, input_refs } =
        resolve_references(runbook, &symbols, addons, manifest);
    debug!(diagnostics = diagnostics.len(), "resolved references");
    aggregator.extend(Phase::References, diagnostics);

    let flow_diagnostics = check_flow_consistency(&symbols, &flow_refs);
    debug!(
        flows = symbols.flows().count(),
        diagnostics = flow_diagnostics.len(),
        "checked flow consistency"
    );
    aggregator.extend(Phase::Flows, flow_diagnostics);

    if let Some(manifest) = manifest {
        let outcome = validate_environment(&env_refs, manifest);
        debug!(
            env_refs = env_refs.len(),
            diagnostics = outcome.diagnostics.len(),
            "validated environment references"
        );
        aggregator.extend(Phase::Preamble, outcome.notices);
        aggregator.extend(Phase::Environment, outcome.diagnostics);

        if config.lint {
            let environment = manifest.current_environment.as_deref();
            let builtin = config.builtin_rules(environment);
            let rules: Vec<&dyn ManifestValidationRule> =
                builtin.iter().chain(&config.custom_rules).map(|rule| &**rule).collect();
            let references: Vec<&Reference> = env_refs.iter().chain(&input_refs).collect();
            let active_addons: HashSet<String> =
                runbook.addon_namespaces().map(str::to_string).collect();

            let lint_diagnostics = apply_rules(&rules, &references, manifest, &active_addons);
            debug!(
                rules = rules.len(),
                strict = config.is_strict_for(environment),
                diagnostics = lint_diagnostics.len(),
                "applied lint rules"
            );
            aggregator.extend(Phase::Lint, lint_diagnostics);
        }
    } else {
        debug!("no manifest supplied, skipping environment validation");
    }

    let result = aggregator.finish(&config.file_path, config.documentation_links);
    debug!(
        errors = result.error_count(),
        warnings = result.warning_count(),
        suggestions = result.suggestion_count(),
        "validation finished"
    );
    result
}

/// Parse `source` and validate it. A parse failure yields a result holding
/// exactly one structural error.
pub fn validate_source(
    source: &str,
    file: &str,
    addons: &dyn AddonRegistry,
    manifest: Option<&ManifestSnapshot>,
    config: &DoctorConfig,
) -> ValidationResult {
    match parse_runbook(source, file) {
        Ok(runbook) => validate_runbook(&runbook, addons, manifest, config),
        Err(error) => {
            debug!(file, %error, "runbook could not be parsed");
            ValidationResult::fatal(error.into_diagnostic())
        }
    }
}
