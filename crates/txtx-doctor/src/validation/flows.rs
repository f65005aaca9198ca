//! Multi-variant flow consistency
//!
//! A runbook may declare several flows (mainnet, testnet, ...) that are run
//! one at a time. Any attribute read as `flow.<attr>` must therefore exist in
//! every one of them.

use indexmap::IndexMap;

use super::errors::ValidationError;
use super::resolver::Reference;
use super::symbols::SymbolTable;
use super::types::{Diagnostic, RelatedLocation};

/// One error per (flow, attribute) pair where a referenced attribute is
/// missing. Attributes are visited in first-reference order, flows in
/// declaration order. Nothing is reported when no flow is declared, since the
/// flow may then be supplied at run time.
pub fn check_flow_consistency(symbols: &SymbolTable, flow_refs: &[Reference]) -> Vec<Diagnostic> {
    let mut by_attribute: IndexMap<&str, Vec<&Reference>> = IndexMap::new();
    for reference in flow_refs {
        by_attribute.entry(reference.name()).or_default().push(reference);
    }

    let mut diagnostics = vec![];
    for (attribute, references) in &by_attribute {
        for flow in symbols.flows().filter(|flow| !flow.declares(attribute)) {
            let error = ValidationError::MissingFlowAttribute {
                flow: flow.name.clone(),
                attribute: attribute.to_string(),
            };
            let mut diagnostic = error.into_diagnostic(flow.location.clone());
            if let Some(first) = references.first() {
                diagnostic = diagnostic
                    .with_context(format!("Attribute '{attribute}' is referenced in {}", first.block));
            }
            for reference in references {
                diagnostic = diagnostic.with_related_location(RelatedLocation::new(
                    reference.location.clone(),
                    format!("Referenced here in {}", reference.block),
                ));
            }
            diagnostics.push(diagnostic);
        }
    }
    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Block, Body, Expression, Runbook};
    use crate::location::SourceLocation;
    use crate::validation::resolver::collect_references;
    use crate::validation::symbols::build_symbol_table;

    fn flow(name: &str, attrs: &[&str], line: usize) -> Block {
        let body = attrs
            .iter()
            .fold(Body::new(), |body, attr| body.with_attribute(*attr, Expression::number(1)));
        Block::flow(name, body).with_location(SourceLocation::new("f.tx", line, 1))
    }

    fn uses(attrs: &[&str]) -> Block {
        let body = attrs.iter().enumerate().fold(Body::new(), |body, (i, attr)| {
            body.with_attribute(
                format!("a{i}"),
                Expression::flow_ref(attr).at(SourceLocation::new("f.tx", 20 + i, 5)),
            )
        });
        Block::action("deploy", "evm::deploy_contract", body)
    }

    fn check(runbook: &Runbook) -> Vec<Diagnostic> {
        let (symbols, _) = build_symbol_table(runbook);
        let refs: Vec<_> =
            collect_references(runbook).into_iter().filter(|r| r.root() == "flow").collect();
        check_flow_consistency(&symbols, &refs)
    }

    #[test]
    fn test_consistent_flows() {
        let runbook = Runbook::new(vec![
            flow("mainnet", &["chain_id"], 1),
            flow("testnet", &["chain_id"], 5),
            uses(&["chain_id"]),
        ]);
        assert!(check(&runbook).is_empty());
    }

    #[test]
    fn test_missing_attribute_reported_once_per_flow() {
        let runbook = Runbook::new(vec![
            flow("mainnet", &["chain_id", "api_url"], 1),
            flow("testnet", &["chain_id"], 5),
            flow("devnet", &[], 9),
            uses(&["api_url", "chain_id", "api_url"]),
        ]);
        let diagnostics = check(&runbook);
        let messages: Vec<_> = diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Flow 'testnet' missing input 'api_url'",
                "Flow 'devnet' missing input 'api_url'",
                "Flow 'devnet' missing input 'chain_id'",
            ]
        );

        let first = &diagnostics[0];
        assert_eq!(first.location.as_ref().map(|l| l.line), Some(5));
        assert_eq!(first.related_locations.len(), 2);
        assert_eq!(
            first.context.as_deref(),
            Some("Attribute 'api_url' is referenced in action 'deploy'")
        );
    }

    #[test]
    fn test_unreferenced_attributes_are_fine() {
        let runbook = Runbook::new(vec![
            flow("mainnet", &["chain_id", "extra"], 1),
            flow("testnet", &["chain_id"], 5),
            uses(&["chain_id"]),
        ]);
        assert!(check(&runbook).is_empty());
    }

    #[test]
    fn test_no_flows_declared() {
        let runbook = Runbook::new(vec![uses(&["chain_id"])]);
        assert!(check(&runbook).is_empty());
    }
}
