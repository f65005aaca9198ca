//! Second pass: resolve every reference against the symbol table
//!
//! References to actions, signers and variables must point backwards in
//! declaration order. `flow.*`, `env.*` and `input.*` references are handed
//! on to the later checks as explicit data.

use super::errors::ValidationError;
use super::symbols::{is_well_formed_type, SymbolKind, SymbolTable};
use super::types::Diagnostic;
use super::rule_id::CoreRuleId;
use crate::addons::AddonRegistry;
use crate::ast::visit::{self, Visit};
use crate::ast::{Attribute, Block, NestedBlock, ReferenceExpr, Runbook};
use crate::location::{BlockContext, SourceLocation};
use crate::manifest::ManifestSnapshot;

const POST_CONDITION: &str = "post_condition";

/// A dotted reference and where it was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Every segment, root included (`["action", "deploy", "abi"]`)
    pub path: Vec<String>,
    /// Top-level block containing the reference
    pub block: BlockContext,
    /// Declaration index of that block
    pub block_index: usize,
    pub in_post_condition: bool,
    pub location: Option<SourceLocation>,
}

impl Reference {
    pub fn root(&self) -> &str {
        self.path.first().map(String::as_str).unwrap_or_default()
    }

    /// Second segment: the construct name, flow attribute or env var
    pub fn name(&self) -> &str {
        self.path.get(1).map(String::as_str).unwrap_or_default()
    }

    pub fn field(&self) -> Option<&str> {
        self.path.get(2).map(String::as_str)
    }

    pub fn dotted(&self) -> String {
        self.path.join(".")
    }
}

/// What pass two hands to the flow and environment checks
#[derive(Debug, Default)]
pub struct Resolution {
    pub diagnostics: Vec<Diagnostic>,
    pub flow_refs: Vec<Reference>,
    pub env_refs: Vec<Reference>,
    pub input_refs: Vec<Reference>,
}

struct ReferenceCollector {
    block: BlockContext,
    block_index: usize,
    in_post_condition: bool,
    fallback_location: Option<SourceLocation>,
    references: Vec<Reference>,
}

impl Visit for ReferenceCollector {
    fn visit_attr(&mut self, node: &Attribute) {
        let next = node.location.clone().or_else(|| self.fallback_location.clone());
        let previous = std::mem::replace(&mut self.fallback_location, next);
        visit::visit_attr(self, node);
        self.fallback_location = previous;
    }

    fn visit_nested_block(&mut self, node: &NestedBlock) {
        let previous = self.in_post_condition;
        self.in_post_condition |= node.ident == POST_CONDITION;
        visit::visit_nested_block(self, node);
        self.in_post_condition = previous;
    }

    fn visit_reference(&mut self, node: &ReferenceExpr) {
        self.references.push(Reference {
            path: node.path.clone(),
            block: self.block.clone(),
            block_index: self.block_index,
            in_post_condition: self.in_post_condition,
            location: node.location.clone().or_else(|| self.fallback_location.clone()),
        });
    }
}

/// References found in one top-level block. All attributes of a body come
/// before its nested blocks, each in source order, so a nested block that
/// precedes an attribute in the source is still visited after it.
pub fn collect_block_references(index: usize, block: &Block) -> Vec<Reference> {
    let mut collector = ReferenceCollector {
        block: block.context(),
        block_index: index,
        in_post_condition: false,
        fallback_location: block.location().cloned(),
        references: vec![],
    };
    collector.visit_block(block);
    collector.references
}

/// References found in the whole runbook, in block then expression order
pub fn collect_references(runbook: &Runbook) -> Vec<Reference> {
    runbook
        .blocks
        .iter()
        .enumerate()
        .flat_map(|(index, block)| collect_block_references(index, block))
        .collect()
}

struct Resolver<'a> {
    symbols: &'a SymbolTable,
    addons: &'a dyn AddonRegistry,
    manifest: Option<&'a ManifestSnapshot>,
    resolution: Resolution,
}

impl<'a> Resolver<'a> {
    fn error(&mut self, error: ValidationError, reference: &Reference) {
        let diagnostic = error
            .into_diagnostic(reference.location.clone())
            .with_context(format!("Referenced in {}", reference.block));
        self.resolution.diagnostics.push(diagnostic);
    }

    fn check_action_type(&mut self, block: &Block) {
        let Block::Action(action) = block else {
            return;
        };
        if !is_well_formed_type(&action.type_id) || self.addons.is_known_action(&action.type_id) {
            return;
        }
        let (namespace, name) = action.type_id.split_once("::").unwrap_or_default();
        let diagnostic = ValidationError::UnknownAction {
            namespace: namespace.to_string(),
            action: name.to_string(),
        }
        .into_diagnostic(action.location.clone())
        .with_context(block.context().to_string());
        self.resolution.diagnostics.push(diagnostic);
    }

    fn resolve(&mut self, reference: Reference) {
        if reference.path.len() < 2 {
            return;
        }

        match reference.root() {
            "flow" => {
                if reference.path.len() > 2 {
                    let error = ValidationError::FlowAddressedByName {
                        flow: reference.name().to_string(),
                        attribute: reference.path[2].clone(),
                    };
                    self.error(error, &reference);
                } else {
                    self.resolution.flow_refs.push(reference);
                }
            }
            "env" => self.resolution.env_refs.push(reference),
            "input" => {
                if let Some(manifest) = self.manifest {
                    let name = reference.name();
                    if !self.symbols.contains(SymbolKind::Input, name)
                        && !manifest.declares_input(name)
                    {
                        self.error(ValidationError::UndefinedInput(name.to_string()), &reference);
                    }
                }
                self.resolution.input_refs.push(reference);
            }
            "output" => {
                if !self.symbols.contains(SymbolKind::Output, reference.name()) {
                    let error = ValidationError::UndefinedReference {
                        construct_type: SymbolKind::Output.to_string(),
                        name: reference.name().to_string(),
                    };
                    self.error(error, &reference);
                }
            }
            root => match SymbolKind::from_root(root) {
                Some(kind @ (SymbolKind::Action | SymbolKind::Signer | SymbolKind::Variable)) => {
                    self.resolve_ordered(kind, &reference)
                }
                // Function-local names and unknown roots
                _ => {}
            },
        }
    }

    fn resolve_ordered(&mut self, kind: SymbolKind, reference: &Reference) {
        let name = reference.name();
        let Some(symbol) = self.symbols.get(kind, name) else {
            let error = ValidationError::UndefinedReference {
                construct_type: kind.to_string(),
                name: name.to_string(),
            };
            self.error(error, reference);
            return;
        };

        let own_post_condition = kind == SymbolKind::Action
            && reference.in_post_condition
            && symbol.index == reference.block_index;
        if symbol.index >= reference.block_index && !own_post_condition {
            let error = ValidationError::ForwardReference {
                construct_type: kind.to_string(),
                name: name.to_string(),
            };
            self.error(error, reference);
            return;
        }

        if kind != SymbolKind::Action {
            return;
        }
        let (Some(field), Some(action_type)) = (reference.field(), symbol.type_id.as_deref())
        else {
            return;
        };
        let Some(outputs) = self.addons.outputs_of(action_type) else {
            return;
        };
        if outputs.contains(field) {
            return;
        }

        let error = ValidationError::InvalidOutputField {
            action_name: name.to_string(),
            action_type: action_type.to_string(),
            field: field.to_string(),
            available: outputs.clone(),
        };
        let mut diagnostic = error
            .into_diagnostic(reference.location.clone())
            .with_context(format!("Referenced in {}", reference.block));
        if let Some(link) = self.addons.documentation_link(action_type) {
            diagnostic.documentation_link = Some(link);
        }
        self.resolution.diagnostics.push(diagnostic);

        if outputs.contains("tx_hash") {
            let suggestion = Diagnostic::suggestion(format!(
                "Use 'action.{name}.tx_hash' to look up transaction details instead of '{}'",
                reference.dotted()
            ))
            .with_code(CoreRuleId::TxHashLookup)
            .with_location(reference.location.clone())
            .with_documentation(self.addons.documentation_link(action_type));
            self.resolution.diagnostics.push(suggestion);
        }
    }
}

/// Resolve every reference of `runbook`. Diagnostics come out in block
/// order, then expression order.
pub fn resolve_references(
    runbook: &Runbook,
    symbols: &SymbolTable,
    addons: &dyn AddonRegistry,
    manifest: Option<&ManifestSnapshot>,
) -> Resolution {
    let mut resolver = Resolver { symbols, addons, manifest, resolution: Resolution::default() };

    for (index, block) in runbook.blocks.iter().enumerate() {
        resolver.check_action_type(block);
        for reference in collect_block_references(index, block) {
            resolver.resolve(reference);
        }
    }

    tracing::trace!(
        diagnostics = resolver.resolution.diagnostics.len(),
        flow_refs = resolver.resolution.flow_refs.len(),
        env_refs = resolver.resolution.env_refs.len(),
        "references resolved"
    );
    resolver.resolution
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addons::StaticAddonRegistry;
    use crate::ast::{Body, Expression};
    use crate::validation::symbols::build_symbol_table;
    use crate::validation::types::{DiagnosticCategory, Severity};
    use test_case::test_case;

    fn registry() -> StaticAddonRegistry {
        StaticAddonRegistry::new()
            .with_action("evm::send_eth", ["tx_hash"])
            .with_action("evm::eth_call", ["result"])
            .with_action("std::noop", Vec::<String>::new())
    }

    fn resolve(runbook: &Runbook, manifest: Option<&ManifestSnapshot>) -> Resolution {
        let (symbols, _) = build_symbol_table(runbook);
        resolve_references(runbook, &symbols, &registry(), manifest)
    }

    fn messages(resolution: &Resolution) -> Vec<&str> {
        resolution.diagnostics.iter().map(|d| d.message.as_str()).collect()
    }

    fn with_value(value: Expression) -> Body {
        Body::new().with_attribute("value", value)
    }

    #[test]
    fn test_backward_references_resolve() {
        let runbook = Runbook::new(vec![
            Block::variable("a", with_value(Expression::number(1))),
            Block::variable("b", with_value(Expression::variable_ref("a"))),
            Block::variable("c", with_value(Expression::reference(["var", "b"]))),
        ]);
        assert!(resolve(&runbook, None).diagnostics.is_empty());
    }

    #[test]
    fn test_forward_reference() {
        let runbook = Runbook::new(vec![
            Block::variable("a", with_value(Expression::variable_ref("b"))),
            Block::variable("b", with_value(Expression::number(1))),
        ]);
        let resolution = resolve(&runbook, None);
        assert_eq!(messages(&resolution), vec!["variable 'b' is referenced before it is declared"]);
        assert_eq!(
            resolution.diagnostics[0].context.as_deref(),
            Some("Referenced in variable 'a'")
        );
    }

    #[test_case(Expression::variable_ref("missing"), "Undefined variable: 'missing'")]
    #[test_case(Expression::signer_ref("alice"), "Undefined signer: 'alice'")]
    #[test_case(Expression::action_ref("nope", "tx_hash"), "Undefined action: 'nope'")]
    #[test_case(Expression::reference(["output", "ghost"]), "Undefined output: 'ghost'")]
    fn test_undefined_reference(expr: Expression, expected: &str) {
        let runbook = Runbook::new(vec![Block::variable("x", with_value(expr))]);
        assert_eq!(messages(&resolve(&runbook, None)), vec![expected]);
    }

    #[test]
    fn test_invalid_output_field_with_tx_hash_suggestion() {
        let runbook = Runbook::new(vec![
            Block::action("send", "evm::send_eth", Body::new()),
            Block::output("result", with_value(Expression::action_ref("send", "result"))),
        ]);
        let resolution = resolve(&runbook, None);

        assert_eq!(resolution.diagnostics.len(), 2);
        let error = &resolution.diagnostics[0];
        assert_eq!(error.severity, Severity::Error);
        assert_eq!(
            error.message,
            "Field 'result' does not exist on action 'send' (evm::send_eth). Available outputs: tx_hash"
        );
        assert_eq!(
            error.documentation_link.as_deref(),
            Some("https://docs.txtx.sh/addons/evm/actions#send-eth")
        );
        let suggestion = &resolution.diagnostics[1];
        assert_eq!(suggestion.severity, Severity::Suggestion);
        assert!(suggestion.message.contains("action.send.tx_hash"));
    }

    #[test]
    fn test_field_access_beyond_one_level_is_not_checked() {
        let runbook = Runbook::new(vec![
            Block::action("call", "evm::eth_call", Body::new()),
            Block::output(
                "x",
                with_value(Expression::reference(["action", "call", "result", "anything"])),
            ),
        ]);
        assert!(resolve(&runbook, None).diagnostics.is_empty());
    }

    #[test]
    fn test_unknown_action_type() {
        let runbook = Runbook::new(vec![
            Block::action("x", "evm::teleport", Body::new()),
            Block::output("y", with_value(Expression::action_ref("x", "whatever"))),
        ]);
        let resolution = resolve(&runbook, None);
        assert_eq!(messages(&resolution), vec!["Unknown action: evm::teleport"]);
        assert_eq!(resolution.diagnostics[0].category, DiagnosticCategory::Reference);
    }

    #[test]
    fn test_post_condition_may_reference_own_action() {
        let body = Body::new().with_block(crate::ast::NestedBlock::new(
            "post_condition",
            Body::new().with_attribute("assertion", Expression::action_ref("send", "tx_hash")),
        ));
        let runbook = Runbook::new(vec![Block::action("send", "evm::send_eth", body)]);
        assert!(resolve(&runbook, None).diagnostics.is_empty());
    }

    #[test]
    fn test_action_cannot_reference_itself_outside_post_condition() {
        let body = with_value(Expression::action_ref("send", "tx_hash"));
        let runbook = Runbook::new(vec![Block::action("send", "evm::send_eth", body)]);
        assert_eq!(
            messages(&resolve(&runbook, None)),
            vec!["action 'send' is referenced before it is declared"]
        );
    }

    #[test]
    fn test_flow_references_are_recorded() {
        let runbook = Runbook::new(vec![Block::variable(
            "x",
            Body::new()
                .with_attribute("a", Expression::flow_ref("chain_id"))
                .with_attribute("b", Expression::reference(["flow", "mainnet", "chain_id"])),
        )]);
        let resolution = resolve(&runbook, None);
        assert_eq!(resolution.flow_refs.len(), 1);
        assert_eq!(resolution.flow_refs[0].name(), "chain_id");
        assert_eq!(resolution.diagnostics.len(), 1);
        assert_eq!(resolution.diagnostics[0].category, DiagnosticCategory::FlowConsistency);
    }

    #[test]
    fn test_input_checked_only_with_manifest() {
        let runbook = Runbook::new(vec![
            Block::input("declared", Body::new()),
            Block::variable(
                "x",
                Body::new()
                    .with_attribute("a", Expression::input_ref("declared"))
                    .with_attribute("b", Expression::input_ref("from_env"))
                    .with_attribute("c", Expression::input_ref("unknown")),
            ),
        ]);
        assert!(resolve(&runbook, None).diagnostics.is_empty());

        let manifest = ManifestSnapshot::new().with_defaults([("from_env", "1")]);
        let resolution = resolve(&runbook, Some(&manifest));
        assert_eq!(messages(&resolution), vec!["Undefined input: 'unknown'"]);
        assert_eq!(resolution.input_refs.len(), 3);
    }

    #[test]
    fn test_function_local_names_are_ignored() {
        let runbook = Runbook::new(vec![Block::variable(
            "x",
            with_value(Expression::composite(vec![
                Expression::reference(["item", "name"]),
                Expression::reference(["each"]),
            ])),
        )]);
        assert!(resolve(&runbook, None).diagnostics.is_empty());
    }

    #[test]
    fn test_collect_references_tracks_post_condition() {
        let body = Body::new()
            .with_attribute("a", Expression::env_ref("x"))
            .with_block(crate::ast::NestedBlock::new(
                "post_condition",
                Body::new().with_attribute("b", Expression::env_ref("y")),
            ));
        let runbook = Runbook::new(vec![Block::action("send", "evm::send_eth", body)]);
        let references = collect_references(&runbook);
        assert_eq!(references.len(), 2);
        assert!(!references[0].in_post_condition);
        assert!(references[1].in_post_condition);
    }

    #[test]
    fn test_reference_location_falls_back_to_attribute_then_block() {
        let mut body = Body::new().with_attribute("a", Expression::env_ref("x"));
        body.attributes.push(Attribute {
            key: "b".to_string(),
            value: Expression::env_ref("y"),
            location: Some(SourceLocation::new("main.tx", 3, 3)),
        });
        let block = Block::action("send", "evm::send_eth", body)
            .with_location(SourceLocation::new("main.tx", 2, 1));
        let references = collect_block_references(0, &block);

        assert_eq!(references[0].location, Some(SourceLocation::new("main.tx", 2, 1)));
        assert_eq!(references[1].location, Some(SourceLocation::new("main.tx", 3, 3)));
    }

    #[test]
    fn test_attributes_are_collected_before_nested_blocks() {
        let source = "action \"send\" \"evm::send_eth\" {\n  post_condition {\n    assertion = env.first\n  }\n  amount = env.second\n}\n";
        let runbook = crate::ast::hcl::parse_runbook(source, "main.tx").unwrap();
        let names: Vec<String> =
            collect_references(&runbook).iter().map(Reference::dotted).collect();
        assert_eq!(names, vec!["env.second", "env.first"]);
    }
}

