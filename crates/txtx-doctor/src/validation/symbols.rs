//! First pass: collect every declaration with its declaration order

use std::collections::HashMap;
use std::str::FromStr;

use strum::{AsRefStr, Display, EnumString};

use super::errors::ValidationError;
use super::types::{Diagnostic, RelatedLocation};
use crate::ast::{Block, Runbook};
use crate::location::SourceLocation;

/// Properties every flow may carry that are not flow inputs
const INHERITED_PROPERTIES: &[&str] = &[
    "markdown",
    "markdown_filepath",
    "description",
    "depends_on",
    "pre_condition",
    "post_condition",
];

pub fn is_inherited_property(name: &str) -> bool {
    INHERITED_PROPERTIES.contains(&name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, AsRefStr, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum SymbolKind {
    Action,
    Signer,
    Variable,
    Flow,
    Input,
    Output,
}

impl SymbolKind {
    /// Kind addressed by the first segment of a reference path
    pub fn from_root(root: &str) -> Option<Self> {
        match root {
            "var" => Some(SymbolKind::Variable),
            other => SymbolKind::from_str(other).ok(),
        }
    }

    fn of_block(block: &Block) -> Option<Self> {
        match block {
            Block::Addon(_) => None,
            Block::Signer(_) => Some(SymbolKind::Signer),
            Block::Variable(_) => Some(SymbolKind::Variable),
            Block::Action(_) => Some(SymbolKind::Action),
            Block::Flow(_) => Some(SymbolKind::Flow),
            Block::Input(_) => Some(SymbolKind::Input),
            Block::Output(_) => Some(SymbolKind::Output),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub name: String,
    /// `namespace::name` for actions and signers
    pub type_id: Option<String>,
    /// Declared inputs of a flow, inherited properties excluded
    pub attributes: Vec<String>,
    /// Position of the declaring block among all top-level blocks
    pub index: usize,
    pub location: Option<SourceLocation>,
}

impl Symbol {
    pub fn declares(&self, attribute: &str) -> bool {
        self.attributes.iter().any(|a| a == attribute)
    }
}

/// Declarations by (kind, name), in declaration order. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    by_key: HashMap<(SymbolKind, String), usize>,
}

impl SymbolTable {
    pub fn get(&self, kind: SymbolKind, name: &str) -> Option<&Symbol> {
        self.by_key.get(&(kind, name.to_string())).map(|&i| &self.symbols[i])
    }

    pub fn contains(&self, kind: SymbolKind, name: &str) -> bool {
        self.get(kind, name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    pub fn of_kind(&self, kind: SymbolKind) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter().filter(move |s| s.kind == kind)
    }

    pub fn flows(&self) -> impl Iterator<Item = &Symbol> {
        self.of_kind(SymbolKind::Flow)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    fn insert(&mut self, symbol: Symbol) -> Result<(), &Symbol> {
        let key = (symbol.kind, symbol.name.clone());
        if let Some(&existing) = self.by_key.get(&key) {
            return Err(&self.symbols[existing]);
        }
        self.by_key.insert(key, self.symbols.len());
        self.symbols.push(symbol);
        Ok(())
    }
}

/// Build the symbol table for `runbook`. Duplicates and malformed
/// definitions are reported; the first declaration of a name wins.
pub fn build_symbol_table(runbook: &Runbook) -> (SymbolTable, Vec<Diagnostic>) {
    let mut table = SymbolTable::default();
    let mut diagnostics = Vec::new();
    let mut addons: HashMap<&str, Option<&SourceLocation>> = HashMap::new();

    for (index, block) in runbook.blocks.iter().enumerate() {
        let location = block.location().cloned();

        if block.name().is_empty() {
            diagnostics.push(
                ValidationError::MissingLabel(format!("{} name", block.kind()))
                    .into_diagnostic(location),
            );
            continue;
        }

        let Some(kind) = SymbolKind::of_block(block) else {
            match addons.get(block.name()) {
                Some(first) => diagnostics.push(duplicate(
                    ValidationError::DuplicateAddon(block.name().to_string()),
                    location,
                    first.cloned(),
                )),
                None => {
                    addons.insert(block.name(), block.location());
                }
            }
            continue;
        };

        let type_id = block.type_id().map(str::to_string);
        if let Some(type_id) = &type_id {
            if type_id.is_empty() {
                diagnostics.push(
                    ValidationError::MissingLabel(format!("{kind} type"))
                        .into_diagnostic(location.clone())
                        .with_context(block.context().to_string()),
                );
            } else if !is_well_formed_type(type_id) {
                diagnostics.push(
                    ValidationError::InvalidFormat {
                        value: type_id.clone(),
                        expected: "namespace::name".to_string(),
                    }
                    .into_diagnostic(location.clone())
                    .with_context(block.context().to_string()),
                );
            }
        }

        let attributes = match block {
            Block::Flow(flow) => flow
                .body
                .attributes
                .iter()
                .map(|attr| attr.key.clone())
                .filter(|key| !is_inherited_property(key))
                .collect(),
            _ => vec![],
        };

        let symbol = Symbol {
            kind,
            name: block.name().to_string(),
            type_id,
            attributes,
            index,
            location: location.clone(),
        };
        if let Err(first) = table.insert(symbol) {
            diagnostics.push(duplicate(
                ValidationError::DuplicateDefinition {
                    construct_type: kind.to_string(),
                    name: block.name().to_string(),
                },
                location,
                first.location.clone(),
            ));
        }
    }

    tracing::trace!(symbols = table.len(), "symbol table built");
    (table, diagnostics)
}

pub fn is_well_formed_type(type_id: &str) -> bool {
    matches!(type_id.split_once("::"), Some((ns, name)) if !ns.is_empty() && !name.is_empty())
}

fn duplicate(
    error: ValidationError,
    location: Option<SourceLocation>,
    first: Option<SourceLocation>,
) -> Diagnostic {
    error
        .into_diagnostic(location)
        .with_related_location(RelatedLocation::new(first, "First declared here"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Body, Expression};
    use crate::validation::types::DiagnosticCategory;
    use test_case::test_case;

    fn flow(name: &str, attrs: &[&str]) -> Block {
        let body = attrs
            .iter()
            .fold(Body::new(), |body, attr| body.with_attribute(*attr, Expression::string("x")));
        Block::flow(name, body)
    }

    #[test]
    fn test_declaration_order_counts_addons() {
        let runbook = Runbook::new(vec![
            Block::addon("evm", Body::new()),
            Block::variable("a", Body::new()),
            Block::action("send", "evm::send_eth", Body::new()),
        ]);
        let (table, diagnostics) = build_symbol_table(&runbook);

        assert!(diagnostics.is_empty());
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(SymbolKind::Variable, "a").map(|s| s.index), Some(1));
        let send = table.get(SymbolKind::Action, "send").unwrap();
        assert_eq!(send.index, 2);
        assert_eq!(send.type_id.as_deref(), Some("evm::send_eth"));
    }

    #[test]
    fn test_flow_attributes_exclude_inherited_properties() {
        let runbook = Runbook::new(vec![flow("mainnet", &["chain_id", "description", "rpc"])]);
        let (table, _) = build_symbol_table(&runbook);
        let mainnet = table.get(SymbolKind::Flow, "mainnet").unwrap();
        assert_eq!(mainnet.attributes, vec!["chain_id", "rpc"]);
        assert!(mainnet.declares("chain_id"));
        assert!(!mainnet.declares("description"));
    }

    #[test]
    fn test_duplicate_definition() {
        let runbook = Runbook::new(vec![
            Block::variable("a", Body::new()).with_location(SourceLocation::new("m.tx", 1, 1)),
            Block::variable("a", Body::new()).with_location(SourceLocation::new("m.tx", 4, 1)),
            Block::action("a", "evm::send_eth", Body::new()),
        ]);
        let (table, diagnostics) = build_symbol_table(&runbook);

        assert_eq!(diagnostics.len(), 1);
        let diagnostic = &diagnostics[0];
        assert_eq!(diagnostic.message, "Duplicate variable 'a'");
        assert_eq!(diagnostic.category, DiagnosticCategory::Structural);
        assert_eq!(diagnostic.location.as_ref().map(|l| l.line), Some(4));
        assert_eq!(
            diagnostic.related_locations[0].location.as_ref().map(|l| l.line),
            Some(1)
        );
        assert_eq!(table.get(SymbolKind::Variable, "a").map(|s| s.index), Some(0));
    }

    #[test]
    fn test_duplicate_addon() {
        let runbook =
            Runbook::new(vec![Block::addon("evm", Body::new()), Block::addon("evm", Body::new())]);
        let (_, diagnostics) = build_symbol_table(&runbook);
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("'evm'"));
    }

    #[test_case("", "Missing required label: action type")]
    #[test_case("send_eth", "Invalid format: send_eth. Expected: namespace::name")]
    #[test_case("evm::", "Invalid format: evm::. Expected: namespace::name")]
    fn test_malformed_action_type(type_id: &str, expected: &str) {
        let runbook = Runbook::new(vec![Block::action("send", type_id, Body::new())]);
        let (table, diagnostics) = build_symbol_table(&runbook);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, expected);
        assert!(table.contains(SymbolKind::Action, "send"));
    }

    #[test]
    fn test_missing_name() {
        let runbook = Runbook::new(vec![Block::variable("", Body::new())]);
        let (table, diagnostics) = build_symbol_table(&runbook);
        assert!(table.is_empty());
        assert_eq!(diagnostics[0].message, "Missing required label: variable name");
    }

    #[test_case("var", Some(SymbolKind::Variable))]
    #[test_case("variable", Some(SymbolKind::Variable))]
    #[test_case("action", Some(SymbolKind::Action))]
    #[test_case("env", None)]
    fn test_symbol_kind_from_root(root: &str, expected: Option<SymbolKind>) {
        assert_eq!(SymbolKind::from_root(root), expected);
    }
}
