//! Lowering from the `hcl-edit` syntax tree into the doctor AST
//!
//! The grammar stays `hcl-edit`'s. This module only maps its tree onto
//! [`Runbook`], turning byte spans into 1-based locations along the way.

use hcl_edit::expr::{Expression as HclExpression, ObjectKey, Traversal, TraversalOperator};
use hcl_edit::structure::{Block as HclBlock, BlockLabel, Body as HclBody};
use hcl_edit::template::Element;
use hcl_edit::Span;

use super::{
    AddonBlock, Attribute, Block, Body, Expression, Literal, NamedBlock, NestedBlock,
    ReferenceExpr, Runbook, TypedBlock,
};
use crate::errors::DoctorError;
use crate::location::{SourceLocation, SourceMapper};

/// Parse `source` with `hcl-edit` and lower it
pub fn parse_runbook(source: &str, file: &str) -> Result<Runbook, DoctorError> {
    let body = source.parse::<HclBody>().map_err(|e| DoctorError::Parse {
        file: file.to_string(),
        message: e.message().to_string(),
        location: Some(SourceLocation::new(file, e.location().line(), e.location().column())),
    })?;
    Ok(lower_body(&body, source, file))
}

/// Lower an already parsed body. `source` must be the text `body` was parsed
/// from, otherwise the recorded locations are meaningless.
pub fn lower_body(body: &HclBody, source: &str, file: &str) -> Runbook {
    let lowering = Lowering { mapper: SourceMapper::new(source), file };
    let blocks = body.blocks().filter_map(|block| lowering.top_level_block(block)).collect();
    Runbook { blocks }
}

struct Lowering<'a> {
    mapper: SourceMapper<'a>,
    file: &'a str,
}

impl<'a> Lowering<'a> {
    fn location(&self, span: Option<std::ops::Range<usize>>) -> Option<SourceLocation> {
        self.mapper.optional_span_to_location(span.as_ref(), self.file)
    }

    fn top_level_block(&self, block: &HclBlock) -> Option<Block> {
        let ident = block.ident.value().as_str();
        let location = self.location(block.ident.span());
        let body = self.body(&block.body);
        let name = block.labels.extract_name().unwrap_or_default().to_string();

        let lowered = match ident {
            "addon" => Block::Addon(AddonBlock { namespace: name, body, location }),
            "signer" | "action" => {
                let typed = TypedBlock {
                    name,
                    type_id: block.labels.extract_type().unwrap_or_default().to_string(),
                    body,
                    location,
                };
                if ident == "signer" {
                    Block::Signer(typed)
                } else {
                    Block::Action(typed)
                }
            }
            "variable" => Block::Variable(NamedBlock { name, body, location }),
            "flow" => Block::Flow(NamedBlock { name, body, location }),
            "input" => Block::Input(NamedBlock { name, body, location }),
            "output" => Block::Output(NamedBlock { name, body, location }),
            other => {
                tracing::trace!(block = other, "skipping unsupported top-level block");
                return None;
            }
        };
        Some(lowered)
    }

    fn body(&self, body: &HclBody) -> Body {
        let attributes = body
            .attributes()
            .map(|attr| Attribute {
                key: attr.key.value().to_string(),
                value: self.expression(&attr.value),
                location: self.location(attr.span()),
            })
            .collect();
        let blocks = body
            .blocks()
            .map(|block| NestedBlock {
                ident: block.ident.value().to_string(),
                body: self.body(&block.body),
                location: self.location(block.ident.span()),
            })
            .collect();
        Body { attributes, blocks }
    }

    fn expression(&self, expr: &HclExpression) -> Expression {
        match expr {
            HclExpression::Null(_) => Expression::Literal(Literal::Null),
            HclExpression::Bool(b) => Expression::Literal(Literal::Bool(*b.value())),
            HclExpression::Number(n) => Expression::Literal(Literal::Number(n.value().to_string())),
            HclExpression::String(s) => Expression::Literal(Literal::String(s.value().to_string())),
            HclExpression::Array(elements) => {
                Expression::Array(elements.iter().map(|e| self.expression(e)).collect())
            }
            HclExpression::Object(obj) => {
                let entries = obj
                    .iter()
                    .map(|(key, value)| {
                        let value = self.expression(value.expr());
                        match key {
                            ObjectKey::Ident(ident) => (ident.value().to_string(), value),
                            // Computed keys keep their operands next to the value
                            ObjectKey::Expression(key_expr) => match self.expression(key_expr) {
                                Expression::Literal(Literal::String(key)) => (key, value),
                                key => (String::new(), Expression::Composite(vec![key, value])),
                            },
                        }
                    })
                    .collect();
                Expression::Object(entries)
            }
            HclExpression::StringTemplate(template) => self.template(template.iter()),
            HclExpression::HeredocTemplate(heredoc) => self.template(heredoc.template.iter()),
            HclExpression::Parenthesis(inner) => self.expression(inner.inner()),
            HclExpression::Variable(var) => Expression::Reference(ReferenceExpr {
                path: vec![var.value().to_string()],
                location: self.location(var.span()),
            }),
            HclExpression::Traversal(traversal) => self.traversal(traversal),
            HclExpression::FuncCall(call) => {
                let mut name = call
                    .name
                    .namespace
                    .iter()
                    .map(|ns| ns.value().to_string())
                    .collect::<Vec<_>>();
                name.push(call.name.name.value().to_string());
                Expression::Call {
                    name: name.join("::"),
                    args: call.args.iter().map(|arg| self.expression(arg)).collect(),
                }
            }
            HclExpression::Conditional(cond) => Expression::Composite(vec![
                self.expression(&cond.cond_expr),
                self.expression(&cond.true_expr),
                self.expression(&cond.false_expr),
            ]),
            HclExpression::UnaryOp(op) => Expression::Composite(vec![self.expression(&op.expr)]),
            HclExpression::BinaryOp(op) => Expression::Composite(vec![
                self.expression(&op.lhs_expr),
                self.expression(&op.rhs_expr),
            ]),
            HclExpression::ForExpr(for_expr) => {
                let intro = &for_expr.intro;
                let locals: Vec<&str> = intro
                    .key_var
                    .iter()
                    .chain(std::iter::once(&intro.value_var))
                    .map(|var| var.value().as_str())
                    .collect();

                let mut scoped = vec![];
                if let Some(key_expr) = &for_expr.key_expr {
                    scoped.push(self.expression(key_expr));
                }
                scoped.push(self.expression(&for_expr.value_expr));
                if let Some(cond) = &for_expr.cond {
                    scoped.push(self.expression(&cond.expr));
                }

                // The collection is evaluated outside the iterator scope
                let mut operands = vec![self.expression(&intro.collection_expr)];
                operands.extend(scoped.into_iter().map(|expr| without_locals(expr, &locals)));
                Expression::Composite(operands)
            }
        }
    }

    fn template<'e>(&self, elements: impl Iterator<Item = &'e Element>) -> Expression {
        let operands: Vec<Expression> = elements
            .filter_map(|element| match element {
                Element::Interpolation(interpolation) => Some(self.expression(&interpolation.expr)),
                Element::Directive(_) | Element::Literal(_) => None,
            })
            .collect();
        Expression::Composite(operands)
    }

    /// `a.b.c` becomes a reference path. The path stops at the first
    /// operator that is not an attribute access; index expressions are kept
    /// as operands so that references inside them are still seen.
    fn traversal(&self, traversal: &Traversal) -> Expression {
        let Some(root) = traversal.expr.as_variable() else {
            let mut operands = vec![self.expression(&traversal.expr)];
            operands.extend(self.index_operands(traversal));
            return Expression::Composite(operands);
        };

        let path = std::iter::once(root.as_str().to_string())
            .chain(traversal.operators.iter().map_while(|op| match op.value() {
                TraversalOperator::GetAttr(attr) => Some(attr.value().to_string()),
                _ => None,
            }))
            .collect();
        let reference = Expression::Reference(ReferenceExpr {
            path,
            location: self.location(traversal.span()),
        });

        let indexes = self.index_operands(traversal);
        if indexes.is_empty() {
            reference
        } else {
            Expression::Composite(std::iter::once(reference).chain(indexes).collect())
        }
    }

    fn index_operands(&self, traversal: &Traversal) -> Vec<Expression> {
        traversal
            .operators
            .iter()
            .filter_map(|op| match op.value() {
                TraversalOperator::Index(expr) => Some(self.expression(expr)),
                _ => None,
            })
            .collect()
    }
}

/// Drop references rooted at iterator variables bound by a `for` expression
fn without_locals(expr: Expression, locals: &[&str]) -> Expression {
    let strip = |exprs: Vec<Expression>| -> Vec<Expression> {
        exprs.into_iter().map(|expr| without_locals(expr, locals)).collect()
    };
    match expr {
        Expression::Reference(reference)
            if reference.root().is_some_and(|root| locals.contains(&root)) =>
        {
            Expression::Composite(vec![])
        }
        Expression::Call { name, args } => Expression::Call { name, args: strip(args) },
        Expression::Array(elements) => Expression::Array(strip(elements)),
        Expression::Composite(operands) => Expression::Composite(strip(operands)),
        Expression::Object(entries) => Expression::Object(
            entries
                .into_iter()
                .map(|(key, value)| (key, without_locals(value, locals)))
                .collect(),
        ),
        other => other,
    }
}

trait BlockLabelExt {
    fn extract_name(&self) -> Option<&str>;
    fn extract_type(&self) -> Option<&str>;
}

impl BlockLabelExt for [BlockLabel] {
    fn extract_name(&self) -> Option<&str> {
        self.first().map(label_str)
    }

    fn extract_type(&self) -> Option<&str> {
        self.get(1).map(label_str)
    }
}

fn label_str(label: &BlockLabel) -> &str {
    match label {
        BlockLabel::String(s) => s.value().as_str(),
        BlockLabel::Ident(ident) => ident.value().as_str(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::BlockKind;

    const SOURCE: &str = r#"addon "evm" {
  chain_id = 11155111
}

signer "deployer" "evm::secret_key" {
  secret_key = env.deployer_key
}

action "send" "evm::send_eth" {
  signer = signer.deployer
  amount = flow.amount * 2
  description = "Send ${input.amount} to ${variable.recipient}"
  post_condition {
    assertion = std::assert_eq(action.send.tx_hash, "")
  }
}

output "hash" {
  value = action.send.tx_hash
}
"#;

    #[test]
    fn test_lowers_top_level_blocks() {
        let runbook = parse_runbook(SOURCE, "main.tx").unwrap();
        let kinds: Vec<BlockKind> = runbook.blocks.iter().map(Block::kind).collect();
        assert_eq!(
            kinds,
            vec![BlockKind::Addon, BlockKind::Signer, BlockKind::Action, BlockKind::Output]
        );

        let action = &runbook.blocks[2];
        assert_eq!(action.name(), "send");
        assert_eq!(action.type_id(), Some("evm::send_eth"));
        assert_eq!(action.location(), Some(&SourceLocation::new("main.tx", 9, 1)));
        assert_eq!(action.body().blocks[0].ident, "post_condition");
    }

    #[test]
    fn test_lowers_traversals_to_references() {
        let runbook = parse_runbook(SOURCE, "main.tx").unwrap();
        let signer = runbook.blocks[1].body().attribute("secret_key").unwrap();
        match &signer.value {
            Expression::Reference(reference) => {
                assert_eq!(reference.path, vec!["env", "deployer_key"]);
                assert_eq!(reference.location.as_ref().map(|l| l.line), Some(6));
            }
            other => panic!("expected reference, got {other:?}"),
        }

        let amount = runbook.blocks[2].body().attribute("amount").unwrap();
        let Expression::Composite(operands) = &amount.value else {
            panic!("expected composite, got {:?}", amount.value);
        };
        assert!(matches!(&operands[0], Expression::Reference(r) if r.path == ["flow", "amount"]));
    }

    #[test]
    fn test_lowers_templates_and_calls() {
        let runbook = parse_runbook(SOURCE, "main.tx").unwrap();
        let description = runbook.blocks[2].body().attribute("description").unwrap();
        let Expression::Composite(parts) = &description.value else {
            panic!("expected template operands");
        };
        assert_eq!(parts.len(), 2);

        let assertion = &runbook.blocks[2].body().blocks[0].body.attributes[0];
        let Expression::Call { name, args } = &assertion.value else {
            panic!("expected call");
        };
        assert_eq!(name, "std::assert_eq");
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn test_index_stops_reference_path() {
        let runbook =
            parse_runbook("variable \"x\" {\n  value = variable.list[variable.i].name\n}\n", "a.tx")
                .unwrap();
        let value = &runbook.blocks[0].body().attributes[0].value;
        let Expression::Composite(operands) = value else {
            panic!("expected composite");
        };
        assert!(matches!(&operands[0], Expression::Reference(r) if r.path == ["variable", "list"]));
        assert!(matches!(&operands[1], Expression::Reference(r) if r.path == ["variable", "i"]));
    }

    #[test]
    fn test_missing_labels_lower_to_empty_strings() {
        let runbook = parse_runbook("action \"deploy\" {\n}\n", "a.tx").unwrap();
        assert_eq!(runbook.blocks[0].type_id(), Some(""));
    }

    #[test]
    fn test_unparseable_source() {
        let error = parse_runbook("action \"x\" {", "broken.tx").unwrap_err();
        assert!(matches!(error, DoctorError::Parse { ref file, .. } if file == "broken.tx"));
    }

    #[test]
    fn test_for_expression_iterator_variables_are_local() {
        let source = "variable \"l\" {\n  value = [1]\n}\n\nvariable \"x\" {\n  value = {for k, action in variable.l : k => action.foo if action.ok}\n}\n";
        let runbook = parse_runbook(source, "a.tx").unwrap();
        let paths: Vec<Vec<String>> = crate::validation::collect_references(&runbook)
            .into_iter()
            .map(|reference| reference.path)
            .collect();
        assert_eq!(paths, vec![vec!["variable".to_string(), "l".to_string()]]);
    }
}

