//! Read-only traversal over the doctor AST
//!
//! Each `visit_*` trait method defaults to the free function of the same
//! name, which walks the node's children. Implementors override the methods
//! they care about and call the free function to keep descending.

use super::{Attribute, Block, Body, Expression, NestedBlock, ReferenceExpr, Runbook};

pub trait Visit {
    fn visit_runbook(&mut self, node: &Runbook) {
        visit_runbook(self, node);
    }

    fn visit_block(&mut self, node: &Block) {
        visit_block(self, node);
    }

    fn visit_body(&mut self, node: &Body) {
        visit_body(self, node);
    }

    fn visit_attr(&mut self, node: &Attribute) {
        visit_attr(self, node);
    }

    fn visit_nested_block(&mut self, node: &NestedBlock) {
        visit_nested_block(self, node);
    }

    fn visit_expr(&mut self, node: &Expression) {
        visit_expr(self, node);
    }

    fn visit_reference(&mut self, _node: &ReferenceExpr) {}
}

pub fn visit_runbook<V: Visit + ?Sized>(v: &mut V, node: &Runbook) {
    for block in &node.blocks {
        v.visit_block(block);
    }
}

pub fn visit_block<V: Visit + ?Sized>(v: &mut V, node: &Block) {
    v.visit_body(node.body());
}

pub fn visit_body<V: Visit + ?Sized>(v: &mut V, node: &Body) {
    for attr in &node.attributes {
        v.visit_attr(attr);
    }
    for block in &node.blocks {
        v.visit_nested_block(block);
    }
}

pub fn visit_attr<V: Visit + ?Sized>(v: &mut V, node: &Attribute) {
    v.visit_expr(&node.value);
}

pub fn visit_nested_block<V: Visit + ?Sized>(v: &mut V, node: &NestedBlock) {
    v.visit_body(&node.body);
}

pub fn visit_expr<V: Visit + ?Sized>(v: &mut V, node: &Expression) {
    match node {
        Expression::Literal(_) => {}
        Expression::Reference(reference) => v.visit_reference(reference),
        Expression::Call { args, .. } => {
            for arg in args {
                v.visit_expr(arg);
            }
        }
        Expression::Array(items) | Expression::Composite(items) => {
            for item in items {
                v.visit_expr(item);
            }
        }
        Expression::Object(entries) => {
            for (_, value) in entries {
                v.visit_expr(value);
            }
        }
    }
}
