//! Closed syntax tree consumed by the doctor
//!
//! The validation passes never see the concrete HCL tree. Providers (the
//! [`hcl`] adapter, or a test building nodes by hand) lower into these types
//! first, so every pass can match exhaustively over block and expression
//! kinds.

pub mod hcl;
pub mod visit;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::location::{BlockContext, SourceLocation};

/// A parsed runbook: its top-level blocks in source order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Runbook {
    pub blocks: Vec<Block>,
}

impl Runbook {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    pub fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    /// Namespaces of the declared addon blocks
    pub fn addon_namespaces(&self) -> impl Iterator<Item = &str> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Addon(addon) => Some(addon.namespace.as_str()),
            _ => None,
        })
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BlockKind {
    Addon,
    Signer,
    Variable,
    Action,
    Flow,
    Input,
    Output,
}

/// Ordered attributes plus nested blocks (`post_condition`, ...)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub attributes: Vec<Attribute>,
    pub blocks: Vec<NestedBlock>,
}

impl Body {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: Expression) -> Self {
        self.attributes.push(Attribute::new(key, value));
        self
    }

    pub fn with_block(mut self, block: NestedBlock) -> Self {
        self.blocks.push(block);
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|attr| attr.key == key)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub key: String,
    pub value: Expression,
    pub location: Option<SourceLocation>,
}

impl Attribute {
    pub fn new(key: impl Into<String>, value: Expression) -> Self {
        Self { key: key.into(), value, location: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedBlock {
    pub ident: String,
    pub body: Body,
    pub location: Option<SourceLocation>,
}

impl NestedBlock {
    pub fn new(ident: impl Into<String>, body: Body) -> Self {
        Self { ident: ident.into(), body, location: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddonBlock {
    pub namespace: String,
    pub body: Body,
    pub location: Option<SourceLocation>,
}

/// Signer or action: a name plus a `namespace::name` type identifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedBlock {
    pub name: String,
    pub type_id: String,
    pub body: Body,
    pub location: Option<SourceLocation>,
}

/// Variable, flow, input or output: a name and a body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedBlock {
    pub name: String,
    pub body: Body,
    pub location: Option<SourceLocation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    Addon(AddonBlock),
    Signer(TypedBlock),
    Variable(NamedBlock),
    Action(TypedBlock),
    Flow(NamedBlock),
    Input(NamedBlock),
    Output(NamedBlock),
}

impl Block {
    pub fn addon(namespace: impl Into<String>, body: Body) -> Self {
        Block::Addon(AddonBlock { namespace: namespace.into(), body, location: None })
    }

    pub fn signer(name: impl Into<String>, type_id: impl Into<String>, body: Body) -> Self {
        Block::Signer(TypedBlock {
            name: name.into(),
            type_id: type_id.into(),
            body,
            location: None,
        })
    }

    pub fn action(name: impl Into<String>, type_id: impl Into<String>, body: Body) -> Self {
        Block::Action(TypedBlock {
            name: name.into(),
            type_id: type_id.into(),
            body,
            location: None,
        })
    }

    pub fn variable(name: impl Into<String>, body: Body) -> Self {
        Block::Variable(NamedBlock::new(name, body))
    }

    pub fn flow(name: impl Into<String>, body: Body) -> Self {
        Block::Flow(NamedBlock::new(name, body))
    }

    pub fn input(name: impl Into<String>, body: Body) -> Self {
        Block::Input(NamedBlock::new(name, body))
    }

    pub fn output(name: impl Into<String>, body: Body) -> Self {
        Block::Output(NamedBlock::new(name, body))
    }

    pub fn kind(&self) -> BlockKind {
        match self {
            Block::Addon(_) => BlockKind::Addon,
            Block::Signer(_) => BlockKind::Signer,
            Block::Variable(_) => BlockKind::Variable,
            Block::Action(_) => BlockKind::Action,
            Block::Flow(_) => BlockKind::Flow,
            Block::Input(_) => BlockKind::Input,
            Block::Output(_) => BlockKind::Output,
        }
    }

    /// The block's name; the namespace for addons
    pub fn name(&self) -> &str {
        match self {
            Block::Addon(b) => &b.namespace,
            Block::Signer(b) | Block::Action(b) => &b.name,
            Block::Variable(b) | Block::Flow(b) | Block::Input(b) | Block::Output(b) => &b.name,
        }
    }

    pub fn type_id(&self) -> Option<&str> {
        match self {
            Block::Signer(b) | Block::Action(b) => Some(&b.type_id),
            _ => None,
        }
    }

    pub fn body(&self) -> &Body {
        match self {
            Block::Addon(b) => &b.body,
            Block::Signer(b) | Block::Action(b) => &b.body,
            Block::Variable(b) | Block::Flow(b) | Block::Input(b) | Block::Output(b) => &b.body,
        }
    }

    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            Block::Addon(b) => b.location.as_ref(),
            Block::Signer(b) | Block::Action(b) => b.location.as_ref(),
            Block::Variable(b) | Block::Flow(b) | Block::Input(b) | Block::Output(b) => {
                b.location.as_ref()
            }
        }
    }

    pub fn with_location(mut self, location: SourceLocation) -> Self {
        let slot = match &mut self {
            Block::Addon(b) => &mut b.location,
            Block::Signer(b) | Block::Action(b) => &mut b.location,
            Block::Variable(b) | Block::Flow(b) | Block::Input(b) | Block::Output(b) => {
                &mut b.location
            }
        };
        *slot = Some(location);
        self
    }

    pub fn context(&self) -> BlockContext {
        BlockContext::new(self.kind(), self.name())
    }
}

impl NamedBlock {
    pub fn new(name: impl Into<String>, body: Body) -> Self {
        Self { name: name.into(), body, location: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Literal {
    Null,
    Bool(bool),
    /// Kept as written so that no precision is lost
    Number(String),
    String(String),
}

/// A dotted traversal such as `action.deploy.contract_address`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceExpr {
    pub path: Vec<String>,
    pub location: Option<SourceLocation>,
}

impl ReferenceExpr {
    pub fn root(&self) -> Option<&str> {
        self.path.first().map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Expression {
    Literal(Literal),
    Reference(ReferenceExpr),
    Call { name: String, args: Vec<Expression> },
    Array(Vec<Expression>),
    Object(Vec<(String, Expression)>),
    /// Operators, conditionals and templates, kept as their operand list
    Composite(Vec<Expression>),
}

impl Expression {
    pub fn null() -> Self {
        Expression::Literal(Literal::Null)
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expression::Literal(Literal::String(value.into()))
    }

    pub fn number(value: impl ToString) -> Self {
        Expression::Literal(Literal::Number(value.to_string()))
    }

    pub fn bool(value: bool) -> Self {
        Expression::Literal(Literal::Bool(value))
    }

    pub fn reference<I, S>(path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Expression::Reference(ReferenceExpr {
            path: path.into_iter().map(Into::into).collect(),
            location: None,
        })
    }

    pub fn action_ref(name: &str, field: &str) -> Self {
        Self::reference(["action", name, field])
    }

    pub fn signer_ref(name: &str) -> Self {
        Self::reference(["signer", name])
    }

    pub fn variable_ref(name: &str) -> Self {
        Self::reference(["variable", name])
    }

    pub fn input_ref(name: &str) -> Self {
        Self::reference(["input", name])
    }

    pub fn env_ref(name: &str) -> Self {
        Self::reference(["env", name])
    }

    pub fn flow_ref(attribute: &str) -> Self {
        Self::reference(["flow", attribute])
    }

    pub fn call(name: impl Into<String>, args: Vec<Expression>) -> Self {
        Expression::Call { name: name.into(), args }
    }

    pub fn array(items: Vec<Expression>) -> Self {
        Expression::Array(items)
    }

    pub fn object<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Expression)>,
        K: Into<String>,
    {
        Expression::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn composite(operands: Vec<Expression>) -> Self {
        Expression::Composite(operands)
    }

    /// Attach a location when this is a reference; other kinds are unchanged
    pub fn at(mut self, location: SourceLocation) -> Self {
        if let Expression::Reference(reference) = &mut self {
            reference.location = Some(location);
        }
        self
    }
}
