//! Addon action specifications
//!
//! The doctor never loads addons itself. Callers hand it something that can
//! answer "which outputs does `namespace::action` produce?", and the same
//! registry may serve several validations concurrently.

use std::collections::{BTreeMap, BTreeSet};

/// Read-only view over the actions provided by the loaded addons
pub trait AddonRegistry: Send + Sync {
    /// Output fields of an action type. `None` when the type is unknown,
    /// `Some(empty)` when the action is known but produces nothing.
    fn outputs_of(&self, action_type: &str) -> Option<&BTreeSet<String>>;

    fn is_known_action(&self, action_type: &str) -> bool {
        self.outputs_of(action_type).is_some()
    }

    /// Documentation page for an action type
    fn documentation_link(&self, action_type: &str) -> Option<String> {
        action_doc_link(action_type)
    }
}

/// In-memory registry keyed by `namespace::action`
#[derive(Debug, Clone, Default)]
pub struct StaticAddonRegistry {
    actions: BTreeMap<String, BTreeSet<String>>,
}

impl StaticAddonRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_action<I, S>(mut self, action_type: impl Into<String>, outputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_action(action_type, outputs);
        self
    }

    pub fn add_action<I, S>(&mut self, action_type: impl Into<String>, outputs: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.actions
            .insert(action_type.into(), outputs.into_iter().map(Into::into).collect());
    }

    /// Register every `(action, outputs)` pair of one addon namespace
    pub fn add_namespace<'a, I, O>(&mut self, namespace: &str, actions: I)
    where
        I: IntoIterator<Item = (&'a str, O)>,
        O: IntoIterator<Item = &'a str>,
    {
        for (action, outputs) in actions {
            self.add_action(format!("{namespace}::{action}"), outputs);
        }
    }

    pub fn action_types(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl AddonRegistry for StaticAddonRegistry {
    fn outputs_of(&self, action_type: &str) -> Option<&BTreeSet<String>> {
        self.actions.get(action_type)
    }
}

/// Documentation page of an action provided by one of the published addons
pub fn action_doc_link(action_type: &str) -> Option<String> {
    let (namespace, action) = action_type.split_once("::")?;
    match namespace {
        "bitcoin" | "evm" | "stacks" | "svm" | "ovm" | "telegram" => Some(format!(
            "https://docs.txtx.sh/addons/{namespace}/actions#{}",
            action.replace('_', "-")
        )),
        _ => None,
    }
}
