//! Type-safe rule identification for doctor checks
//!
//! Every diagnostic the doctor emits carries the string form of one of these
//! identifiers as its `code`.

use std::collections::HashSet;
use std::fmt;
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

use crate::addons::action_doc_link;

const ENVIRONMENTS_DOC: &str = "https://docs.txtx.sh/concepts/manifest#environments";

/// Identifies which addons a rule applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddonScope {
    /// Rule applies globally regardless of addon
    Global,
    /// Rule applies to specific addon(s)
    Addons(HashSet<String>),
    /// Rule applies to all addons
    AllAddons,
}

impl AddonScope {
    /// Create a scope for a single addon
    pub fn single(addon: impl Into<String>) -> Self {
        Self::Addons(std::iter::once(addon.into()).collect())
    }

    /// Create a scope for multiple addons
    pub fn multiple<I, S>(addons: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Addons(addons.into_iter().map(Into::into).collect())
    }

    /// Check if this scope applies given a set of active addons
    pub fn applies_to(&self, active_addons: &HashSet<String>) -> bool {
        match self {
            Self::Global => true,
            Self::AllAddons => !active_addons.is_empty(),
            Self::Addons(required) => !required.is_disjoint(active_addons),
        }
    }
}

/// Checks built into the doctor
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    AsRefStr,      // Provides as_ref() -> &str
    Display,       // Provides to_string()
    EnumString,    // Provides from_str()
    IntoStaticStr, // Provides into() -> &'static str
    EnumIter,      // Provides iter() over all variants
)]
#[strum(serialize_all = "snake_case")]
pub enum CoreRuleId {
    // Structural
    UnparseableRunbook,
    DuplicateDefinition,
    MalformedDefinition,

    // References
    UndefinedReference,
    ForwardReference,
    UnknownActionType,
    InvalidOutputField,
    TxHashLookup,
    UndefinedInput,

    // Flows
    FlowAddressedByName,
    MissingFlowAttribute,

    // Environment
    PartialValidation,
    UnknownEnvironment,
    UndefinedEnvVar,
    UnusedEnvVar,
    CliInputPrecedence,

    // Linter rules
    InputNamingConvention,
    CliInputOverride,
    SensitiveData,
    NoDefaultValues,
}

impl CoreRuleId {
    /// Returns which addons this rule applies to
    pub fn addon_scope(&self) -> AddonScope {
        use CoreRuleId::*;
        match self {
            TxHashLookup => AddonScope::AllAddons,
            _ => AddonScope::Global,
        }
    }

    /// Get a human-readable description of what the rule validates
    pub const fn description(&self) -> &'static str {
        use CoreRuleId::*;
        match self {
            UnparseableRunbook => "Runbook source must parse",
            DuplicateDefinition => "Each construct name is declared once per kind",
            MalformedDefinition => "Blocks carry their required labels in the expected format",
            UndefinedReference => "References must point at declared constructs",
            ForwardReference => "Constructs may only reference constructs declared before them",
            UnknownActionType => "Action types must be provided by a known addon",
            InvalidOutputField => "Action output fields must exist in the action's addon spec",
            TxHashLookup => "Suggests looking up transaction details through tx_hash",
            UndefinedInput => "Checks if input references exist in the manifest or CLI inputs",
            FlowAddressedByName => "Flow attributes are accessed as flow.<attribute>",
            MissingFlowAttribute => "Every flow defines each referenced flow attribute",
            PartialValidation => "Warns when no environment is selected",
            UnknownEnvironment => "The selected environment must exist in the manifest",
            UndefinedEnvVar => "Environment references must resolve",
            UnusedEnvVar => "Warns about environment variables never referenced",
            CliInputPrecedence => "Notes that CLI inputs override environment values",
            InputNamingConvention => "Validates that inputs follow naming conventions",
            CliInputOverride => "Warns when CLI inputs override environment values",
            SensitiveData => "Detects potential sensitive data in inputs",
            NoDefaultValues => "Ensures production environments don't use default values",
        }
    }

    /// Static documentation page for rules that have one
    pub fn documentation_link(&self) -> Option<String> {
        use CoreRuleId::*;
        match self {
            PartialValidation | UnknownEnvironment | UndefinedEnvVar | UnusedEnvVar
            | CliInputPrecedence | UndefinedInput | NoDefaultValues => {
                Some(ENVIRONMENTS_DOC.to_string())
            }
            _ => None,
        }
    }

    /// Documentation page for rules tied to an action type
    pub fn documentation_link_for_action(&self, action_type: &str) -> Option<String> {
        match self {
            CoreRuleId::InvalidOutputField | CoreRuleId::TxHashLookup => {
                action_doc_link(action_type)
            }
            _ => self.documentation_link(),
        }
    }
}

/// Identifier for validation rules, supporting both internal and external rules
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RuleIdentifier {
    /// Core rule built into the doctor
    Core(CoreRuleId),
    /// Rule supplied by the caller through `DoctorConfig::with_rule`
    External(String),
}

impl RuleIdentifier {
    /// Get a string representation of the rule identifier
    pub fn as_str(&self) -> &str {
        match self {
            RuleIdentifier::Core(id) => id.as_ref(),
            RuleIdentifier::External(name) => name.as_str(),
        }
    }

    pub fn is_core(&self) -> bool {
        matches!(self, RuleIdentifier::Core(_))
    }

    pub fn is_external(&self) -> bool {
        matches!(self, RuleIdentifier::External(_))
    }
}

impl fmt::Display for RuleIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<CoreRuleId> for RuleIdentifier {
    fn from(id: CoreRuleId) -> Self {
        RuleIdentifier::Core(id)
    }
}

impl AsRef<str> for RuleIdentifier {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
