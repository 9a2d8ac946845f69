//! Enable/disable strategies.
//!
//! Each scope records disabled servers in exactly one way:
//! - `Inline`: a `disabled: true` flag on the entry
//! - `Array`: `enabledMcpjsonServers` / `disabledMcpjsonServers` name arrays
//! - `Shadow`: disabled entries moved into a sibling shadow file
//!
//! A strategy only ever touches its own scope's files. All mutations are
//! idempotent and return whether a write happened.

pub mod array;
pub mod inline;
pub mod shadow;

use serde::{Deserialize, Serialize};

pub use array::ArrayStrategy;
pub use inline::InlineStrategy;
pub use shadow::ShadowStrategy;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Inline,
    Array,
    Shadow,
}

impl StrategyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StrategyKind::Inline => "inline",
            StrategyKind::Array => "array",
            StrategyKind::Shadow => "shadow",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisableStrategy {
    Inline(InlineStrategy),
    Array(ArrayStrategy),
    Shadow(ShadowStrategy),
}

impl DisableStrategy {
    pub fn kind(&self) -> StrategyKind {
        match self {
            DisableStrategy::Inline(_) => StrategyKind::Inline,
            DisableStrategy::Array(_) => StrategyKind::Array,
            DisableStrategy::Shadow(_) => StrategyKind::Shadow,
        }
    }

    pub fn is_disabled(&self, id: &str) -> Result<bool> {
        match self {
            DisableStrategy::Inline(s) => s.is_disabled(id),
            DisableStrategy::Array(s) => s.is_disabled(id),
            DisableStrategy::Shadow(s) => s.is_disabled(id),
        }
    }

    pub fn disable(&self, id: &str) -> Result<bool> {
        match self {
            DisableStrategy::Inline(s) => s.disable(id),
            DisableStrategy::Array(s) => s.disable(id),
            DisableStrategy::Shadow(s) => s.disable(id),
        }
    }

    pub fn enable(&self, id: &str) -> Result<bool> {
        match self {
            DisableStrategy::Inline(s) => s.enable(id),
            DisableStrategy::Array(s) => s.enable(id),
            DisableStrategy::Shadow(s) => s.enable(id),
        }
    }

    /// Remove strategy bookkeeping for `id` (name arrays, shadow entry).
    pub fn forget(&self, id: &str) -> Result<bool> {
        match self {
            DisableStrategy::Inline(_) => Ok(false),
            DisableStrategy::Array(s) => s.forget(id),
            DisableStrategy::Shadow(s) => s.forget(id),
        }
    }

    pub fn as_shadow(&self) -> Option<&ShadowStrategy> {
        match self {
            DisableStrategy::Shadow(s) => Some(s),
            _ => None,
        }
    }
}
