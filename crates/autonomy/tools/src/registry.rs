use std::collections::HashMap;

use tracing::{debug, warn};

use crate::builtin::builtin_contracts;
use crate::contract::ToolContract;
use crate::risk::RiskClass;

/// Name-keyed store of tool contracts.
#[derive(Clone, Debug, Default)]
pub struct ToolRegistry {
    contracts: HashMap<String, ToolContract>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry preloaded with [`builtin_contracts`].
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for contract in builtin_contracts() {
            registry.register(contract);
        }
        registry
    }

    /// Insert a contract, returning the one it replaced.
    pub fn register(&mut self, mut contract: ToolContract) -> Option<ToolContract> {
        let name = contract.name.clone();
        if contract.risk_class == RiskClass::Irreversible && !contract.requires_approval {
            warn!(tool = %name, "Irreversible tool registered without approval, forcing approval");
            contract.requires_approval = true;
        }
        let previous = self.contracts.insert(name.clone(), contract);
        if previous.is_some() {
            warn!(tool = %name, "Tool contract re-registered, previous contract overwritten");
        } else {
            debug!(tool = %name, "Tool contract registered");
        }
        previous
    }

    pub fn get(&self, name: &str) -> Option<&ToolContract> {
        self.contracts.get(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.contracts.contains_key(name)
    }

    pub fn unregister(&mut self, name: &str) -> Option<ToolContract> {
        self.contracts.remove(name)
    }

    /// Contracts in one risk tier, sorted by name.
    pub fn by_risk_class(&self, risk: RiskClass) -> Vec<&ToolContract> {
        self.sorted(|c| c.risk_class == risk)
    }

    pub fn by_tag(&self, tag: &str) -> Vec<&ToolContract> {
        self.sorted(|c| c.has_tag(tag))
    }

    /// All contracts, sorted by name.
    pub fn list(&self) -> Vec<&ToolContract> {
        self.sorted(|_| true)
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    fn sorted(&self, keep: impl Fn(&ToolContract) -> bool) -> Vec<&ToolContract> {
        let mut out: Vec<&ToolContract> = self.contracts.values().filter(|c| keep(*c)).collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }
}
