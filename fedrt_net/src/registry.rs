//! Handle registry & name resolution (spec.md §4.4): the root broker's authoritative
//! `name -> (federate, handle)` table, alias chains, and `REGEX:` pattern aliases.

use std::collections::HashMap;

use fedrt_core::{FederateId, InterfaceHandle, InterfaceKind};
use regex::Regex;

use crate::NetError;

/// Bounded alias-chain depth; a chain longer than this is treated as a cycle.
const MAX_ALIAS_HOPS: usize = 8;

#[derive(Debug, Clone, Copy)]
pub struct RegistrationEntry {
    pub federate: FederateId,
    pub handle: InterfaceHandle,
    pub kind: InterfaceKind,
}

/// A `REGEX:pattern` alias matcher: rewrites a concrete name into the canonical name
/// that the pattern's capture groups resolve to.
struct PatternAlias {
    regex: Regex,
    /// Template with `$1`, `$name`, ... capture references, per [`regex::Regex::replace`].
    replacement: String,
}

/// The authoritative name → handle table (spec.md §4.4). A root broker owns one; a
/// sub-broker's copy mirrors only the entries routed through it.
#[derive(Default)]
pub struct HandleRegistry {
    interfaces: HashMap<String, RegistrationEntry>,
    federates: HashMap<String, FederateId>,
    aliases: HashMap<String, String>,
    pattern_aliases: Vec<PatternAlias>,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_federate(&mut self, name: impl Into<String>, id: FederateId) -> Result<(), NetError> {
        let name = name.into();
        if self.federates.contains_key(&name) {
            return Err(NetError::NameCollision(name));
        }
        self.federates.insert(name, id);
        Ok(())
    }

    pub fn register_interface(
        &mut self,
        name: impl Into<String>,
        federate: FederateId,
        handle: InterfaceHandle,
        kind: InterfaceKind,
    ) -> Result<(), NetError> {
        let name = name.into();
        if self.interfaces.contains_key(&name) {
            return Err(NetError::NameCollision(name));
        }
        self.interfaces.insert(name, RegistrationEntry { federate, handle, kind });
        Ok(())
    }

    /// Registers `alias -> canonical`. Cycles are rejected at registration time, not
    /// merely at resolution time, so a bad alias never silently lingers.
    pub fn add_alias(&mut self, alias: impl Into<String>, canonical: impl Into<String>) -> Result<(), NetError> {
        let alias = alias.into();
        let canonical = canonical.into();
        self.aliases.insert(alias.clone(), canonical);
        if self.resolve(&alias).is_err() {
            self.aliases.remove(&alias);
            return Err(NetError::InvalidAlias(alias));
        }
        Ok(())
    }

    /// Registers a `REGEX:pattern` alias matcher (spec.md §4.4, used by the connector's
    /// scenario S6). `replacement` may reference named captures, e.g. `"bus$id.v"`.
    pub fn add_pattern_alias(&mut self, pattern: &str, replacement: impl Into<String>) -> Result<(), NetError> {
        let regex = Regex::new(pattern).map_err(|_| NetError::InvalidAlias(pattern.to_owned()))?;
        self.pattern_aliases.push(PatternAlias { regex, replacement: replacement.into() });
        Ok(())
    }

    /// Resolve `name` through the alias tables (bounded to [`MAX_ALIAS_HOPS`]) and
    /// pattern matchers, down to a concrete registered interface.
    pub fn resolve(&self, name: &str) -> Result<RegistrationEntry, NetError> {
        let mut current = name.to_owned();
        for _ in 0..MAX_ALIAS_HOPS {
            if let Some(entry) = self.interfaces.get(&current) {
                return Ok(*entry);
            }
            if let Some(next) = self.aliases.get(&current) {
                current = next.clone();
                continue;
            }
            if let Some(rewritten) = self.match_pattern(&current) {
                current = rewritten;
                continue;
            }
            return Err(NetError::UnknownDest(FederateId::from(0usize)));
        }
        Err(NetError::InvalidAlias(name.to_owned()))
    }

    fn match_pattern(&self, name: &str) -> Option<String> {
        for pattern in &self.pattern_aliases {
            if let Some(captures) = pattern.regex.captures(name) {
                let mut expanded = String::new();
                captures.expand(&pattern.replacement, &mut expanded);
                return Some(expanded);
            }
        }
        None
    }

    pub fn federate_by_name(&self, name: &str) -> Option<FederateId> {
        self.federates.get(name).copied()
    }
}
