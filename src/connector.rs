//! The connector (spec.md §4.11): a pattern-based linking federate. It never touches
//! publish/subscribe data itself — it only decides which `addTarget` calls two
//! federates' interfaces should receive, so that neither one has to know the other's
//! interface name up front.

use std::collections::{HashMap, HashSet};

use regex::Regex;

#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    #[error("invalid regex rule: {0}")]
    BadPattern(#[from] regex::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    FromTo,
    ToFrom,
    Bidirectional,
}

enum RuleKind {
    Literal { a: String, b: String },
    Pattern { a: Regex, b: Regex },
}

pub struct ConnectionRule {
    kind: RuleKind,
    direction: Direction,
    /// Rule applies only while every one of these tags is set to `"true"` somewhere in
    /// the federation (spec.md §4.11 "`set_tag("T","true")` convention").
    required_tags: Vec<String>,
}

impl ConnectionRule {
    pub fn literal(a: impl Into<String>, b: impl Into<String>, direction: Direction) -> Self {
        ConnectionRule { kind: RuleKind::Literal { a: a.into(), b: b.into() }, direction, required_tags: Vec::new() }
    }

    /// `a_pattern`/`b_pattern` are raw regex source with named capture groups, e.g.
    /// `publication(?P<v>.)` and `inp(?P<v>.)`; a connection is made between every pair
    /// of names whose named-capture bindings agree exactly.
    pub fn pattern(a_pattern: &str, b_pattern: &str, direction: Direction) -> Result<Self, ConnectorError> {
        Ok(ConnectionRule {
            kind: RuleKind::Pattern { a: Regex::new(a_pattern)?, b: Regex::new(b_pattern)? },
            direction,
            required_tags: Vec::new(),
        })
    }

    pub fn require_tag(mut self, tag: impl Into<String>) -> Self {
        self.required_tags.push(tag.into());
        self
    }
}

/// One connection the connector has decided to make: `addTarget(a, b)` (and the
/// reverse, for `Bidirectional`) per `direction`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub interface_a: String,
    pub interface_b: String,
    pub direction: Direction,
}

/// Materializes [`ConnectionRule`]s against the live set of registered interface names.
/// Keeps its own "already made" ledger so re-running [`Connector::apply`] with the same
/// rules and names is a no-op the second time (spec.md §4.11 idempotence requirement).
#[derive(Default)]
pub struct Connector {
    rules: Vec<ConnectionRule>,
    made: HashSet<(String, String)>,
}

fn tag_enabled(tags: &HashMap<String, String>, tag: &str) -> bool {
    matches!(tags.get(tag).map(String::as_str), Some("true"))
}

/// The named-capture binding of one match, in a stable (sorted-by-name) order so two
/// regexes with the same group names can be compared for equality.
fn capture_binding(regex: &Regex, haystack: &str) -> Option<Vec<String>> {
    let captures = regex.captures(haystack)?;
    let mut names: Vec<&str> = regex.capture_names().flatten().collect();
    names.sort_unstable();
    Some(names.into_iter().map(|n| captures.name(n).map(|m| m.as_str().to_owned()).unwrap_or_default()).collect())
}

impl Connector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_rule(&mut self, rule: ConnectionRule) {
        self.rules.push(rule);
    }

    /// Evaluates every rule against `names` (every currently registered interface name)
    /// and `tags`, returning only the connections newly made by this call.
    pub fn apply(&mut self, names: &[String], tags: &HashMap<String, String>) -> Vec<Connection> {
        let mut newly_made = Vec::new();

        for rule in &self.rules {
            if !rule.required_tags.iter().all(|tag| tag_enabled(tags, tag)) {
                continue;
            }

            match &rule.kind {
                RuleKind::Literal { a, b } => {
                    if self.made.insert((a.clone(), b.clone())) {
                        newly_made.push(Connection { interface_a: a.clone(), interface_b: b.clone(), direction: rule.direction });
                    }
                }
                RuleKind::Pattern { a: regex_a, b: regex_b } => {
                    let mut by_binding: HashMap<Vec<String>, String> = HashMap::new();
                    for name in names {
                        if let Some(binding) = capture_binding(regex_a, name) {
                            by_binding.insert(binding, name.clone());
                        }
                    }
                    for name in names {
                        let Some(binding) = capture_binding(regex_b, name) else { continue };
                        let Some(a_name) = by_binding.get(&binding) else { continue };
                        let key = (a_name.clone(), name.clone());
                        if self.made.insert(key) {
                            newly_made.push(Connection {
                                interface_a: a_name.clone(),
                                interface_b: name.clone(),
                                direction: rule.direction,
                            });
                        }
                    }
                }
            }
        }

        newly_made
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_rule_connects_once() {
        let mut connector = Connector::new();
        connector.add_rule(ConnectionRule::literal("gen1.p", "load1.v", Direction::FromTo));
        let names = vec!["gen1.p".to_owned(), "load1.v".to_owned()];
        let tags = HashMap::new();

        let first = connector.apply(&names, &tags);
        assert_eq!(first.len(), 1);
        let second = connector.apply(&names, &tags);
        assert!(second.is_empty(), "re-applying identical rules must not duplicate connections");
    }

    #[test]
    fn gated_rule_is_skipped_until_tag_is_set() {
        let mut connector = Connector::new();
        connector.add_rule(ConnectionRule::literal("a", "b", Direction::Bidirectional).require_tag("enable_ab"));
        let names = vec!["a".to_owned(), "b".to_owned()];

        let disabled = connector.apply(&names, &HashMap::new());
        assert!(disabled.is_empty());

        let mut tags = HashMap::new();
        tags.insert("enable_ab".to_owned(), "true".to_owned());
        let enabled = connector.apply(&names, &tags);
        assert_eq!(enabled.len(), 1);
    }

    #[test]
    fn pattern_rule_matches_one_connection_per_capture_binding() {
        let mut connector = Connector::new();
        connector.add_rule(ConnectionRule::pattern(r"^pub(?P<v>[A-F])$", r"^inp(?P<v>[A-F])$", Direction::FromTo).unwrap());

        let names: Vec<String> = "ABCDEF"
            .chars()
            .flat_map(|c| vec![format!("pub{c}"), format!("inp{c}")])
            .collect();
        let tags = HashMap::new();

        let connections = connector.apply(&names, &tags);
        assert_eq!(connections.len(), 6);
        assert!(connections.iter().any(|c| c.interface_a == "pubA" && c.interface_b == "inpA"));

        assert!(connector.apply(&names, &tags).is_empty());
    }
}
