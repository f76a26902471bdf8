//! Per-entry completion rules.
//!
//! Rules fill in values the remote validator would otherwise reject, and
//! decide which relationships a sink processor auto-terminates. They only
//! ever add: a value already present in the merged map is left untouched.

use crate::domain::PropertyMap;
use serde::{Deserialize, Serialize};

/// A single completion rule attached to a catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompletionRule {
    /// Insert `value` when `property` is absent
    EnsureProperty { property: String, value: String },

    /// Insert `value` when `property` is absent or blank
    EnsureNonEmpty { property: String, value: String },

    /// Auto-terminate `relationships` when no connection leaves the processor
    TerminateWhenSink { relationships: Vec<String> },
}

impl CompletionRule {
    pub fn ensure(property: &str, value: &str) -> Self {
        CompletionRule::EnsureProperty {
            property: property.to_string(),
            value: value.to_string(),
        }
    }

    pub fn ensure_non_empty(property: &str, value: &str) -> Self {
        CompletionRule::EnsureNonEmpty {
            property: property.to_string(),
            value: value.to_string(),
        }
    }

    pub fn terminate_when_sink(relationships: &[&str]) -> Self {
        CompletionRule::TerminateWhenSink {
            relationships: relationships.iter().map(|r| r.to_string()).collect(),
        }
    }

    /// Apply a property rule. Returns true if the map changed.
    pub fn complete_properties(&self, properties: &mut PropertyMap) -> bool {
        match self {
            CompletionRule::EnsureProperty { property, value } => {
                if properties.contains_key(property) {
                    return false;
                }
                properties.insert(property.clone(), value.clone());
                true
            }
            CompletionRule::EnsureNonEmpty { property, value } => {
                let blank = properties
                    .get(property)
                    .map_or(true, |current| current.trim().is_empty());
                if blank {
                    properties.insert(property.clone(), value.clone());
                }
                blank
            }
            CompletionRule::TerminateWhenSink { .. } => false,
        }
    }

    /// Apply a sink rule, appending relationships not already listed
    pub fn complete_auto_terminate(&self, is_source: bool, auto_terminate: &mut Vec<String>) {
        if let CompletionRule::TerminateWhenSink { relationships } = self {
            if is_source {
                return;
            }
            for relationship in relationships {
                if !auto_terminate.contains(relationship) {
                    auto_terminate.push(relationship.clone());
                }
            }
        }
    }
}

/// Overlay `explicit` on `defaults`; explicit values win on key collision
pub fn merge_properties(defaults: &PropertyMap, explicit: &PropertyMap) -> PropertyMap {
    let mut merged = defaults.clone();
    merged.extend(explicit.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn map(pairs: &[(&str, &str)]) -> PropertyMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_explicit_wins_over_default() {
        let defaults = map(&[("Batch Size", "1"), ("Data Format", "Text")]);
        let explicit = map(&[("Batch Size", "10"), ("Custom Text", "{}")]);

        let merged = merge_properties(&defaults, &explicit);
        assert_eq!(
            merged,
            map(&[("Batch Size", "10"), ("Custom Text", "{}"), ("Data Format", "Text")])
        );
    }

    #[test]
    fn test_merge_is_idempotent_and_order_independent() {
        let defaults = map(&[("a", "1"), ("b", "2"), ("c", "3")]);
        let explicit_forward = map(&[("b", "x"), ("d", "y")]);
        let explicit_reverse: PropertyMap = [("d", "y"), ("b", "x")]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let once = merge_properties(&defaults, &explicit_forward);
        let twice = merge_properties(&once, &explicit_forward);
        assert_eq!(once, twice);
        assert_eq!(once, merge_properties(&defaults, &explicit_reverse));
    }

    #[test]
    fn test_ensure_property_only_when_absent() {
        let rule = CompletionRule::ensure("Quality of Service(QoS)", "0");

        let mut absent = PropertyMap::new();
        assert!(rule.complete_properties(&mut absent));
        assert_eq!(absent["Quality of Service(QoS)"], "0");

        let mut present = map(&[("Quality of Service(QoS)", "2")]);
        assert!(!rule.complete_properties(&mut present));
        assert_eq!(present["Quality of Service(QoS)"], "2");
    }

    #[test]
    fn test_ensure_non_empty_replaces_blank() {
        let rule = CompletionRule::ensure_non_empty("Custom Text", "sample");

        let mut blank = map(&[("Custom Text", "  ")]);
        assert!(rule.complete_properties(&mut blank));
        assert_eq!(blank["Custom Text"], "sample");

        let mut filled = map(&[("Custom Text", "payload")]);
        assert!(!rule.complete_properties(&mut filled));
        assert_eq!(filled["Custom Text"], "payload");
    }

    #[test]
    fn test_sink_termination_is_idempotent() {
        let rule = CompletionRule::terminate_when_sink(&["success", "failure"]);

        let mut listed = vec!["failure".to_string()];
        rule.complete_auto_terminate(false, &mut listed);
        rule.complete_auto_terminate(false, &mut listed);
        assert_eq!(listed, vec!["failure".to_string(), "success".to_string()]);
    }

    #[test]
    fn test_sources_are_not_terminated() {
        let rule = CompletionRule::terminate_when_sink(&["success", "failure"]);
        let mut listed = Vec::new();
        rule.complete_auto_terminate(true, &mut listed);
        assert!(listed.is_empty());
    }
}
