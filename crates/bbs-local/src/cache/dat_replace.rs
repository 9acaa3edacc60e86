//! `dat-replace.ini` loader and applier: literal string substitutions run
//! over the in-memory DAT text before parsing.

use crate::parsers::ini::IniDocument;
use bbs_core::{Error, Result};

const SECTION: &str = "Replace";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceRule {
    pub from: String,
    pub to: String,
}

/// Rejects any rule whose `from` or `to` contains `<>` — such a rule could
/// corrupt DAT field boundaries, so it is refused at load time rather than
/// silently applied.
pub fn load(doc: &IniDocument) -> Result<Vec<ReplaceRule>> {
    let Some(section) = doc.section(SECTION) else {
        return Ok(Vec::new());
    };
    let mut rules = Vec::new();
    for (from, to) in section {
        if from.contains("<>") || to.contains("<>") {
            return Err(Error::Config(format!(
                "dat-replace.ini rule {from:?} -> {to:?} contains '<>'"
            )));
        }
        rules.push(ReplaceRule { from: from.clone(), to: to.clone() });
    }
    Ok(rules)
}

/// Applies every rule in order. An empty replacement is expanded to spaces
/// of the original match length so that byte offsets recorded elsewhere
/// (cached sizes, resume ranges) stay valid.
pub fn apply(text: &str, rules: &[ReplaceRule]) -> String {
    let mut out = text.to_string();
    for rule in rules {
        if rule.from.is_empty() {
            continue;
        }
        let replacement = if rule.to.is_empty() {
            " ".repeat(rule.from.chars().count())
        } else {
            rule.to.clone()
        };
        out = out.replace(&rule.from, &replacement);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_rule_containing_angle_brackets() {
        let mut doc = IniDocument::default();
        doc.set(SECTION, "a<>b", "c");
        assert!(load(&doc).is_err());
    }

    #[test]
    fn empty_replacement_preserves_offset_with_spaces() {
        let rules = vec![ReplaceRule { from: "spam".to_string(), to: String::new() }];
        let out = apply("this is spam text", &rules);
        assert_eq!(out, "this is     text");
        assert_eq!(out.len(), "this is spam text".len());
    }

    #[test]
    fn applies_literal_substitution() {
        let rules = vec![ReplaceRule { from: "foo".to_string(), to: "bar".to_string() }];
        assert_eq!(apply("foo baz foo", &rules), "bar baz bar");
    }

    #[test]
    fn loads_rules_from_ini() {
        let mut doc = IniDocument::default();
        doc.set(SECTION, "badword", "****");
        let rules = load(&doc).unwrap();
        assert_eq!(rules, vec![ReplaceRule { from: "badword".to_string(), to: "****".to_string() }]);
    }
}
