//! NG rule evaluation: board/thread/name/id/body matching against an
//! ordered rule set, producing an [`AbonType`] verdict per target.

use bbs_core::ng::{AbonType, MatchMode, NgRule, NgTarget};
use bbs_core::thread::Res;
use regex::RegexBuilder;

/// Scope check: a rule with `Some(board_id)` only applies to that board; a
/// rule with `Some(thread_id)` only applies to that thread. `None` means
/// unscoped (applies everywhere the target type is evaluated).
fn in_scope(rule: &NgRule, board_id: &str, thread_id: Option<&str>) -> bool {
    if let Some(b) = &rule.board_id {
        if b != board_id {
            return false;
        }
    }
    if let Some(t) = &rule.thread_id {
        match thread_id {
            Some(actual) if actual == t => {}
            _ => return false,
        }
    }
    true
}

/// `plain` = every token must be a substring of `text`. `regexp` = the
/// first token compiled case-insensitively and tested; an invalid pattern
/// makes the rule inert (gracefully disabled) rather than an error.
fn tokens_match(rule: &NgRule, text: &str) -> bool {
    match rule.match_mode {
        MatchMode::Plain => !rule.tokens.is_empty() && rule.tokens.iter().all(|tok| text.contains(tok.as_str())),
        MatchMode::Regexp => {
            let Some(pattern) = rule.tokens.first() else {
                return false;
            };
            match RegexBuilder::new(pattern).case_insensitive(true).build() {
                Ok(re) => re.is_match(text),
                Err(_) => false,
            }
        }
    }
}

fn strongest(a: Option<AbonType>, b: Option<AbonType>) -> Option<AbonType> {
    match (a, b) {
        (Some(AbonType::Transparent), _) | (_, Some(AbonType::Transparent)) => Some(AbonType::Transparent),
        (Some(AbonType::Normal), _) | (_, Some(AbonType::Normal)) => Some(AbonType::Normal),
        _ => None,
    }
}

fn find_verdict(rules: &[NgRule], target: NgTarget, board_id: &str, thread_id: Option<&str>, text: &str) -> Option<AbonType> {
    rules
        .iter()
        .filter(|r| r.enabled && r.target == target && in_scope(r, board_id, thread_id))
        .filter(|r| tokens_match(r, text))
        .fold(None, |acc, r| strongest(acc, Some(r.abon_type)))
}

/// Whole-board hide/placeholder verdict.
pub fn evaluate_board(rules: &[NgRule], board_id: &str) -> Option<AbonType> {
    find_verdict(rules, NgTarget::Board, board_id, None, board_id)
}

/// Whole-thread hide/placeholder verdict within a board's subject list.
pub fn evaluate_thread(rules: &[NgRule], board_id: &str, thread_id: &str) -> Option<AbonType> {
    find_verdict(rules, NgTarget::Thread, board_id, Some(thread_id), thread_id)
}

/// Per-response verdict: the strongest of any matching Name/Id/Body rule.
pub fn evaluate_response(rules: &[NgRule], board_id: &str, thread_id: &str, res: &Res) -> Option<AbonType> {
    let name = find_verdict(rules, NgTarget::Name, board_id, Some(thread_id), &res.name);
    let id = res
        .id
        .as_deref()
        .and_then(|id| find_verdict(rules, NgTarget::Id, board_id, Some(thread_id), id));
    let body = find_verdict(rules, NgTarget::Body, board_id, Some(thread_id), &res.body);
    strongest(strongest(name, id), body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn res(name: &str, body: &str, id: Option<&str>) -> Res {
        Res {
            number: 1,
            name: name.to_string(),
            mail: String::new(),
            date_time: String::new(),
            body: body.to_string(),
            title: String::new(),
            id: id.map(|s| s.to_string()),
        }
    }

    fn rule(target: NgTarget, abon: AbonType, mode: MatchMode, tokens: &[&str]) -> NgRule {
        NgRule {
            id: "r1".into(),
            target,
            abon_type: abon,
            match_mode: mode,
            tokens: tokens.iter().map(|s| s.to_string()).collect(),
            board_id: None,
            thread_id: None,
            enabled: true,
        }
    }

    #[test]
    fn plain_mode_requires_every_token() {
        let rules = vec![rule(NgTarget::Body, AbonType::Normal, MatchMode::Plain, &["spam", "buy"])];
        assert_eq!(
            evaluate_response(&rules, "b", "t", &res("x", "buy spam now", None)),
            Some(AbonType::Normal)
        );
        assert_eq!(evaluate_response(&rules, "b", "t", &res("x", "buy now", None)), None);
    }

    #[test]
    fn regexp_mode_uses_first_token_case_insensitively() {
        let rules = vec![rule(NgTarget::Name, AbonType::Transparent, MatchMode::Regexp, &["^anon.*$"])];
        assert_eq!(
            evaluate_response(&rules, "b", "t", &res("ANONYMOUS", "hi", None)),
            Some(AbonType::Transparent)
        );
    }

    #[test]
    fn invalid_regexp_disables_rule_gracefully_instead_of_panicking() {
        let rules = vec![rule(NgTarget::Body, AbonType::Normal, MatchMode::Regexp, &["("])];
        assert_eq!(evaluate_response(&rules, "b", "t", &res("x", "(", None)), None);
    }

    #[test]
    fn scoped_rule_only_applies_to_its_board() {
        let mut r = rule(NgTarget::Body, AbonType::Normal, MatchMode::Plain, &["spam"]);
        r.board_id = Some("newsplus".to_string());
        let rules = vec![r];
        assert_eq!(evaluate_response(&rules, "newsplus", "t", &res("x", "spam", None)), Some(AbonType::Normal));
        assert_eq!(evaluate_response(&rules, "hobby", "t", &res("x", "spam", None)), None);
    }

    #[test]
    fn disabled_rule_never_matches() {
        let mut r = rule(NgTarget::Body, AbonType::Normal, MatchMode::Plain, &["spam"]);
        r.enabled = false;
        let rules = vec![r];
        assert_eq!(evaluate_response(&rules, "b", "t", &res("x", "spam", None)), None);
    }

    #[test]
    fn transparent_outranks_normal_when_both_match() {
        let rules = vec![
            rule(NgTarget::Body, AbonType::Normal, MatchMode::Plain, &["spam"]),
            rule(NgTarget::Name, AbonType::Transparent, MatchMode::Plain, &["x"]),
        ];
        assert_eq!(
            evaluate_response(&rules, "b", "t", &res("x", "spam", None)),
            Some(AbonType::Transparent)
        );
    }

    #[test]
    fn id_rule_matches_only_when_id_present() {
        let rules = vec![rule(NgTarget::Id, AbonType::Normal, MatchMode::Plain, &["AbCdEfGh0"])];
        assert_eq!(
            evaluate_response(&rules, "b", "t", &res("x", "body", Some("AbCdEfGh0"))),
            Some(AbonType::Normal)
        );
        assert_eq!(evaluate_response(&rules, "b", "t", &res("x", "body", None)), None);
    }

    #[test]
    fn board_and_thread_level_verdicts() {
        let mut board_rule = rule(NgTarget::Board, AbonType::Transparent, MatchMode::Plain, &["newsplus"]);
        board_rule.board_id = None;
        let mut thread_rule = rule(NgTarget::Thread, AbonType::Normal, MatchMode::Plain, &["1234567890"]);
        thread_rule.board_id = Some("newsplus".to_string());
        let rules = vec![board_rule, thread_rule];

        assert_eq!(evaluate_board(&rules, "newsplus"), Some(AbonType::Transparent));
        assert_eq!(evaluate_board(&rules, "hobby"), None);
        assert_eq!(evaluate_thread(&rules, "newsplus", "1234567890"), Some(AbonType::Normal));
        assert_eq!(evaluate_thread(&rules, "hobby", "1234567890"), None);
    }
}
