//! The built-in subject pattern matchers.

use serde_json::Value;
use tracing::{debug, warn};

use crate::traits::{AuthenticationMatcher, SubjectHint};
use crate::types::Principal;

/// Matches `role:<authority>` subjects against the principal's granted
/// authorities.
#[derive(Debug, Default)]
pub struct RoleAuthenticationMatcher;

pub const ROLE_PREFIX: &str = "role:";

impl AuthenticationMatcher for RoleAuthenticationMatcher {
    fn matches(&self, principal: &Principal, subjects: &[String]) -> bool {
        let any_match = principal
            .authorities
            .iter()
            .any(|authority| subjects.iter().any(|s| s == &format!("{ROLE_PREFIX}{authority}")));

        debug!(
            event = "match_roles",
            principal = %principal.name,
            authorities = ?principal.authorities,
            matched = any_match,
        );

        any_match
    }

    fn hints(&self) -> Vec<SubjectHint> {
        vec![SubjectHint::new(ROLE_PREFIX, "a role/granted authority")]
    }
}

/// Matches `claim:<expression>` subjects by evaluating the expression
/// against the principal's claims.
///
/// Supported expressions:
/// - the literals `true` and `false`
/// - a dotted claim path, satisfied when it resolves to a non-null value
///   other than the boolean `false`
/// - `<path> <op> <literal>` where `<op>` is one of `==`, `!=`, `<`, `>`,
///   `<=`, `>=` and `<literal>` is a single-quoted string, a number or a
///   boolean
///
/// The first `claim:` subject decides the overall outcome. Expressions that
/// fail to parse or evaluate log a warning and count as no-match.
#[derive(Debug, Default)]
pub struct ClaimAuthenticationMatcher;

pub const CLAIM_PREFIX: &str = "claim:";

impl AuthenticationMatcher for ClaimAuthenticationMatcher {
    fn matches(&self, principal: &Principal, subjects: &[String]) -> bool {
        for subject in subjects {
            let Some(expression) = subject.strip_prefix(CLAIM_PREFIX) else {
                continue;
            };

            match evaluate(expression, principal) {
                Ok(outcome) => {
                    debug!(
                        event = "match_claims",
                        principal = %principal.name,
                        expression,
                        matched = outcome,
                    );
                    return outcome;
                }
                Err(reason) => {
                    warn!(event = "claim_expression_failed", expression, reason);
                }
            }
        }

        false
    }

    fn hints(&self) -> Vec<SubjectHint> {
        vec![SubjectHint::new(
            CLAIM_PREFIX,
            "a claim expression, e.g. claim:tier == 'gold'",
        )]
    }
}

fn evaluate(expression: &str, principal: &Principal) -> Result<bool, String> {
    let expression = expression.trim();
    if expression.is_empty() {
        return Err("empty expression".into());
    }

    match split_comparison(expression) {
        Some((left, op, right)) => {
            let left = resolve_operand(left.trim(), principal);
            let right = parse_literal(right.trim())?;
            compare(left, op, right)
        }
        None => Ok(truthy(resolve_operand(expression, principal))),
    }
}

/// Comparison operators, longest first so `==` is not read as two arguments
/// of a missing `=` operator.
const OPERATORS: [&str; 6] = ["==", "!=", "<=", ">=", "<", ">"];

/// Split at the first comparison operator occurring outside single quotes.
fn split_comparison(expression: &str) -> Option<(&str, &str, &str)> {
    let mut quoted = false;
    for (i, c) in expression.char_indices() {
        if c == '\'' {
            quoted = !quoted;
            continue;
        }
        if quoted {
            continue;
        }
        for op in OPERATORS {
            if expression[i..].starts_with(op) {
                return Some((&expression[..i], op, &expression[i + op.len()..]));
            }
        }
    }
    None
}

/// Resolve a path operand: the literals `true`/`false`, or a dotted path
/// into the claims.
fn resolve_operand(operand: &str, principal: &Principal) -> Option<Value> {
    match operand {
        "true" => Some(Value::Bool(true)),
        "false" => Some(Value::Bool(false)),
        path => {
            let mut segments = path.split('.');
            let mut current = principal.claims.get(segments.next()?)?;
            for segment in segments {
                current = current.as_object()?.get(segment)?;
            }
            Some(current.clone())
        }
    }
}

fn parse_literal(literal: &str) -> Result<Value, String> {
    if let Some(quoted) = literal.strip_prefix('\'') {
        return quoted
            .strip_suffix('\'')
            .map(|s| Value::String(s.to_string()))
            .ok_or_else(|| format!("unterminated string literal `{literal}`"));
    }

    match literal {
        "true" => Ok(Value::Bool(true)),
        "false" => Ok(Value::Bool(false)),
        number => number
            .parse::<f64>()
            .map(|n| {
                serde_json::Number::from_f64(n)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            })
            .map_err(|_| format!("unrecognized literal `{literal}`")),
    }
}

fn compare(left: Option<Value>, op: &str, right: Value) -> Result<bool, String> {
    let Some(left) = left else {
        // an unresolvable path satisfies no comparison
        return Ok(false);
    };

    match op {
        "==" => Ok(loose_eq(&left, &right)),
        "!=" => Ok(!loose_eq(&left, &right)),
        ordering => {
            let (Some(l), Some(r)) = (left.as_f64(), right.as_f64()) else {
                return Err(format!("operator `{ordering}` requires numeric operands"));
            };
            Ok(match ordering {
                "<" => l < r,
                ">" => l > r,
                "<=" => l <= r,
                ">=" => l >= r,
                _ => unreachable!(),
            })
        }
    }
}

/// Equality that compares numbers by value so the claim `4711` equals the
/// literal `4711.0`.
fn loose_eq(left: &Value, right: &Value) -> bool {
    match (left.as_f64(), right.as_f64()) {
        (Some(l), Some(r)) => l == r,
        _ => left == right,
    }
}

fn truthy(value: Option<Value>) -> bool {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use yare::parameterized;

    use super::*;

    fn principal_with_claims(claims: Value) -> Principal {
        let Value::Object(claims) = claims else {
            panic!("claims must be an object");
        };
        Principal::new("wilma").with_claims(claims)
    }

    fn claim_matches(claims: Value, subject: &str) -> bool {
        ClaimAuthenticationMatcher.matches(&principal_with_claims(claims), &[subject.to_string()])
    }

    #[test]
    fn role_matcher_matches_granted_authorities() {
        let principal = Principal::new("wilma").with_authorities(["reader", "editor"]);

        let subjects = vec!["role:editor".to_string()];
        assert!(RoleAuthenticationMatcher.matches(&principal, &subjects));

        let subjects = vec!["role:admin".to_string()];
        assert!(!RoleAuthenticationMatcher.matches(&principal, &subjects));
    }

    #[test]
    fn role_matcher_ignores_foreign_patterns() {
        let principal = Principal::new("wilma").with_authorities(["reader"]);

        let subjects = vec!["claim:tier == 'gold'".to_string(), "principal:reader".to_string()];
        assert!(!RoleAuthenticationMatcher.matches(&principal, &subjects));
    }

    #[test]
    fn claim_matcher_ignores_foreign_patterns() {
        assert!(!claim_matches(json!({ "foo": "bar" }), "foo"));
        assert!(!claim_matches(json!({ "foo": "bar" }), "role:foo"));
    }

    #[test]
    fn claim_matcher_matches_always_true_expression() {
        assert!(claim_matches(json!({}), "claim:true"));
        assert!(!claim_matches(json!({}), "claim:false"));
    }

    #[test]
    fn claim_matcher_matches_existence_of_claim() {
        assert!(claim_matches(json!({ "foo": "bar" }), "claim:foo"));
        assert!(!claim_matches(json!({}), "claim:foo"));
        assert!(!claim_matches(json!({ "foo": null }), "claim:foo"));
    }

    #[test]
    fn claim_matcher_matches_boolean_claim() {
        assert!(claim_matches(json!({ "foo": true }), "claim:foo"));
        assert!(!claim_matches(json!({ "foo": false }), "claim:foo"));
    }

    #[test]
    fn claim_matcher_matches_string_claim() {
        assert!(claim_matches(json!({ "foo": "bar" }), "claim:foo == 'bar'"));
        assert!(!claim_matches(json!({ "foo": "baz" }), "claim:foo == 'bar'"));
        assert!(claim_matches(json!({ "foo": "baz" }), "claim:foo != 'bar'"));
    }

    #[parameterized(
        greater = { "claim:foo > 5", true },
        less = { "claim:foo < 5", false },
        greater_or_equal = { "claim:foo >= 4711", true },
        less_or_equal = { "claim:foo <= 4711", true },
        equal = { "claim:foo == 4711", true },
    )]
    fn claim_matcher_matches_numeric_claim(subject: &str, expected: bool) {
        assert_eq!(claim_matches(json!({ "foo": 4711 }), subject), expected);
    }

    #[test]
    fn claim_matcher_walks_nested_claims() {
        let claims = json!({ "resource_access": { "fusion": { "tier": "gold" } } });

        assert!(claim_matches(
            claims.clone(),
            "claim:resource_access.fusion.tier == 'gold'"
        ));
        assert!(!claim_matches(
            claims,
            "claim:resource_access.fusion.tier == 'silver'"
        ));
    }

    #[test]
    fn claim_matcher_handles_failed_lookups() {
        assert!(!claim_matches(json!({}), "claim:foo.bar == 'baz'"));
        assert!(!claim_matches(
            json!({ "resource_access": { "fusion": {} } }),
            "claim:resource_access.foo.bar == 'baz'"
        ));
    }

    #[test]
    fn claim_matcher_rejects_malformed_expressions() {
        assert!(!claim_matches(json!({ "foo": "bar" }), "claim:foo == 'bar"));
        assert!(!claim_matches(json!({ "foo": "bar" }), "claim:foo == bar"));
        assert!(!claim_matches(json!({ "foo": "bar" }), "claim:foo > 'bar'"));
        assert!(!claim_matches(json!({}), "claim:"));
    }

    #[test]
    fn first_claim_subject_decides() {
        let claims = json!({ "foo": false });

        // the first claim expression evaluates to false and is final
        let subjects = vec!["claim:foo".to_string(), "claim:true".to_string()];
        assert!(!ClaimAuthenticationMatcher.matches(&principal_with_claims(claims), &subjects));
    }

    #[test]
    fn quoted_operators_are_not_split() {
        assert!(claim_matches(
            json!({ "foo": "a == b" }),
            "claim:foo == 'a == b'"
        ));
    }

    #[test]
    fn hints_describe_the_prefixes() {
        assert_eq!(RoleAuthenticationMatcher.hints()[0].prefix, "role:");
        assert_eq!(ClaimAuthenticationMatcher.hints()[0].prefix, "claim:");
    }
}
