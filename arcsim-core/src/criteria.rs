//! Boolean criteria DSL used by building templates.
//!
//! A condition is either a literal (list membership for list values, exact
//! equality for numbers) or an operator node:
//!
//! ```json
//! {"AND": ["human", {"NOT": ["orc"]}]}
//! {"OR": [{"GREATER_THAN": 40}, {"EQUALS": 0}]}
//! ```
//!
//! Conditions are decoded once when a template is loaded. Unknown operators
//! are rejected at decode time, so evaluation is an exhaustive `match`.
//!
//! Failure reasons and descriptions are player-facing and therefore rendered
//! in the game's language.

use crate::fixed::Fixed;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Map, Value};
use thiserror::Error;

/// Errors raised while decoding a condition tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CriteriaError {
    #[error("unknown criteria operator `{0}`")]
    UnknownOperator(String),
    #[error("operator node must have exactly one key, found {0:?}")]
    OperatorArity(Vec<String>),
    #[error("operator `{op}` expects {expected}, found {found}")]
    InvalidOperand {
        op: &'static str,
        expected: &'static str,
        found: String,
    },
    #[error("unsupported literal {0}")]
    InvalidLiteral(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Text(String),
    Number(Fixed),
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::Text(s) => f.write_str(s),
            Literal::Number(n) => write!(f, "{n}"),
        }
    }
}

/// Criteria expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Literal(Literal),
    /// Every operand must hold. Evaluates all operands to collect reasons.
    And(Vec<Condition>),
    /// At least one operand must hold. Stops at the first success.
    Or(Vec<Condition>),
    /// None of the operands may hold.
    Not(Vec<Condition>),
    /// Exactly one operand must hold.
    Xor(Vec<Condition>),
    GreaterThan(Fixed),
    LessThan(Fixed),
    Equals(Fixed),
    NotEquals(Fixed),
}

/// The value a condition is evaluated against.
#[derive(Debug, Clone, Copy)]
pub enum CriteriaValue<'a> {
    List(&'a [String]),
    Number(Fixed),
}

impl std::fmt::Display for CriteriaValue<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CriteriaValue::List(items) => write!(f, "[{}]", items.join(", ")),
            CriteriaValue::Number(n) => write!(f, "{n}"),
        }
    }
}

/// Outcome of evaluating a condition. `reason` is set on failure only.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub success: bool,
    pub reason: Option<String>,
}

impl Evaluation {
    pub fn pass() -> Self {
        Self {
            success: true,
            reason: None,
        }
    }

    pub fn fail(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            reason: Some(reason.into()),
        }
    }

    fn reason_text(&self) -> &str {
        self.reason.as_deref().unwrap_or_default()
    }
}

impl Condition {
    pub fn text(s: impl Into<String>) -> Self {
        Condition::Literal(Literal::Text(s.into()))
    }

    pub fn number(n: Fixed) -> Self {
        Condition::Literal(Literal::Number(n))
    }

    /// Decodes a condition from its JSON form.
    pub fn from_json(value: &Value) -> Result<Self, CriteriaError> {
        match value {
            Value::String(s) => Ok(Condition::text(s.clone())),
            Value::Number(_) => Ok(Condition::number(number_operand("literal", value)?)),
            Value::Array(items) => Ok(Condition::And(operand_list(items)?)),
            Value::Object(map) => Self::from_operator(map),
            other => Err(CriteriaError::InvalidLiteral(other.to_string())),
        }
    }

    fn from_operator(map: &Map<String, Value>) -> Result<Self, CriteriaError> {
        let mut entries = map.iter();
        let (op, operands) = match (entries.next(), entries.next()) {
            (Some(entry), None) => entry,
            _ => return Err(CriteriaError::OperatorArity(map.keys().cloned().collect())),
        };
        match op.to_ascii_uppercase().as_str() {
            "AND" => Ok(Condition::And(logical_operands("AND", operands)?)),
            "OR" => Ok(Condition::Or(logical_operands("OR", operands)?)),
            "NOT" => Ok(Condition::Not(logical_operands("NOT", operands)?)),
            "XOR" => Ok(Condition::Xor(logical_operands("XOR", operands)?)),
            "GREATER_THAN" => Ok(Condition::GreaterThan(number_operand("GREATER_THAN", operands)?)),
            "LESS_THAN" => Ok(Condition::LessThan(number_operand("LESS_THAN", operands)?)),
            "EQUALS" => Ok(Condition::Equals(number_operand("EQUALS", operands)?)),
            "NOT_EQUALS" => Ok(Condition::NotEquals(number_operand("NOT_EQUALS", operands)?)),
            _ => Err(CriteriaError::UnknownOperator(op.clone())),
        }
    }

    /// Encodes the condition back into its JSON form.
    pub fn to_json(&self) -> Value {
        fn list(items: &[Condition]) -> Value {
            Value::Array(items.iter().map(Condition::to_json).collect())
        }
        fn number(n: Fixed) -> Value {
            serde_json::to_value(n).unwrap_or(Value::Null)
        }
        match self {
            Condition::Literal(Literal::Text(s)) => Value::String(s.clone()),
            Condition::Literal(Literal::Number(n)) => number(*n),
            Condition::And(items) => json!({ "AND": list(items) }),
            Condition::Or(items) => json!({ "OR": list(items) }),
            Condition::Not(items) => json!({ "NOT": list(items) }),
            Condition::Xor(items) => json!({ "XOR": list(items) }),
            Condition::GreaterThan(n) => json!({ "GREATER_THAN": number(*n) }),
            Condition::LessThan(n) => json!({ "LESS_THAN": number(*n) }),
            Condition::Equals(n) => json!({ "EQUALS": number(*n) }),
            Condition::NotEquals(n) => json!({ "NOT_EQUALS": number(*n) }),
        }
    }
}

fn operand_list(items: &[Value]) -> Result<Vec<Condition>, CriteriaError> {
    items.iter().map(Condition::from_json).collect()
}

/// Logical operators take a list; a single bare operand is accepted as a
/// one-element list.
fn logical_operands(op: &'static str, operands: &Value) -> Result<Vec<Condition>, CriteriaError> {
    match operands {
        Value::Array(items) => operand_list(items),
        Value::String(_) | Value::Number(_) | Value::Object(_) => {
            Ok(vec![Condition::from_json(operands)?])
        }
        other => Err(CriteriaError::InvalidOperand {
            op,
            expected: "a list of conditions",
            found: other.to_string(),
        }),
    }
}

fn number_operand(op: &'static str, operand: &Value) -> Result<Fixed, CriteriaError> {
    let invalid = || CriteriaError::InvalidOperand {
        op,
        expected: "a number",
        found: operand.to_string(),
    };
    match operand {
        Value::Number(_) | Value::String(_) => {
            serde_json::from_value::<Fixed>(operand.clone()).map_err(|_| invalid())
        }
        _ => Err(invalid()),
    }
}

impl Serialize for Condition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Condition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Condition::from_json(&value).map_err(D::Error::custom)
    }
}

/// Evaluates `condition` against `value`.
pub fn evaluate(condition: &Condition, value: CriteriaValue<'_>) -> Evaluation {
    match condition {
        Condition::Literal(literal) => evaluate_literal(literal, value),
        Condition::And(operands) => {
            let reasons: Vec<String> = operands
                .iter()
                .map(|op| evaluate(op, value))
                .filter(|r| !r.success)
                .map(|r| r.reason_text().to_string())
                .collect();
            if reasons.is_empty() {
                Evaluation::pass()
            } else {
                Evaluation::fail(format!(
                    "Ожидалось {}, но найдено {}. Несоответствия: {}",
                    describe(condition),
                    value,
                    reasons.join("; ")
                ))
            }
        }
        Condition::Or(operands) => {
            let mut reasons = Vec::new();
            for op in operands {
                let result = evaluate(op, value);
                if result.success {
                    return Evaluation::pass();
                }
                reasons.push(result.reason_text().to_string());
            }
            Evaluation::fail(format!(
                "Ожидалось {}, но найдено {}. Причины: {}",
                describe(condition),
                value,
                reasons.join("; ")
            ))
        }
        Condition::Not(operands) => {
            if operands.iter().any(|op| evaluate(op, value).success) {
                Evaluation::fail(format!(
                    "Ожидалось {}, но найдено {}",
                    describe(condition),
                    value
                ))
            } else {
                Evaluation::pass()
            }
        }
        Condition::Xor(operands) => {
            let hits = operands
                .iter()
                .filter(|op| evaluate(op, value).success)
                .count();
            if hits == 1 {
                Evaluation::pass()
            } else {
                Evaluation::fail(format!(
                    "Ожидалось {}, но найдено {}",
                    describe(condition),
                    value
                ))
            }
        }
        Condition::GreaterThan(n) => compare(value, condition, |v| v > *n, "больше", *n),
        Condition::LessThan(n) => compare(value, condition, |v| v < *n, "меньше", *n),
        Condition::Equals(n) => compare(value, condition, |v| v == *n, "равно", *n),
        Condition::NotEquals(n) => compare(value, condition, |v| v != *n, "не равно", *n),
    }
}

fn evaluate_literal(literal: &Literal, value: CriteriaValue<'_>) -> Evaluation {
    match value {
        CriteriaValue::List(items) => {
            let needle = literal.to_string();
            if items.iter().any(|item| *item == needle) {
                Evaluation::pass()
            } else {
                Evaluation::fail(format!("Ожидалось значение \"{needle}\", но найдено {value}"))
            }
        }
        CriteriaValue::Number(actual) => {
            let expected = match literal {
                Literal::Number(n) => Some(*n),
                Literal::Text(s) => s.parse::<Fixed>().ok(),
            };
            if expected == Some(actual) {
                Evaluation::pass()
            } else {
                Evaluation::fail(format!("Ожидалось значение {literal}, но найдено {actual}"))
            }
        }
    }
}

fn compare(
    value: CriteriaValue<'_>,
    condition: &Condition,
    holds: impl Fn(Fixed) -> bool,
    relation: &str,
    operand: Fixed,
) -> Evaluation {
    match value {
        CriteriaValue::Number(actual) if holds(actual) => Evaluation::pass(),
        CriteriaValue::Number(actual) => Evaluation::fail(format!(
            "Ожидалось значение {relation} {operand}, но значение равно {actual}"
        )),
        // Numeric comparisons never hold for list values.
        CriteriaValue::List(_) => Evaluation::fail(format!(
            "Ожидалось {}, но найдено {}",
            describe(condition),
            value
        )),
    }
}

/// Human-readable description of a condition, mirroring its structure.
pub fn describe(condition: &Condition) -> String {
    fn joined(items: &[Condition], sep: &str) -> String {
        items.iter().map(describe).collect::<Vec<_>>().join(sep)
    }
    match condition {
        Condition::Literal(Literal::Text(s)) => format!("\"{s}\""),
        Condition::Literal(Literal::Number(n)) => n.to_string(),
        Condition::And(items) => format!("({})", joined(items, " и ")),
        Condition::Or(items) => format!("({})", joined(items, " или ")),
        Condition::Not(items) => format!(
            "не должно быть следующих значений: {}",
            joined(items, " и ")
        ),
        Condition::Xor(items) => format!(
            "только одно из следующих значений: {}",
            joined(items, " или ")
        ),
        Condition::GreaterThan(n) => format!("значение больше {n}"),
        Condition::LessThan(n) => format!("значение меньше {n}"),
        Condition::Equals(n) => format!("значение равно {n}"),
        Condition::NotEquals(n) => format!("значение не равно {n}"),
    }
}

/// Description of a building-dependency tree, phrased as requirements.
pub fn describe_dependencies(condition: &Condition) -> String {
    fn names(items: &[Condition]) -> String {
        items
            .iter()
            .map(|c| match c {
                Condition::Literal(l) => l.to_string(),
                other => describe_dependencies(other),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
    match condition {
        Condition::Literal(l) => format!("Требуется наличие постройки: \"{l}\""),
        Condition::And(items) => format!(
            "Требуется наличие всех следующих построек: {}",
            items
                .iter()
                .map(describe_dependencies)
                .collect::<Vec<_>>()
                .join(", ")
        ),
        Condition::Or(items) => format!(
            "Требуется наличие хотя бы одной из следующих построек: {}",
            items
                .iter()
                .map(describe_dependencies)
                .collect::<Vec<_>>()
                .join(", ")
        ),
        Condition::Not(items) => format!("Требуется отсутствие следующих построек: {}", names(items)),
        Condition::Xor(items) => format!(
            "Требуется наличие ровно одной из следующих построек: {}",
            names(items)
        ),
        _ => "Требуется соответствие неизвестным условиям для построек".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cond(json: Value) -> Condition {
        Condition::from_json(&json).unwrap()
    }

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_list_literal_is_membership() {
        let values = list(&["human", "elf"]);
        assert!(evaluate(&cond(json!("elf")), CriteriaValue::List(&values)).success);
        let miss = evaluate(&cond(json!("orc")), CriteriaValue::List(&values));
        assert!(!miss.success);
        assert_eq!(
            miss.reason.as_deref(),
            Some("Ожидалось значение \"orc\", но найдено [human, elf]")
        );
    }

    #[test]
    fn test_number_literal_is_exact_equality() {
        let c = cond(json!(50));
        assert!(evaluate(&c, CriteriaValue::Number(Fixed::from_int(50))).success);
        assert!(!evaluate(&c, CriteriaValue::Number(Fixed::from_int(51))).success);
    }

    #[test]
    fn test_and_collects_every_failure() {
        let values = list(&["a"]);
        let r = evaluate(&cond(json!({"AND": ["b", "c"]})), CriteriaValue::List(&values));
        assert!(!r.success);
        let reason = r.reason.unwrap();
        assert!(reason.contains("(\"b\" и \"c\")"));
        assert!(reason.contains("\"b\"") && reason.contains("\"c\""));
        assert_eq!(reason.matches("Ожидалось значение").count(), 2);
    }

    #[test]
    fn test_or_short_circuits_on_first_success() {
        let values = list(&["a"]);
        assert!(evaluate(&cond(json!({"OR": ["a", "b"]})), CriteriaValue::List(&values)).success);
        let r = evaluate(&cond(json!({"OR": ["x", "y"]})), CriteriaValue::List(&values));
        assert!(r.reason.unwrap().contains("Причины"));
    }

    #[test]
    fn test_not_inverts() {
        let values = list(&["a"]);
        assert!(!evaluate(&cond(json!({"NOT": ["a"]})), CriteriaValue::List(&values)).success);
        assert!(evaluate(&cond(json!({"NOT": ["b"]})), CriteriaValue::List(&values)).success);
        assert!(evaluate(&cond(json!({"NOT": "b"})), CriteriaValue::List(&values)).success);
    }

    #[test]
    fn test_xor_requires_exactly_one() {
        let values = list(&["a", "b"]);
        assert!(!evaluate(&cond(json!({"XOR": ["a", "b"]})), CriteriaValue::List(&values)).success);
        assert!(evaluate(&cond(json!({"XOR": ["a", "c"]})), CriteriaValue::List(&values)).success);
        assert!(!evaluate(&cond(json!({"XOR": ["c", "d"]})), CriteriaValue::List(&values)).success);
    }

    #[test]
    fn test_numeric_comparisons() {
        let v = CriteriaValue::Number(Fixed::from_int(40));
        assert!(evaluate(&cond(json!({"GREATER_THAN": 30})), v).success);
        assert!(!evaluate(&cond(json!({"GREATER_THAN": 40})), v).success);
        assert!(evaluate(&cond(json!({"LESS_THAN": 41})), v).success);
        assert!(evaluate(&cond(json!({"EQUALS": 40})), v).success);
        assert!(evaluate(&cond(json!({"NOT_EQUALS": 39.5})), v).success);
        let r = evaluate(&cond(json!({"LESS_THAN": 10})), v);
        assert_eq!(
            r.reason.as_deref(),
            Some("Ожидалось значение меньше 10, но значение равно 40")
        );
    }

    #[test]
    fn test_comparison_against_list_fails() {
        let values = list(&["a"]);
        assert!(!evaluate(&cond(json!({"GREATER_THAN": 0})), CriteriaValue::List(&values)).success);
    }

    #[test]
    fn test_bare_array_means_all_of() {
        assert_eq!(
            cond(json!(["a", "b"])),
            Condition::And(vec![Condition::text("a"), Condition::text("b")])
        );
    }

    #[test]
    fn test_unknown_operator_is_rejected() {
        let err = Condition::from_json(&json!({"MAYBE": ["a"]})).unwrap_err();
        assert_eq!(err, CriteriaError::UnknownOperator("MAYBE".to_string()));
        assert!(matches!(
            Condition::from_json(&json!({"AND": ["a"], "OR": ["b"]})),
            Err(CriteriaError::OperatorArity(_))
        ));
        assert!(Condition::from_json(&json!({"GREATER_THAN": "many"})).is_err());
        assert!(Condition::from_json(&json!(null)).is_err());
    }

    #[test]
    fn test_lowercase_operators_accepted() {
        assert_eq!(
            cond(json!({"or": ["a"]})),
            Condition::Or(vec![Condition::text("a")])
        );
    }

    #[test]
    fn test_serde_round_trip_keeps_shape() {
        let original = json!({"OR": ["a", {"NOT": ["b"]}, {"GREATER_THAN": 2.5}]});
        let c: Condition = serde_json::from_value(original.clone()).unwrap();
        assert_eq!(serde_json::to_value(&c).unwrap(), original);
    }

    #[test]
    fn test_describe_mirrors_structure() {
        let c = cond(json!({"AND": ["a", {"OR": ["b", "c"]}]}));
        assert_eq!(describe(&c), "(\"a\" и (\"b\" или \"c\"))");
        let c = cond(json!({"XOR": ["a", "b"]}));
        assert_eq!(
            describe(&c),
            "только одно из следующих значений: \"a\" или \"b\""
        );
    }

    #[test]
    fn test_describe_dependencies() {
        let c = cond(json!({"OR": ["mine", "quarry"]}));
        assert_eq!(
            describe_dependencies(&c),
            "Требуется наличие хотя бы одной из следующих построек: \
             Требуется наличие постройки: \"mine\", Требуется наличие постройки: \"quarry\""
        );
        let c = cond(json!({"NOT": ["slums"]}));
        assert_eq!(
            describe_dependencies(&c),
            "Требуется отсутствие следующих построек: slums"
        );
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn leaf() -> impl Strategy<Value = Condition> {
            prop::sample::select(vec!["a", "b", "c", "d"]).prop_map(Condition::text)
        }

        fn tree() -> impl Strategy<Value = Condition> {
            leaf().prop_recursive(3, 16, 3, |inner| {
                prop_oneof![
                    prop::collection::vec(inner.clone(), 0..3).prop_map(Condition::And),
                    prop::collection::vec(inner.clone(), 0..3).prop_map(Condition::Or),
                    inner.clone().prop_map(|c| Condition::Not(vec![c])),
                    prop::collection::vec(inner, 0..3).prop_map(Condition::Xor),
                ]
            })
        }

        fn values() -> impl Strategy<Value = Vec<String>> {
            prop::sample::subsequence(vec!["a", "b", "c", "d"], 0..4)
                .prop_map(|v| v.into_iter().map(String::from).collect())
        }

        proptest! {
            #[test]
            fn and_is_conjunction(a in tree(), b in tree(), v in values()) {
                let both = Condition::And(vec![a.clone(), b.clone()]);
                let expected = evaluate(&a, CriteriaValue::List(&v)).success
                    && evaluate(&b, CriteriaValue::List(&v)).success;
                prop_assert_eq!(evaluate(&both, CriteriaValue::List(&v)).success, expected);
            }

            #[test]
            fn not_inverts_single_operand(a in tree(), v in values()) {
                let negated = Condition::Not(vec![a.clone()]);
                prop_assert_eq!(
                    evaluate(&negated, CriteriaValue::List(&v)).success,
                    !evaluate(&a, CriteriaValue::List(&v)).success
                );
            }

            #[test]
            fn failures_always_carry_a_reason(a in tree(), v in values()) {
                let r = evaluate(&a, CriteriaValue::List(&v));
                prop_assert_eq!(r.success, r.reason.is_none());
            }

            #[test]
            fn json_round_trip(a in tree()) {
                prop_assert_eq!(Condition::from_json(&a.to_json()).unwrap(), a);
            }
        }
    }
}
