//! 戻り値の述語によるテストケースの絞り込み

use crate::literal::char_literal;
use crate::{DecodeError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// 比較演算子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">=")]
    Ge,
}

impl CompareOp {
    fn holds(self, ordering: Option<Ordering>) -> bool {
        let Some(ordering) = ordering else {
            // NaN とはどの比較も成り立たない（!= を除く）
            return self == CompareOp::Ne;
        };
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ne => ordering != Ordering::Equal,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Le => ordering != Ordering::Greater,
            CompareOp::Ge => ordering != Ordering::Less,
        }
    }
}

impl FromStr for CompareOp {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "==" => Ok(CompareOp::Eq),
            "!=" => Ok(CompareOp::Ne),
            "<" => Ok(CompareOp::Lt),
            ">" => Ok(CompareOp::Gt),
            "<=" => Ok(CompareOp::Le),
            ">=" => Ok(CompareOp::Ge),
            _ => Err(DecodeError::Configuration(format!("wrong predicate: {}", s))),
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Gt => ">",
            CompareOp::Le => "<=",
            CompareOp::Ge => ">=",
        };
        write!(f, "{}", s)
    }
}

/// 比較に使う型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationType {
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Bool,
    Char,
    Float,
    String,
}

impl FromStr for ValidationType {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self> {
        let ty = match s {
            "int8_t" | "int8" => ValidationType::Int8,
            "int16_t" | "int16" => ValidationType::Int16,
            "int32_t" | "int32" => ValidationType::Int32,
            "int64_t" | "int64" => ValidationType::Int64,
            "uint8_t" | "uint8" => ValidationType::Uint8,
            "uint16_t" | "uint16" => ValidationType::Uint16,
            "uint32_t" | "uint32" => ValidationType::Uint32,
            "uint64_t" | "uint64" => ValidationType::Uint64,
            "bool" => ValidationType::Bool,
            "char" => ValidationType::Char,
            "float" => ValidationType::Float,
            "string" => ValidationType::String,
            _ => {
                return Err(DecodeError::Configuration(format!(
                    "unsupported validation type: {}",
                    s
                )))
            }
        };
        Ok(ty)
    }
}

impl ValidationType {
    fn signed_range(self) -> Option<(i64, i64)> {
        match self {
            ValidationType::Int8 => Some((i8::MIN as i64, i8::MAX as i64)),
            ValidationType::Int16 => Some((i16::MIN as i64, i16::MAX as i64)),
            ValidationType::Int32 => Some((i32::MIN as i64, i32::MAX as i64)),
            ValidationType::Int64 => Some((i64::MIN, i64::MAX)),
            _ => None,
        }
    }

    fn unsigned_max(self) -> Option<u64> {
        match self {
            ValidationType::Uint8 => Some(u8::MAX as u64),
            ValidationType::Uint16 => Some(u16::MAX as u64),
            ValidationType::Uint32 => Some(u32::MAX as u64),
            ValidationType::Uint64 => Some(u64::MAX),
            _ => None,
        }
    }
}

/// 比較できる形に読んだ値
#[derive(Debug, Clone, PartialEq)]
enum Scalar {
    Signed(i64),
    Unsigned(u64),
    Bool(bool),
    Float(f32),
    Text(String),
}

impl Scalar {
    fn compare(&self, other: &Scalar) -> Option<Ordering> {
        match (self, other) {
            (Scalar::Signed(a), Scalar::Signed(b)) => Some(a.cmp(b)),
            (Scalar::Unsigned(a), Scalar::Unsigned(b)) => Some(a.cmp(b)),
            (Scalar::Bool(a), Scalar::Bool(b)) => Some(a.cmp(b)),
            (Scalar::Float(a), Scalar::Float(b)) => a.partial_cmp(b),
            (Scalar::Text(a), Scalar::Text(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

/// 整数リテラルのサフィックスを取り除く
fn strip_integer_suffix(literal: &str) -> &str {
    literal.trim().trim_end_matches(['u', 'U', 'l', 'L'])
}

fn parse_signed(literal: &str) -> Option<i64> {
    let trimmed = literal.trim();
    // (-9223372036854775807L - 1) の形
    if trimmed.starts_with("(-9223372036854775807") && trimmed.ends_with("- 1)") {
        return Some(i64::MIN);
    }
    strip_integer_suffix(trimmed).parse().ok()
}

fn parse_unsigned(literal: &str) -> Option<u64> {
    strip_integer_suffix(literal).parse().ok()
}

fn parse_bool(literal: &str) -> Option<bool> {
    match literal.trim() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn parse_float(literal: &str) -> Option<f32> {
    let literal = literal.trim();
    match literal {
        "NAN" => Some(f32::NAN),
        "-NAN" => Some(-f32::NAN),
        "INFINITY" => Some(f32::INFINITY),
        "-INFINITY" => Some(f32::NEG_INFINITY),
        _ => literal.trim_end_matches(['f', 'F']).parse().ok(),
    }
}

fn parse_scalar(literal: &str, validation: ValidationType) -> Option<Scalar> {
    match validation {
        ValidationType::Int8
        | ValidationType::Int16
        | ValidationType::Int32
        | ValidationType::Int64 => parse_signed(literal).map(Scalar::Signed),
        ValidationType::Uint8
        | ValidationType::Uint16
        | ValidationType::Uint32
        | ValidationType::Uint64 => parse_unsigned(literal).map(Scalar::Unsigned),
        ValidationType::Bool => parse_bool(literal).map(Scalar::Bool),
        ValidationType::Float => parse_float(literal).map(Scalar::Float),
        ValidationType::Char | ValidationType::String => Some(Scalar::Text(literal.to_string())),
    }
}

/// 検証済みの述語
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    op: CompareOp,
    expected: String,
    validation: ValidationType,
    expected_value: Scalar,
}

impl Predicate {
    /// 演算子と型を解釈し、期待値が型に合うか確かめる
    pub fn new(op: &str, expected: &str, validation: &str) -> Result<Self> {
        let op: CompareOp = op.parse()?;
        let validation: ValidationType = validation.parse()?;
        Self::from_parts(op, expected, validation)
    }

    pub fn from_parts(op: CompareOp, expected: &str, validation: ValidationType) -> Result<Self> {
        let wrapped = match validation {
            ValidationType::Char => format!("'{}'", expected),
            ValidationType::String => format!("\"{}\"", expected),
            _ => expected.to_string(),
        };
        let expected_value = parse_scalar(&wrapped, validation).ok_or_else(|| {
            DecodeError::Configuration(format!(
                "expected value {} is not a valid {:?}",
                expected, validation
            ))
        })?;
        let in_range = match &expected_value {
            Scalar::Signed(v) => validation
                .signed_range()
                .map(|(lo, hi)| (lo..=hi).contains(v))
                .unwrap_or(true),
            Scalar::Unsigned(v) => validation.unsigned_max().map(|hi| *v <= hi).unwrap_or(true),
            _ => true,
        };
        if !in_range {
            return Err(DecodeError::Configuration(format!(
                "expected value {} is out of range for {:?}",
                expected, validation
            )));
        }
        Ok(Self {
            op,
            expected: expected.to_string(),
            validation,
            expected_value,
        })
    }

    pub fn op(&self) -> CompareOp {
        self.op
    }

    pub fn validation(&self) -> ValidationType {
        self.validation
    }

    pub fn expected(&self) -> &str {
        &self.expected
    }

    /// デコードした値が述語を満たすか
    pub fn matches(&self, value: &str) -> Result<bool> {
        let actual = parse_scalar(value, self.validation).ok_or_else(|| {
            DecodeError::Malformed(format!(
                "value {} is not a valid {:?}",
                value, self.validation
            ))
        })?;
        Ok(self.op.holds(actual.compare(&self.expected_value)))
    }

    /// 一致したテストケースの戻り値として使うリテラル
    pub fn wrapped_expected(&self) -> String {
        match self.validation {
            ValidationType::Char => match self.expected.as_bytes() {
                [c] => char_literal(*c as i64),
                _ => format!("'{}'", self.expected),
            },
            ValidationType::String => format!("\"{}\"", self.expected),
            _ => self.expected.clone(),
        }
    }
}

/// `value op expected` を `validation` の型で評価する
///
/// 演算子や型が不明な場合、期待値が読めない場合は設定エラーになります。
pub fn matches(value: &str, op: &str, expected: &str, validation: &str) -> Result<bool> {
    Predicate::new(op, expected, validation)?.matches(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_predicates() {
        assert!(matches("5", "==", "5", "int32_t").unwrap());
        assert!(matches("-3", "<", "0", "int8_t").unwrap());
        assert!(matches("7LL", ">=", "7", "int64_t").unwrap());
        assert!(matches("10U", ">", "9", "uint32_t").unwrap());
        assert!(!matches("10U", "<=", "9", "uint32_t").unwrap());
        assert!(matches("(-9223372036854775807LL - 1)", "<", "0", "int64_t").unwrap());
    }

    #[test]
    fn test_other_predicates() {
        assert!(matches("true", "==", "true", "bool").unwrap());
        assert!(matches("'a'", "==", "a", "char").unwrap());
        assert!(matches("\"abc\"", "!=", "abd", "string").unwrap());
        assert!(matches("2.5", ">", "2", "float").unwrap());
        assert!(!matches("NAN", "==", "1", "float").unwrap());
        assert!(matches("NAN", "!=", "1", "float").unwrap());
    }

    #[test]
    fn test_configuration_errors() {
        assert!(matches!(
            matches("1", "=~", "1", "int32_t"),
            Err(DecodeError::Configuration(_))
        ));
        assert!(matches!(
            matches("1", "==", "1", "int128_t"),
            Err(DecodeError::Configuration(_))
        ));
        assert!(matches!(
            matches("1", "==", "abc", "int32_t"),
            Err(DecodeError::Configuration(_))
        ));
        assert!(matches!(
            matches("1", "==", "300", "uint8_t"),
            Err(DecodeError::Configuration(_))
        ));
    }

    #[test]
    fn test_malformed_value() {
        assert!(matches!(
            matches("{1, 2}", "==", "1", "int32_t"),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn test_wrapped_expected() {
        let p = Predicate::new("==", "x", "char").unwrap();
        assert_eq!(p.wrapped_expected(), "'x'");
        let p = Predicate::new("==", "42", "int32_t").unwrap();
        assert_eq!(p.wrapped_expected(), "42");
    }
}
