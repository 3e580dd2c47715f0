// used for decimal numbers
use bigdecimal::BigDecimal;

// used when parsing a string to a decimal
use std::str::FromStr;
// used to print out readable forms of a data type
use std::fmt;
// used to indicate that data types need to be hashable
use std::hash::{Hash, Hasher};
// used to order values of the same kind
use std::cmp::Ordering;
use std::ops;

use crate::error::{DtalgebraError, Result};

// ------------- Value Types --------------
// The type slot of a basis is restricted to these three tokens.
#[derive(Eq, PartialEq, PartialOrd, Ord, Hash, Clone, Copy, Debug)]
pub enum ValueType {
    Boolean,
    Decimal,
    String,
}

impl ValueType {
    pub const ALL: [ValueType; 3] = [ValueType::Boolean, ValueType::Decimal, ValueType::String];

    pub fn token(&self) -> &'static str {
        match self {
            ValueType::Boolean => "boolean",
            ValueType::Decimal => "decimal",
            ValueType::String => "string",
        }
    }
    /// Case-folding lookup of a type token, `None` for anything outside the enumeration.
    pub fn from_token(token: &str) -> Option<ValueType> {
        ValueType::ALL
            .into_iter()
            .find(|t| t.token().eq_ignore_ascii_case(token))
    }
}
impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}

// ------------- Decimal --------------
// Equality and hashing follow the numeric value, so 1.50 and 1.5 are the same decimal.
#[derive(Clone, Debug)]
pub struct Decimal(BigDecimal);

impl Decimal {
    pub fn new(decimal: BigDecimal) -> Self {
        Decimal(decimal)
    }
    pub fn from_str(s: &str) -> Option<Decimal> {
        match BigDecimal::from_str(s) {
            Ok(decimal) => Some(Decimal(decimal)),
            _ => None,
        }
    }
    /// The decimal with trailing fractional zeros stripped.
    pub fn stripped(&self) -> BigDecimal {
        self.0.normalized()
    }
}
impl PartialEq for Decimal {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
impl Eq for Decimal {}
impl Hash for Decimal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let (digits, scale) = self.stripped().into_bigint_and_exponent();
        digits.hash(state);
        scale.hash(state);
    }
}
impl Ord for Decimal {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}
impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl ops::Deref for Decimal {
    type Target = BigDecimal;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
impl From<BigDecimal> for Decimal {
    fn from(decimal: BigDecimal) -> Self {
        Decimal(decimal)
    }
}
impl From<i64> for Decimal {
    fn from(n: i64) -> Self {
        Decimal(BigDecimal::from(n))
    }
}

// ------------- Value --------------
/// A typed value held by an algebra element. `Null` fits a basis of any type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Value {
    Boolean(bool),
    Decimal(Decimal),
    String(String),
    Null,
}

impl Value {
    /// Parses the textual form of a value of the given type. The text is taken
    /// as is, surrounding whitespace makes a decimal or boolean invalid.
    pub fn parse(value_type: ValueType, text: &str) -> Result<Value> {
        let invalid = || DtalgebraError::InvalidValue { value_type, text: text.to_owned() };
        match value_type {
            ValueType::String => Ok(Value::String(text.to_owned())),
            ValueType::Decimal => Decimal::from_str(text).map(Value::Decimal).ok_or_else(invalid),
            ValueType::Boolean => {
                if text.eq_ignore_ascii_case("true") {
                    Ok(Value::Boolean(true))
                } else if text.eq_ignore_ascii_case("false") {
                    Ok(Value::Boolean(false))
                } else {
                    Err(invalid())
                }
            }
        }
    }
    pub fn decimal(s: &str) -> Option<Value> {
        Decimal::from_str(s).map(Value::Decimal)
    }
    pub fn string(s: impl Into<String>) -> Value {
        Value::String(s.into())
    }
    /// The kind of the value, `None` for null.
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            Value::Boolean(_) => Some(ValueType::Boolean),
            Value::Decimal(_) => Some(ValueType::Decimal),
            Value::String(_) => Some(ValueType::String),
            Value::Null => None,
        }
    }
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
    pub fn fits(&self, value_type: ValueType) -> bool {
        self.value_type().is_none_or(|t| t == value_type)
    }
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
    /// Orders two values of the same kind. Null and mixed kinds are not comparable.
    pub fn try_cmp(&self, other: &Value) -> Result<Ordering> {
        match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => Ok(a.cmp(b)),
            (Value::Decimal(a), Value::Decimal(b)) => Ok(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Ok(a.cmp(b)),
            _ => Err(DtalgebraError::InvalidValue {
                value_type: self.value_type().or(other.value_type()).unwrap_or(ValueType::String),
                text: format!("{} is not comparable to {}", self, other),
            }),
        }
    }
}
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::String(s) => write!(f, "{}", s),
            Value::Null => write!(f, "null"),
        }
    }
}
impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}
impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Decimal(d)
    }
}
impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}
impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}
