use std::fmt;

/// Declared type of a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Bool,
    String,
    Int,
    Uint,
    Float,
    StringList,
}

impl Kind {
    /// Short type name used in help output (`<int>`, `<string>`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::String => "string",
            Self::Int => "int",
            Self::Uint => "uint",
            Self::Float => "float",
            Self::StringList => "strings",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed flag value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    String(String),
    Int(i64),
    Uint(u64),
    Float(f64),
    StringList(Vec<String>),
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Self::Bool(_) => Kind::Bool,
            Self::String(_) => Kind::String,
            Self::Int(_) => Kind::Int,
            Self::Uint(_) => Kind::Uint,
            Self::Float(_) => Kind::Float,
            Self::StringList(_) => Kind::StringList,
        }
    }

    /// Convert `raw` into a value of `kind`.
    ///
    /// String lists split on `,`; use [`Value::append`] to accumulate
    /// repeated occurrences.
    pub(crate) fn parse(kind: Kind, raw: &str) -> Result<Self, String> {
        match kind {
            Kind::Bool => parse_bool(raw).map(Self::Bool),
            Kind::String => Ok(Self::String(raw.to_string())),
            Kind::Int => raw
                .trim()
                .parse::<i64>()
                .map(Self::Int)
                .map_err(|e| e.to_string()),
            Kind::Uint => raw
                .trim()
                .parse::<u64>()
                .map(Self::Uint)
                .map_err(|e| e.to_string()),
            Kind::Float => raw
                .trim()
                .parse::<f64>()
                .map(Self::Float)
                .map_err(|e| e.to_string()),
            Kind::StringList => Ok(Self::StringList(split_list(raw))),
        }
    }

    /// Extend a string list with the items of `other`. Other kinds are replaced.
    pub(crate) fn append(&mut self, other: Value) {
        match (self, other) {
            (Self::StringList(items), Self::StringList(more)) => items.extend(more),
            (slot, other) => *slot = other,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::String(v) => f.write_str(v),
            Self::Int(v) => write!(f, "{v}"),
            Self::Uint(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::StringList(v) => write!(f, "[{}]", v.join(",")),
        }
    }
}

fn parse_bool(raw: &str) -> Result<bool, String> {
    match raw.trim() {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        other => Err(format!("invalid boolean: {other:?}")),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split(',').map(|s| s.trim().to_string()).collect()
}

/// Rust types that can back a flag.
pub trait FlagValue: Sized {
    const KIND: Kind;

    fn into_value(self) -> Value;
    fn from_value(value: &Value) -> Option<Self>;
}

impl FlagValue for bool {
    const KIND: Kind = Kind::Bool;

    fn into_value(self) -> Value {
        Value::Bool(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl FlagValue for String {
    const KIND: Kind = Kind::String;

    fn into_value(self) -> Value {
        Value::String(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl FlagValue for i64 {
    const KIND: Kind = Kind::Int;

    fn into_value(self) -> Value {
        Value::Int(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl FlagValue for u64 {
    const KIND: Kind = Kind::Uint;

    fn into_value(self) -> Value {
        Value::Uint(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Uint(v) => Some(*v),
            _ => None,
        }
    }
}

impl FlagValue for f64 {
    const KIND: Kind = Kind::Float;

    fn into_value(self) -> Value {
        Value::Float(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl FlagValue for Vec<String> {
    const KIND: Kind = Kind::StringList;

    fn into_value(self) -> Value {
        Value::StringList(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::StringList(v) => Some(v.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_common_bool_spellings() {
        assert_eq!(Value::parse(Kind::Bool, "true"), Ok(Value::Bool(true)));
        assert_eq!(Value::parse(Kind::Bool, "F"), Ok(Value::Bool(false)));
        assert!(Value::parse(Kind::Bool, "yes").is_err());
    }

    #[test]
    fn parse_rejects_non_numeric_int() {
        let err = Value::parse(Kind::Int, "abc").unwrap_err();
        assert!(err.contains("invalid digit"), "unexpected: {err}");
        assert_eq!(Value::parse(Kind::Int, "-3"), Ok(Value::Int(-3)));
        assert!(Value::parse(Kind::Uint, "-3").is_err());
    }

    #[test]
    fn string_list_appends_and_splits() {
        let mut v = Value::parse(Kind::StringList, "a,b").unwrap();
        v.append(Value::parse(Kind::StringList, "c").unwrap());
        assert_eq!(
            v,
            Value::StringList(vec!["a".into(), "b".into(), "c".into()])
        );
        assert_eq!(v.to_string(), "[a,b,c]");
    }
}
