/// A parameter value bound into a query expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Text(String),
    Null,
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Option<i64>> for Value {
    fn from(v: Option<i64>) -> Self {
        match v {
            Some(v) => Value::Integer(v),
            None => Value::Null,
        }
    }
}

/// A named parameter: a single value or a list to expand in place.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    One(Value),
    Many(Vec<Value>),
}

/// Parameter bindings attached to a query expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Params {
    /// No parameters; the SQL must carry no placeholders.
    None,
    /// Values bound in order to `?` placeholders.
    Positional(Vec<Value>),
    /// Values bound by name to `:name` placeholders.
    Named(Vec<(String, ParamValue)>),
}
