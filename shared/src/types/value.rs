//! Typed value carried by a `Point` or an `Aux`.

/// One of the four value kinds a record can carry.
///
/// On the wire each kind has its own optional field; `Value` is the view
/// producers and consumers use so that only one of them is ever set.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Float(f64),
    Integer(i64),
    /// Raw bytes, no text encoding enforced
    String(Vec<u8>),
    Boolean(bool),
}

impl Value {
    /// Value slots in wire order: float, integer, string, boolean.
    pub(crate) fn into_slots(
        value: Option<Value>,
    ) -> (Option<f64>, Option<i64>, Option<Vec<u8>>, Option<bool>) {
        match value {
            None => (None, None, None, None),
            Some(Value::Float(v)) => (Some(v), None, None, None),
            Some(Value::Integer(v)) => (None, Some(v), None, None),
            Some(Value::String(v)) => (None, None, Some(v), None),
            Some(Value::Boolean(v)) => (None, None, None, Some(v)),
        }
    }

    /// First present slot in wire order.
    pub(crate) fn from_slots(
        float: Option<f64>,
        integer: Option<i64>,
        string: Option<&[u8]>,
        boolean: Option<bool>,
    ) -> Option<Value> {
        float
            .map(Value::Float)
            .or_else(|| integer.map(Value::Integer))
            .or_else(|| string.map(|s| Value::String(s.to_vec())))
            .or_else(|| boolean.map(Value::Boolean))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.as_bytes().to_vec())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v.into_bytes())
    }
}
