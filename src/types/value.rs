/// A reply produced by the command engine.
///
/// Each variant is one of the reply forms the engine actually returns;
/// [`crate::resp::write_value`] maps them one-to-one onto RESP2 frames.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Nil (`$-1` on the wire): missing key, empty pop, or a SET skipped
    /// by NX/XX.
    Null,
    /// Integer reply (`:n`): lengths, counts, TTLs, and 0/1 flags.
    Int(i64),
    /// Bulk string (`$<len>`), byte-exact.
    String(Vec<u8>),
    /// Multi-bulk reply (`*<n>`): MGET/LRANGE/SMEMBERS/KEYS results.
    Array(Vec<Value>),
    /// Field/value pairs from HGETALL; flattened to a multi-bulk on the
    /// wire, exposed as a map in-process.
    Map(Vec<(Value, Value)>),
    /// The `+OK` status reply.
    Okay,
}

impl Value {
    /// The bulk-string-or-nil shape of GET/LPOP/RPOP/HGET replies.
    pub fn bulk_or_nil(bytes: Option<Vec<u8>>) -> Value {
        match bytes {
            Some(bytes) => Value::String(bytes),
            None => Value::Null,
        }
    }

    /// The array-of-bulk-strings shape of LRANGE/SMEMBERS/KEYS replies.
    pub fn bulk_array(items: Vec<Vec<u8>>) -> Value {
        Value::Array(items.into_iter().map(Value::String).collect())
    }

    /// The field/value map shape of HGETALL replies.
    pub fn pair_map(pairs: Vec<(Vec<u8>, Vec<u8>)>) -> Value {
        Value::Map(
            pairs
                .into_iter()
                .map(|(field, value)| (Value::String(field), Value::String(value)))
                .collect(),
        )
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s.into_bytes())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::String(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => Value::Null,
        }
    }
}
