//! Trait for converting returned values into Rust types.

use std::collections::HashMap;

use super::Value;
use crate::error::{RedisError, RedisResult};

/// A trait for converting returned [`Value`]s into Rust types.
///
/// # Implementors
///
/// - `String`: Converts from byte strings and integers
/// - `Vec<u8>`: Converts from byte strings (raw bytes)
/// - `i64` and friends: Converts from integers and numeric strings
/// - `bool`: Converts from integers and non-empty strings
/// - `Option<T>`: Converts null to `None`, otherwise `Some(T)`
/// - `Vec<T>`: Converts from arrays (maps are flattened to `[k, v, ...]`)
/// - `HashMap<String, T>`: Converts from maps
/// - `Value`: Returns the value as-is
#[allow(missing_docs)]
pub trait FromRedisValue: Sized {
    fn from_redis_value(v: Value) -> RedisResult<Self>;
}

impl FromRedisValue for String {
    fn from_redis_value(v: Value) -> RedisResult<Self> {
        match v {
            Value::String(s) => String::from_utf8(s).map_err(|_| RedisError::ParseError),
            Value::Int(n) => Ok(n.to_string()),
            Value::Okay => Ok("OK".to_string()),
            Value::Null => Ok(String::new()),
            _ => Err(RedisError::ParseError),
        }
    }
}

impl FromRedisValue for Vec<u8> {
    fn from_redis_value(v: Value) -> RedisResult<Self> {
        match v {
            Value::String(s) => Ok(s),
            _ => Err(RedisError::ParseError),
        }
    }
}

impl FromRedisValue for i64 {
    fn from_redis_value(v: Value) -> RedisResult<Self> {
        match v {
            Value::Int(n) => Ok(n),
            Value::String(s) => String::from_utf8(s)
                .map_err(|_| RedisError::ParseError)?
                .parse::<i64>()
                .map_err(|_| RedisError::ParseError),
            _ => Err(RedisError::ParseError),
        }
    }
}

impl FromRedisValue for u64 {
    fn from_redis_value(v: Value) -> RedisResult<Self> {
        let n: i64 = FromRedisValue::from_redis_value(v)?;
        Ok(n as u64)
    }
}

impl FromRedisValue for isize {
    fn from_redis_value(v: Value) -> RedisResult<Self> {
        let n: i64 = FromRedisValue::from_redis_value(v)?;
        Ok(n as isize)
    }
}

impl FromRedisValue for usize {
    fn from_redis_value(v: Value) -> RedisResult<Self> {
        let n: i64 = FromRedisValue::from_redis_value(v)?;
        Ok(n as usize)
    }
}

impl FromRedisValue for bool {
    fn from_redis_value(v: Value) -> RedisResult<Self> {
        match v {
            Value::Int(n) => Ok(n != 0),
            Value::String(s) => Ok(!s.is_empty()),
            Value::Null => Ok(false),
            _ => Err(RedisError::ParseError),
        }
    }
}

impl FromRedisValue for () {
    fn from_redis_value(v: Value) -> RedisResult<Self> {
        match v {
            Value::Null | Value::Okay => Ok(()),
            _ => Err(RedisError::ParseError),
        }
    }
}

impl<T: FromRedisValue> FromRedisValue for Option<T> {
    fn from_redis_value(v: Value) -> RedisResult<Self> {
        match v {
            Value::Null => Ok(None),
            v => Ok(Some(T::from_redis_value(v)?)),
        }
    }
}

impl<T: FromRedisValue> FromRedisValue for Vec<T> {
    fn from_redis_value(v: Value) -> RedisResult<Self> {
        match v {
            Value::Array(items) => items.into_iter().map(T::from_redis_value).collect(),
            Value::Map(pairs) => pairs
                .into_iter()
                .flat_map(|(k, v)| [k, v])
                .map(T::from_redis_value)
                .collect(),
            Value::Null => Ok(Vec::new()),
            _ => Err(RedisError::ParseError),
        }
    }
}

impl<T: FromRedisValue> FromRedisValue for HashMap<String, T> {
    fn from_redis_value(v: Value) -> RedisResult<Self> {
        match v {
            Value::Map(pairs) => pairs
                .into_iter()
                .map(|(k, v)| Ok((String::from_redis_value(k)?, T::from_redis_value(v)?)))
                .collect(),
            Value::Null => Ok(HashMap::new()),
            _ => Err(RedisError::ParseError),
        }
    }
}

impl FromRedisValue for Value {
    fn from_redis_value(v: Value) -> RedisResult<Self> {
        Ok(v)
    }
}
