//! Type conversion traits and value types for store operations.

pub mod from_redis_value;
pub mod to_redis_args;
pub mod value;

pub use from_redis_value::FromRedisValue;
pub use to_redis_args::ToRedisArgs;
pub use value::Value;
