//! # redlite
//!
//! A Redis-compatible data store backed by SQLite.
//!
//! redlite speaks the Redis data model (strings, hashes, lists, sets with
//! TTLs) but delegates persistence and atomicity to an embedded SQLite
//! database. It carries enough of the command surface to back a
//! production job queue, and exposes two ways in: an in-process client
//! and a RESP2 TCP server that ordinary Redis clients can talk to.
//!
//! ## Features
//!
//! - **Durable**: data lives in a single SQLite file (or `:memory:`)
//! - **Transactional**: MULTI/EXEC batches run inside one SQL transaction
//! - **RESP-compatible**: wire framing and command semantics follow Redis
//! - **Embeddable**: use the [`Client`] directly, no server required
//!
//! ## Supported Commands
//!
//! - **Strings**: SET (with EX/PX/NX/XX), GET, MGET
//! - **Lists**: LPUSH, RPUSH, LPOP, RPOP, LLEN, LRANGE, RPOPLPUSH,
//!   BRPOPLPUSH
//! - **Hashes**: HSET, HMSET, HGET, HGETALL, HMGET, HDEL
//! - **Sets**: SADD, SREM, SISMEMBER, SMEMBERS
//! - **Keys**: DEL, EXISTS, EXPIRE, PERSIST, TTL, KEYS, DBSIZE, FLUSHDB,
//!   FLUSHALL
//! - **Transactions**: MULTI, EXEC, DISCARD (WATCH/UNWATCH are accepted
//!   no-ops; the EXEC transaction is already serialized by SQLite)
//! - **Connection**: AUTH, PING, ECHO, INFO, QUIT
//!
//! ## Example
//!
//! ```rust,no_run
//! use redlite::{Client, StorageConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::open(StorageConfig::new()).await?;
//!
//!     client.set("job:1", "pending").await?;
//!     let state: Option<String> = client.get("job:1").await?;
//!
//!     client.rpush("queue", "job:1").await?;
//!     let next: Option<String> = client.rpoplpush("queue", "active").await?;
//!
//!     let _ = (state, next);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

pub mod blocking;
pub mod client;
pub mod engine;
pub mod error;
pub mod resp;
pub mod server;
pub mod storage;
pub mod txn;
pub mod types;

pub use client::{Client, Pipeline};
pub use engine::{Engine, KeyType, SetOptions};
pub use error::{RedisError, RedisResult};
pub use resp::Frame;
pub use server::{RespServer, ServerConfig};
pub use storage::StorageConfig;
pub use types::{FromRedisValue, ToRedisArgs, Value};
