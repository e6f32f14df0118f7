//! In-process client over the command engine.

use crate::engine::{Engine, SetOptions};
use crate::error::RedisResult;
use crate::storage::StorageConfig;
use crate::txn::BufferedCommand;
use crate::types::{FromRedisValue, ToRedisArgs, Value};

/// A client for executing commands against the SQLite-backed store,
/// without going through the wire protocol.
///
/// # Example
///
/// ```rust,no_run
/// use redlite::{Client, StorageConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = Client::open(StorageConfig::new()).await?;
///
///     client.set("user:1:name", "Alice").await?;
///     let name: Option<String> = client.get("user:1:name").await?;
///
///     client.hset("user:1", "email", "alice@example.com").await?;
///     let email: Option<String> = client.hget("user:1", "email").await?;
///
///     client.expire("user:1", 60).await?;
///     let ttl = client.ttl("user:1").await?;
///     assert!(ttl > 0);
///
///     let _ = name;
///     let _ = email;
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Client {
    engine: Engine,
}

#[allow(missing_docs)]
impl Client {
    /// Opens a database per `config` and starts the expiry reaper.
    pub async fn open(config: StorageConfig) -> RedisResult<Self> {
        Ok(Self {
            engine: Engine::open(config).await?,
        })
    }

    /// Wraps an existing engine, sharing its database and reaper.
    pub fn with_engine(engine: Engine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Stops the background reaper.
    pub fn close(&self) {
        self.engine.close();
    }

    /// Starts buffering commands for a MULTI/EXEC batch.
    pub fn multi(&self) -> Pipeline {
        Pipeline::new(self.engine.clone())
    }

    // String commands

    pub async fn set<K, V>(&self, key: K, value: V) -> RedisResult<()>
    where
        K: ToRedisArgs,
        V: ToRedisArgs,
    {
        self.engine
            .execute("SET", vec![one_arg(&key), one_arg(&value)])
            .await?;
        Ok(())
    }

    /// SET with `EX`/`PX`/`NX`/`XX` options. Returns whether the write
    /// happened (`false` when NX/XX skipped it).
    pub async fn set_options<K, V>(&self, key: K, value: V, options: SetOptions) -> RedisResult<bool>
    where
        K: ToRedisArgs,
        V: ToRedisArgs,
    {
        let mut args = vec![one_arg(&key), one_arg(&value)];
        if let Some(expire) = options.expire {
            args.push(b"PX".to_vec());
            args.push(expire.as_millis().to_string().into_bytes());
        }
        if options.nx {
            args.push(b"NX".to_vec());
        }
        if options.xx {
            args.push(b"XX".to_vec());
        }
        Ok(self.engine.execute("SET", args).await? == Value::Okay)
    }

    pub async fn get<K, RV>(&self, key: K) -> RedisResult<RV>
    where
        K: ToRedisArgs,
        RV: FromRedisValue,
    {
        let value = self.engine.execute("GET", vec![one_arg(&key)]).await?;
        RV::from_redis_value(value)
    }

    pub async fn mget<K, RV>(&self, keys: K) -> RedisResult<RV>
    where
        K: ToRedisArgs,
        RV: FromRedisValue,
    {
        let value = self.engine.execute("MGET", keys.to_redis_args()).await?;
        RV::from_redis_value(value)
    }

    // Key commands

    /// Deletes one or more keys; returns how many existed.
    pub async fn del<K: ToRedisArgs>(&self, keys: K) -> RedisResult<i64> {
        let value = self.engine.execute("DEL", keys.to_redis_args()).await?;
        i64::from_redis_value(value)
    }

    /// Counts how many of the given keys exist.
    pub async fn exists<K: ToRedisArgs>(&self, keys: K) -> RedisResult<i64> {
        let value = self.engine.execute("EXISTS", keys.to_redis_args()).await?;
        i64::from_redis_value(value)
    }

    /// Sets a time-to-live in seconds; returns whether a key was touched.
    pub async fn expire<K: ToRedisArgs>(&self, key: K, seconds: i64) -> RedisResult<bool> {
        let value = self
            .engine
            .execute("EXPIRE", vec![one_arg(&key), one_arg(&seconds)])
            .await?;
        bool::from_redis_value(value)
    }

    /// Clears a key's expiry; returns whether one was removed.
    pub async fn persist<K: ToRedisArgs>(&self, key: K) -> RedisResult<bool> {
        let value = self.engine.execute("PERSIST", vec![one_arg(&key)]).await?;
        bool::from_redis_value(value)
    }

    /// Remaining TTL in seconds: -1 without expiry, -2 when absent.
    pub async fn ttl<K: ToRedisArgs>(&self, key: K) -> RedisResult<i64> {
        let value = self.engine.execute("TTL", vec![one_arg(&key)]).await?;
        i64::from_redis_value(value)
    }

    /// Live keys matching a glob pattern, ascending.
    pub async fn keys<RV: FromRedisValue>(&self, pattern: &str) -> RedisResult<RV> {
        let value = self
            .engine
            .execute("KEYS", vec![pattern.as_bytes().to_vec()])
            .await?;
        RV::from_redis_value(value)
    }

    pub async fn dbsize(&self) -> RedisResult<i64> {
        let value = self.engine.execute("DBSIZE", Vec::new()).await?;
        i64::from_redis_value(value)
    }

    pub async fn flushdb(&self) -> RedisResult<()> {
        self.engine.execute("FLUSHDB", Vec::new()).await?;
        Ok(())
    }

    pub async fn ping(&self) -> RedisResult<String> {
        let value = self.engine.execute("PING", Vec::new()).await?;
        String::from_redis_value(value)
    }

    pub async fn echo<V: ToRedisArgs>(&self, msg: V) -> RedisResult<String> {
        let value = self.engine.execute("ECHO", vec![one_arg(&msg)]).await?;
        String::from_redis_value(value)
    }

    // List commands

    /// Pushes one or more values to the head; returns the new length.
    pub async fn lpush<K, V>(&self, key: K, values: V) -> RedisResult<i64>
    where
        K: ToRedisArgs,
        V: ToRedisArgs,
    {
        let mut args = vec![one_arg(&key)];
        values.write_redis_args(&mut args);
        let value = self.engine.execute("LPUSH", args).await?;
        i64::from_redis_value(value)
    }

    /// Pushes one or more values to the tail; returns the new length.
    pub async fn rpush<K, V>(&self, key: K, values: V) -> RedisResult<i64>
    where
        K: ToRedisArgs,
        V: ToRedisArgs,
    {
        let mut args = vec![one_arg(&key)];
        values.write_redis_args(&mut args);
        let value = self.engine.execute("RPUSH", args).await?;
        i64::from_redis_value(value)
    }

    pub async fn lpop<K, RV>(&self, key: K) -> RedisResult<RV>
    where
        K: ToRedisArgs,
        RV: FromRedisValue,
    {
        let value = self.engine.execute("LPOP", vec![one_arg(&key)]).await?;
        RV::from_redis_value(value)
    }

    pub async fn rpop<K, RV>(&self, key: K) -> RedisResult<RV>
    where
        K: ToRedisArgs,
        RV: FromRedisValue,
    {
        let value = self.engine.execute("RPOP", vec![one_arg(&key)]).await?;
        RV::from_redis_value(value)
    }

    pub async fn llen<K: ToRedisArgs>(&self, key: K) -> RedisResult<i64> {
        let value = self.engine.execute("LLEN", vec![one_arg(&key)]).await?;
        i64::from_redis_value(value)
    }

    /// Inclusive range with Redis negative-index semantics.
    pub async fn lrange<K, RV>(&self, key: K, start: i64, stop: i64) -> RedisResult<RV>
    where
        K: ToRedisArgs,
        RV: FromRedisValue,
    {
        let value = self
            .engine
            .execute(
                "LRANGE",
                vec![one_arg(&key), one_arg(&start), one_arg(&stop)],
            )
            .await?;
        RV::from_redis_value(value)
    }

    /// Atomically moves the tail of `src` to the head of `dst`.
    pub async fn rpoplpush<K, RV>(&self, src: K, dst: K) -> RedisResult<RV>
    where
        K: ToRedisArgs,
        RV: FromRedisValue,
    {
        let value = self
            .engine
            .execute("RPOPLPUSH", vec![one_arg(&src), one_arg(&dst)])
            .await?;
        RV::from_redis_value(value)
    }

    /// Blocking RPOPLPUSH: waits up to `timeout_secs` for data in `src`
    /// (0 waits forever). `None` on timeout.
    pub async fn brpoplpush<K: ToRedisArgs>(
        &self,
        src: K,
        dst: K,
        timeout_secs: u64,
    ) -> RedisResult<Option<Vec<u8>>> {
        let src = String::from_utf8_lossy(&one_arg(&src)).into_owned();
        let dst = String::from_utf8_lossy(&one_arg(&dst)).into_owned();
        self.engine.brpoplpush(&src, &dst, timeout_secs).await
    }

    // Hash commands

    /// Sets one hash field; returns 1 when the field is new.
    pub async fn hset<K, F, V>(&self, key: K, field: F, value: V) -> RedisResult<i64>
    where
        K: ToRedisArgs,
        F: ToRedisArgs,
        V: ToRedisArgs,
    {
        let value = self
            .engine
            .execute("HSET", vec![one_arg(&key), one_arg(&field), one_arg(&value)])
            .await?;
        i64::from_redis_value(value)
    }

    /// Sets several hash fields at once; returns how many were new.
    pub async fn hset_multi<K, F, V>(&self, key: K, pairs: &[(F, V)]) -> RedisResult<i64>
    where
        K: ToRedisArgs,
        F: ToRedisArgs,
        V: ToRedisArgs,
    {
        let mut args = vec![one_arg(&key)];
        for (field, value) in pairs {
            args.push(one_arg(field));
            args.push(one_arg(value));
        }
        let value = self.engine.execute("HSET", args).await?;
        i64::from_redis_value(value)
    }

    /// HMSET: the same write as [`Client::hset_multi`], classic reply.
    pub async fn hmset<K, F, V>(&self, key: K, pairs: &[(F, V)]) -> RedisResult<()>
    where
        K: ToRedisArgs,
        F: ToRedisArgs,
        V: ToRedisArgs,
    {
        self.hset_multi(key, pairs).await?;
        Ok(())
    }

    pub async fn hget<K, F, RV>(&self, key: K, field: F) -> RedisResult<RV>
    where
        K: ToRedisArgs,
        F: ToRedisArgs,
        RV: FromRedisValue,
    {
        let value = self
            .engine
            .execute("HGET", vec![one_arg(&key), one_arg(&field)])
            .await?;
        RV::from_redis_value(value)
    }

    pub async fn hgetall<K, RV>(&self, key: K) -> RedisResult<RV>
    where
        K: ToRedisArgs,
        RV: FromRedisValue,
    {
        let value = self.engine.execute("HGETALL", vec![one_arg(&key)]).await?;
        RV::from_redis_value(value)
    }

    /// One value (or nil) per requested field, preserving order.
    pub async fn hmget<K, F, RV>(&self, key: K, fields: F) -> RedisResult<RV>
    where
        K: ToRedisArgs,
        F: ToRedisArgs,
        RV: FromRedisValue,
    {
        let mut args = vec![one_arg(&key)];
        fields.write_redis_args(&mut args);
        let value = self.engine.execute("HMGET", args).await?;
        RV::from_redis_value(value)
    }

    /// Deletes hash fields; returns how many were actually removed.
    pub async fn hdel<K, F>(&self, key: K, fields: F) -> RedisResult<i64>
    where
        K: ToRedisArgs,
        F: ToRedisArgs,
    {
        let mut args = vec![one_arg(&key)];
        fields.write_redis_args(&mut args);
        let value = self.engine.execute("HDEL", args).await?;
        i64::from_redis_value(value)
    }

    // Set commands

    /// Adds members; returns how many were newly added.
    pub async fn sadd<K, V>(&self, key: K, members: V) -> RedisResult<i64>
    where
        K: ToRedisArgs,
        V: ToRedisArgs,
    {
        let mut args = vec![one_arg(&key)];
        members.write_redis_args(&mut args);
        let value = self.engine.execute("SADD", args).await?;
        i64::from_redis_value(value)
    }

    /// Removes members; returns how many were actually removed.
    pub async fn srem<K, V>(&self, key: K, members: V) -> RedisResult<i64>
    where
        K: ToRedisArgs,
        V: ToRedisArgs,
    {
        let mut args = vec![one_arg(&key)];
        members.write_redis_args(&mut args);
        let value = self.engine.execute("SREM", args).await?;
        i64::from_redis_value(value)
    }

    pub async fn sismember<K, V>(&self, key: K, member: V) -> RedisResult<bool>
    where
        K: ToRedisArgs,
        V: ToRedisArgs,
    {
        let value = self
            .engine
            .execute("SISMEMBER", vec![one_arg(&key), one_arg(&member)])
            .await?;
        bool::from_redis_value(value)
    }

    /// All live members, ordered ascending.
    pub async fn smembers<K, RV>(&self, key: K) -> RedisResult<RV>
    where
        K: ToRedisArgs,
        RV: FromRedisValue,
    {
        let value = self.engine.execute("SMEMBERS", vec![one_arg(&key)]).await?;
        RV::from_redis_value(value)
    }
}

/// A buffered MULTI/EXEC batch.
///
/// Commands queue in memory and materialize atomically when executed;
/// nothing is observable before that. [`Pipeline::exec`] keeps a result
/// slot per command so one wrong-typed command does not sink the batch;
/// [`Pipeline::exec_strict`] fails on the first command error instead.
pub struct Pipeline {
    engine: Engine,
    buffer: Vec<BufferedCommand>,
}

#[allow(missing_docs)]
impl Pipeline {
    fn new(engine: Engine) -> Self {
        Self {
            engine,
            buffer: Vec::new(),
        }
    }

    /// Queues an arbitrary command.
    pub fn cmd<A: ToRedisArgs>(&mut self, name: &str, args: A) -> &mut Self {
        self.push(name, args.to_redis_args())
    }

    pub fn set<K: ToRedisArgs, V: ToRedisArgs>(&mut self, key: K, value: V) -> &mut Self {
        self.push("SET", vec![one_arg(&key), one_arg(&value)])
    }

    pub fn get<K: ToRedisArgs>(&mut self, key: K) -> &mut Self {
        self.push("GET", vec![one_arg(&key)])
    }

    pub fn del<K: ToRedisArgs>(&mut self, keys: K) -> &mut Self {
        self.push("DEL", keys.to_redis_args())
    }

    pub fn expire<K: ToRedisArgs>(&mut self, key: K, seconds: i64) -> &mut Self {
        self.push("EXPIRE", vec![one_arg(&key), one_arg(&seconds)])
    }

    pub fn lpush<K: ToRedisArgs, V: ToRedisArgs>(&mut self, key: K, values: V) -> &mut Self {
        let mut args = vec![one_arg(&key)];
        values.write_redis_args(&mut args);
        self.push("LPUSH", args)
    }

    pub fn rpush<K: ToRedisArgs, V: ToRedisArgs>(&mut self, key: K, values: V) -> &mut Self {
        let mut args = vec![one_arg(&key)];
        values.write_redis_args(&mut args);
        self.push("RPUSH", args)
    }

    pub fn lrange<K: ToRedisArgs>(&mut self, key: K, start: i64, stop: i64) -> &mut Self {
        self.push(
            "LRANGE",
            vec![one_arg(&key), one_arg(&start), one_arg(&stop)],
        )
    }

    pub fn hset<K: ToRedisArgs, F: ToRedisArgs, V: ToRedisArgs>(
        &mut self,
        key: K,
        field: F,
        value: V,
    ) -> &mut Self {
        self.push("HSET", vec![one_arg(&key), one_arg(&field), one_arg(&value)])
    }

    pub fn hdel<K: ToRedisArgs, F: ToRedisArgs>(&mut self, key: K, fields: F) -> &mut Self {
        let mut args = vec![one_arg(&key)];
        fields.write_redis_args(&mut args);
        self.push("HDEL", args)
    }

    pub fn sadd<K: ToRedisArgs, V: ToRedisArgs>(&mut self, key: K, members: V) -> &mut Self {
        let mut args = vec![one_arg(&key)];
        members.write_redis_args(&mut args);
        self.push("SADD", args)
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Runs the batch inside one transaction, returning a result slot per
    /// command. Logic errors land in their slot; an SQL failure fails the
    /// whole call.
    pub async fn exec(self) -> RedisResult<Vec<RedisResult<Value>>> {
        self.engine.exec_batch(self.buffer).await
    }

    /// Runs the batch and fails on the first per-command error.
    pub async fn exec_strict(self) -> RedisResult<Vec<Value>> {
        self.engine
            .exec_batch(self.buffer)
            .await?
            .into_iter()
            .collect()
    }

    fn push(&mut self, name: &str, args: Vec<Vec<u8>>) -> &mut Self {
        self.buffer.push(BufferedCommand {
            name: name.to_ascii_uppercase(),
            args,
        });
        self
    }
}

fn one_arg<T: ToRedisArgs>(value: &T) -> Vec<u8> {
    value.to_redis_args().into_iter().next().unwrap_or_default()
}
