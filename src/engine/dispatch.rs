//! Command-name dispatch.
//!
//! Maps a parsed `(name, args)` pair onto the store operations. The same
//! function serves single commands (wrapped in their own transaction by
//! the engine) and EXEC batches (threaded through the batch transaction),
//! which is what makes MULTI/EXEC a thin loop.

use std::time::Duration;

use rusqlite::Connection;

use super::strings::SetOptions;
use super::{hashes, keys, lists, sets, strings};
use crate::error::{RedisError, RedisResult};
use crate::storage::TableNames;
use crate::types::Value;

/// Checks argument count for a (upper-cased) command name.
///
/// Used both before direct execution and at MULTI queue time, where this
/// is the only validation performed.
pub fn check_arity(name: &str, argc: usize) -> RedisResult<()> {
    let ok = match name {
        "MULTI" | "EXEC" | "DISCARD" | "UNWATCH" | "QUIT" | "FLUSHDB" | "FLUSHALL"
        | "DBSIZE" => argc == 0,
        "PING" | "INFO" => argc <= 1,
        "GET" | "LPOP" | "RPOP" | "LLEN" | "TTL" | "PERSIST" | "KEYS" | "SMEMBERS"
        | "HGETALL" | "ECHO" => argc == 1,
        "RPOPLPUSH" | "SISMEMBER" | "HGET" | "EXPIRE" => argc == 2,
        "LRANGE" | "BRPOPLPUSH" => argc == 3,
        "MGET" | "DEL" | "EXISTS" | "WATCH" => argc >= 1,
        "SET" => argc >= 2,
        "LPUSH" | "RPUSH" | "HDEL" | "SADD" | "SREM" | "HMGET" => argc >= 2,
        "HSET" | "HMSET" => argc >= 3 && argc % 2 == 1,
        _ => return Err(RedisError::UnknownCommand(name.to_string())),
    };
    if ok {
        Ok(())
    } else {
        Err(RedisError::WrongArity(name.to_ascii_lowercase()))
    }
}

/// Executes one command against the given connection (base connection or
/// an open transaction). `name` must already be upper-cased and
/// arity-checked.
pub fn dispatch(
    conn: &Connection,
    t: &TableNames,
    name: &str,
    args: &[Vec<u8>],
    now: i64,
) -> RedisResult<Value> {
    match name {
        "SET" => {
            let opts = parse_set_options(name, &args[2..])?;
            let written = strings::set(conn, t, &key_arg(args, 0), &args[1], opts, now)?;
            Ok(if written { Value::Okay } else { Value::Null })
        }
        "GET" => Ok(Value::bulk_or_nil(strings::get(
            conn,
            t,
            &key_arg(args, 0),
            now,
        )?)),
        "MGET" => {
            let keys_in = all_key_args(args);
            let values = strings::mget(conn, t, &keys_in, now)?;
            Ok(Value::Array(
                values.into_iter().map(Value::bulk_or_nil).collect(),
            ))
        }

        "LPUSH" => Ok(Value::Int(lists::lpush(
            conn,
            t,
            &key_arg(args, 0),
            &args[1..],
            now,
        )?)),
        "RPUSH" => Ok(Value::Int(lists::rpush(
            conn,
            t,
            &key_arg(args, 0),
            &args[1..],
            now,
        )?)),
        "LPOP" => Ok(Value::bulk_or_nil(lists::lpop(
            conn,
            t,
            &key_arg(args, 0),
            now,
        )?)),
        "RPOP" => Ok(Value::bulk_or_nil(lists::rpop(
            conn,
            t,
            &key_arg(args, 0),
            now,
        )?)),
        "LLEN" => Ok(Value::Int(lists::llen(conn, t, &key_arg(args, 0), now)?)),
        "LRANGE" => {
            let start = int_arg(args, 1)?;
            let stop = int_arg(args, 2)?;
            let values = lists::lrange(conn, t, &key_arg(args, 0), start, stop, now)?;
            Ok(Value::bulk_array(values))
        }
        "RPOPLPUSH" => Ok(Value::bulk_or_nil(lists::rpoplpush(
            conn,
            t,
            &key_arg(args, 0),
            &key_arg(args, 1),
            now,
        )?)),
        // Inside an EXEC batch a blocking pop cannot suspend; it degrades
        // to its non-blocking form, as in Redis.
        "BRPOPLPUSH" => {
            parse_timeout(args, 2)?;
            Ok(Value::bulk_or_nil(lists::rpoplpush(
                conn,
                t,
                &key_arg(args, 0),
                &key_arg(args, 1),
                now,
            )?))
        }

        "HSET" => Ok(Value::Int(hashes::hset(
            conn,
            t,
            &key_arg(args, 0),
            &pair_args(&args[1..]),
            now,
        )?)),
        "HMSET" => {
            hashes::hset(conn, t, &key_arg(args, 0), &pair_args(&args[1..]), now)?;
            Ok(Value::Okay)
        }
        "HGET" => Ok(Value::bulk_or_nil(hashes::hget(
            conn,
            t,
            &key_arg(args, 0),
            &args[1],
            now,
        )?)),
        "HMGET" => {
            let values = hashes::hmget(conn, t, &key_arg(args, 0), &args[1..], now)?;
            Ok(Value::Array(
                values.into_iter().map(Value::bulk_or_nil).collect(),
            ))
        }
        "HGETALL" => {
            let pairs = hashes::hgetall(conn, t, &key_arg(args, 0), now)?;
            Ok(Value::pair_map(pairs))
        }
        "HDEL" => Ok(Value::Int(hashes::hdel(
            conn,
            t,
            &key_arg(args, 0),
            &args[1..],
            now,
        )?)),

        "SADD" => Ok(Value::Int(sets::sadd(
            conn,
            t,
            &key_arg(args, 0),
            &args[1..],
            now,
        )?)),
        "SREM" => Ok(Value::Int(sets::srem(
            conn,
            t,
            &key_arg(args, 0),
            &args[1..],
            now,
        )?)),
        "SISMEMBER" => {
            let hit = sets::sismember(conn, t, &key_arg(args, 0), &args[1], now)?;
            Ok(Value::Int(hit as i64))
        }
        "SMEMBERS" => {
            let members = sets::smembers(conn, t, &key_arg(args, 0), now)?;
            Ok(Value::bulk_array(members))
        }

        "DEL" => Ok(Value::Int(keys::del(conn, t, &all_key_args(args), now)?)),
        "EXISTS" => Ok(Value::Int(keys::exists(
            conn,
            t,
            &all_key_args(args),
            now,
        )?)),
        "EXPIRE" => {
            let seconds = int_arg(args, 1)?;
            let set = keys::expire(conn, t, &key_arg(args, 0), seconds, now)?;
            Ok(Value::Int(set as i64))
        }
        "PERSIST" => {
            let cleared = keys::persist(conn, t, &key_arg(args, 0), now)?;
            Ok(Value::Int(cleared as i64))
        }
        "TTL" => Ok(Value::Int(keys::ttl(conn, t, &key_arg(args, 0), now)?)),
        "KEYS" => {
            let matched = keys::keys_matching(conn, t, &key_arg(args, 0), now)?;
            Ok(Value::bulk_array(
                matched.into_iter().map(String::into_bytes).collect(),
            ))
        }
        "DBSIZE" => Ok(Value::Int(keys::dbsize(conn, t, now)?)),
        "FLUSHDB" | "FLUSHALL" => {
            keys::flush(conn, t)?;
            Ok(Value::Okay)
        }

        "PING" => Ok(match args.first() {
            Some(msg) => Value::String(msg.clone()),
            None => Value::String(b"PONG".to_vec()),
        }),
        "ECHO" => Ok(Value::String(args[0].clone())),
        "INFO" => Ok(Value::String(info_text(conn, t, now)?.into_bytes())),
        "WATCH" | "UNWATCH" => Ok(Value::Okay),

        _ => Err(RedisError::UnknownCommand(name.to_string())),
    }
}

/// Which list key a successful command may have pushed to, for waking
/// blocked BRPOPLPUSH callers.
pub fn wake_target(name: &str, args: &[Vec<u8>]) -> Option<String> {
    match name {
        "LPUSH" | "RPUSH" => args.first().map(|k| key_str(k)),
        "RPOPLPUSH" | "BRPOPLPUSH" => args.get(1).map(|k| key_str(k)),
        _ => None,
    }
}

/// Parses the BRPOPLPUSH timeout argument (seconds, 0 = wait forever).
pub fn parse_timeout(args: &[Vec<u8>], i: usize) -> RedisResult<u64> {
    std::str::from_utf8(&args[i])
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or(RedisError::InvalidTimeout)
}

fn parse_set_options(name: &str, tail: &[Vec<u8>]) -> RedisResult<SetOptions> {
    let mut opts = SetOptions::default();
    let mut i = 0;
    while i < tail.len() {
        let flag = String::from_utf8_lossy(&tail[i]).to_ascii_uppercase();
        match flag.as_str() {
            "NX" => opts.nx = true,
            "XX" => opts.xx = true,
            "EX" | "PX" => {
                i += 1;
                let n = tail
                    .get(i)
                    .and_then(|raw| std::str::from_utf8(raw).ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .ok_or(RedisError::NotAnInteger)?;
                opts.expire = Some(if flag == "EX" {
                    Duration::from_secs(n)
                } else {
                    Duration::from_millis(n)
                });
            }
            _ => return Err(RedisError::WrongArity(name.to_ascii_lowercase())),
        }
        i += 1;
    }
    if opts.nx && opts.xx {
        return Err(RedisError::WrongArity(name.to_ascii_lowercase()));
    }
    Ok(opts)
}

fn info_text(conn: &Connection, t: &TableNames, now: i64) -> RedisResult<String> {
    let keys = keys::dbsize(conn, t, now)?;
    Ok(format!(
        "# Server\r\nredis_version:7.0.0\r\nredis_mode:standalone\r\n\
         # Keyspace\r\ndb0:keys={keys},expires=0,avg_ttl=0\r\n"
    ))
}

fn key_str(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

fn key_arg(args: &[Vec<u8>], i: usize) -> String {
    key_str(&args[i])
}

fn all_key_args(args: &[Vec<u8>]) -> Vec<String> {
    args.iter().map(|a| key_str(a)).collect()
}

fn int_arg(args: &[Vec<u8>], i: usize) -> RedisResult<i64> {
    std::str::from_utf8(&args[i])
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or(RedisError::NotAnInteger)
}

fn pair_args(tail: &[Vec<u8>]) -> Vec<(Vec<u8>, Vec<u8>)> {
    tail.chunks_exact(2)
        .map(|c| (c[0].clone(), c[1].clone()))
        .collect()
}
