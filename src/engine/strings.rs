//! String commands.

use std::time::Duration;

use rusqlite::{named_params, Connection, OptionalExtension};

use super::keys::{self, KeyType};
use crate::error::RedisResult;
use crate::storage::TableNames;

/// Options accepted by SET.
///
/// `EX`/`PX` replace the key's expiry; without them a live expiry on the
/// existing key is preserved. `NX`/`XX` make the write conditional on the
/// key being absent/present.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetOptions {
    pub expire: Option<Duration>,
    pub nx: bool,
    pub xx: bool,
}

#[allow(missing_docs)]
impl SetOptions {
    pub fn ex(seconds: u64) -> Self {
        Self {
            expire: Some(Duration::from_secs(seconds)),
            ..Self::default()
        }
    }

    pub fn nx() -> Self {
        Self {
            nx: true,
            ..Self::default()
        }
    }

    pub fn xx() -> Self {
        Self {
            xx: true,
            ..Self::default()
        }
    }

    pub fn with_expire(mut self, expire: Duration) -> Self {
        self.expire = Some(expire);
        self
    }
}

/// SET: upserts the string row. Returns `false` when NX/XX skipped the
/// write.
pub fn set(
    conn: &Connection,
    t: &TableNames,
    key: &str,
    value: &[u8],
    opts: SetOptions,
    now: i64,
) -> RedisResult<bool> {
    keys::check_type(conn, t, key, KeyType::String, now)?;

    if opts.nx || opts.xx {
        let exists = live_row_exists(conn, t, key, now)?;
        if (opts.nx && exists) || (opts.xx && !exists) {
            return Ok(false);
        }
    }

    if let Some(expire) = opts.expire {
        let at = now + expire.as_millis() as i64;
        conn.execute(
            &format!(
                "INSERT INTO {s} (key, value, expiry) VALUES (:key, :value, :at) \
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, expiry = excluded.expiry",
                s = t.string
            ),
            named_params! { ":key": key, ":value": value, ":at": at },
        )?;
    } else {
        // Keep a live expiry across plain SET; an elapsed one means the
        // key no longer existed, so it is cleared.
        conn.execute(
            &format!(
                "INSERT INTO {s} (key, value, expiry) VALUES (:key, :value, NULL) \
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, \
                 expiry = CASE WHEN {s}.expiry IS NOT NULL AND {s}.expiry > :now \
                          THEN {s}.expiry ELSE NULL END",
                s = t.string
            ),
            named_params! { ":key": key, ":value": value, ":now": now },
        )?;
    }
    Ok(true)
}

/// GET: the value, or `None` when absent or expired.
pub fn get(conn: &Connection, t: &TableNames, key: &str, now: i64) -> RedisResult<Option<Vec<u8>>> {
    keys::check_type(conn, t, key, KeyType::String, now)?;
    fetch(conn, t, key, now)
}

/// MGET: one GET result per key; keys of another type yield `None`
/// instead of failing, matching Redis.
pub fn mget(
    conn: &Connection,
    t: &TableNames,
    keys_in: &[String],
    now: i64,
) -> RedisResult<Vec<Option<Vec<u8>>>> {
    let mut out = Vec::with_capacity(keys_in.len());
    for key in keys_in {
        out.push(fetch(conn, t, key, now)?);
    }
    Ok(out)
}

fn fetch(conn: &Connection, t: &TableNames, key: &str, now: i64) -> RedisResult<Option<Vec<u8>>> {
    let value = conn
        .query_row(
            &format!(
                "SELECT value FROM {s} \
                 WHERE key = :key AND (expiry IS NULL OR expiry > :now)",
                s = t.string
            ),
            named_params! { ":key": key, ":now": now },
            |row| row.get(0),
        )
        .optional()?;
    Ok(value)
}

fn live_row_exists(conn: &Connection, t: &TableNames, key: &str, now: i64) -> RedisResult<bool> {
    let hit: Option<i64> = conn
        .query_row(
            &format!(
                "SELECT 1 FROM {s} \
                 WHERE key = :key AND (expiry IS NULL OR expiry > :now)",
                s = t.string
            ),
            named_params! { ":key": key, ":now": now },
            |row| row.get(0),
        )
        .optional()?;
    Ok(hit.is_some())
}
