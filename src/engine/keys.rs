//! Key-namespace commands and cross-type bookkeeping.
//!
//! A key owns rows in at most one of the four stores. Every type-creating
//! write probes the other stores first and fails WRONGTYPE on a live
//! collision; reads carry the same probe so a GET against a list key
//! errors the way Redis does.

use std::collections::BTreeSet;

use glob_match::glob_match;
use rusqlite::{named_params, Connection, OptionalExtension};

use crate::error::{RedisError, RedisResult};
use crate::storage::TableNames;

/// Which store currently owns a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum KeyType {
    String,
    Hash,
    List,
    Set,
}

/// Looks up the owning store of `key`, considering only live rows.
pub fn type_of(
    conn: &Connection,
    t: &TableNames,
    key: &str,
    now: i64,
) -> RedisResult<Option<KeyType>> {
    let probes = [
        (&t.string, KeyType::String),
        (&t.hash, KeyType::Hash),
        (&t.list, KeyType::List),
        (&t.set, KeyType::Set),
    ];
    for (table, ty) in probes {
        let hit: Option<i64> = conn
            .query_row(
                &format!(
                    "SELECT 1 FROM {table} \
                     WHERE key = :key AND (expiry IS NULL OR expiry > :now) LIMIT 1"
                ),
                named_params! { ":key": key, ":now": now },
                |row| row.get(0),
            )
            .optional()?;
        if hit.is_some() {
            return Ok(Some(ty));
        }
    }
    Ok(None)
}

/// Fails WRONGTYPE when `key` is live in a store other than `want`.
pub fn check_type(
    conn: &Connection,
    t: &TableNames,
    key: &str,
    want: KeyType,
    now: i64,
) -> RedisResult<()> {
    match type_of(conn, t, key, now)? {
        Some(ty) if ty != want => Err(RedisError::WrongType),
        _ => Ok(()),
    }
}

/// Removes elapsed-but-unreaped rows for `key` from `table`.
///
/// Type-creating writes call this first so a dead hash field or list slot
/// cannot collide with, or be resurrected by, the fresh data.
pub fn purge_dead(conn: &Connection, table: &str, key: &str, now: i64) -> RedisResult<()> {
    conn.execute(
        &format!("DELETE FROM {table} WHERE key = :key AND expiry IS NOT NULL AND expiry <= :now"),
        named_params! { ":key": key, ":now": now },
    )?;
    Ok(())
}

/// The expiry shared by the live rows of `key` in `table`, if any.
///
/// Per-key expiry is uniform across rows, so any row's value stands for
/// the whole key; new rows must copy it.
pub fn current_expiry(
    conn: &Connection,
    table: &str,
    key: &str,
    now: i64,
) -> RedisResult<Option<i64>> {
    let expiry: Option<Option<i64>> = conn
        .query_row(
            &format!(
                "SELECT expiry FROM {table} \
                 WHERE key = :key AND (expiry IS NULL OR expiry > :now) LIMIT 1"
            ),
            named_params! { ":key": key, ":now": now },
            |row| row.get(0),
        )
        .optional()?;
    Ok(expiry.flatten())
}

fn table_for<'t>(t: &'t TableNames, ty: KeyType) -> &'t str {
    match ty {
        KeyType::String => &t.string,
        KeyType::Hash => &t.hash,
        KeyType::List => &t.list,
        KeyType::Set => &t.set,
    }
}

/// DEL: removes every row of each key in every store.
///
/// Returns the number of keys that were live before deletion; dead rows
/// are cleaned up but do not count.
pub fn del(conn: &Connection, t: &TableNames, keys: &[String], now: i64) -> RedisResult<i64> {
    let mut removed = 0;
    for key in keys {
        if type_of(conn, t, key, now)?.is_some() {
            removed += 1;
        }
        for table in t.all() {
            conn.execute(
                &format!("DELETE FROM {table} WHERE key = :key"),
                named_params! { ":key": key },
            )?;
        }
    }
    Ok(removed)
}

/// EXISTS: counts keys with any live row, counting repeats per argument.
pub fn exists(conn: &Connection, t: &TableNames, keys: &[String], now: i64) -> RedisResult<i64> {
    let mut found = 0;
    for key in keys {
        if type_of(conn, t, key, now)?.is_some() {
            found += 1;
        }
    }
    Ok(found)
}

/// EXPIRE: stamps `now + seconds` on every row of the owning store.
pub fn expire(
    conn: &Connection,
    t: &TableNames,
    key: &str,
    seconds: i64,
    now: i64,
) -> RedisResult<bool> {
    let Some(ty) = type_of(conn, t, key, now)? else {
        return Ok(false);
    };
    let at = now + seconds.saturating_mul(1000);
    let changed = conn.execute(
        &format!("UPDATE {} SET expiry = :at WHERE key = :key", table_for(t, ty)),
        named_params! { ":at": at, ":key": key },
    )?;
    Ok(changed > 0)
}

/// PERSIST: clears a live expiry; returns whether one was removed.
pub fn persist(conn: &Connection, t: &TableNames, key: &str, now: i64) -> RedisResult<bool> {
    let Some(ty) = type_of(conn, t, key, now)? else {
        return Ok(false);
    };
    let changed = conn.execute(
        &format!(
            "UPDATE {} SET expiry = NULL WHERE key = :key AND expiry IS NOT NULL",
            table_for(t, ty)
        ),
        named_params! { ":key": key },
    )?;
    Ok(changed > 0)
}

/// TTL in whole seconds rounded up; -2 when the key is absent, -1 when it
/// has no expiry.
pub fn ttl(conn: &Connection, t: &TableNames, key: &str, now: i64) -> RedisResult<i64> {
    let Some(ty) = type_of(conn, t, key, now)? else {
        return Ok(-2);
    };
    match current_expiry(conn, table_for(t, ty), key, now)? {
        None => Ok(-1),
        Some(at) => Ok((at - now + 999) / 1000),
    }
}

/// KEYS: live keys across all stores matching a glob pattern
/// (`*`, `?`, `[set]`), ascending.
pub fn keys_matching(
    conn: &Connection,
    t: &TableNames,
    pattern: &str,
    now: i64,
) -> RedisResult<Vec<String>> {
    let mut matched = BTreeSet::new();
    for table in t.all() {
        let mut stmt = conn.prepare(&format!(
            "SELECT DISTINCT key FROM {table} WHERE expiry IS NULL OR expiry > :now"
        ))?;
        let rows = stmt.query_map(named_params! { ":now": now }, |row| row.get::<_, String>(0))?;
        for key in rows {
            let key = key?;
            if glob_match(pattern, &key) {
                matched.insert(key);
            }
        }
    }
    Ok(matched.into_iter().collect())
}

/// DBSIZE: number of distinct live keys.
pub fn dbsize(conn: &Connection, t: &TableNames, now: i64) -> RedisResult<i64> {
    let mut total = 0i64;
    for table in t.all() {
        total += conn.query_row(
            &format!(
                "SELECT COUNT(DISTINCT key) FROM {table} WHERE expiry IS NULL OR expiry > :now"
            ),
            named_params! { ":now": now },
            |row| row.get::<_, i64>(0),
        )?;
    }
    Ok(total)
}

/// FLUSHDB / FLUSHALL: truncates all four stores.
pub fn flush(conn: &Connection, t: &TableNames) -> RedisResult<()> {
    for table in t.all() {
        conn.execute(&format!("DELETE FROM {table}"), [])?;
    }
    Ok(())
}
