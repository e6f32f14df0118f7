//! Hash commands.

use rusqlite::{named_params, Connection, OptionalExtension};

use super::keys::{self, KeyType};
use crate::error::RedisResult;
use crate::storage::TableNames;

/// HSET / HMSET write path: upserts each pair, returning how many fields
/// were newly added (replacements do not count).
pub fn hset(
    conn: &Connection,
    t: &TableNames,
    key: &str,
    pairs: &[(Vec<u8>, Vec<u8>)],
    now: i64,
) -> RedisResult<i64> {
    keys::check_type(conn, t, key, KeyType::Hash, now)?;
    keys::purge_dead(conn, &t.hash, key, now)?;

    let expiry = keys::current_expiry(conn, &t.hash, key, now)?;
    let mut added = 0;
    for (field, value) in pairs {
        let existed = field_exists(conn, t, key, field, now)?;
        conn.execute(
            &format!(
                "INSERT INTO {h} (key, field, value, expiry) \
                 VALUES (:key, :field, :value, :expiry) \
                 ON CONFLICT(key, field) DO UPDATE \
                 SET value = excluded.value, expiry = excluded.expiry",
                h = t.hash
            ),
            named_params! { ":key": key, ":field": field, ":value": value, ":expiry": expiry },
        )?;
        if !existed {
            added += 1;
        }
    }
    Ok(added)
}

/// HGET: the field's value, or `None`.
pub fn hget(
    conn: &Connection,
    t: &TableNames,
    key: &str,
    field: &[u8],
    now: i64,
) -> RedisResult<Option<Vec<u8>>> {
    keys::check_type(conn, t, key, KeyType::Hash, now)?;
    let value = conn
        .query_row(
            &format!(
                "SELECT value FROM {h} \
                 WHERE key = :key AND field = :field AND (expiry IS NULL OR expiry > :now)",
                h = t.hash
            ),
            named_params! { ":key": key, ":field": field, ":now": now },
            |row| row.get(0),
        )
        .optional()?;
    Ok(value)
}

/// HMGET: one value-or-`None` per requested field, in argument order.
pub fn hmget(
    conn: &Connection,
    t: &TableNames,
    key: &str,
    fields: &[Vec<u8>],
    now: i64,
) -> RedisResult<Vec<Option<Vec<u8>>>> {
    keys::check_type(conn, t, key, KeyType::Hash, now)?;
    let mut out = Vec::with_capacity(fields.len());
    for field in fields {
        let value = conn
            .query_row(
                &format!(
                    "SELECT value FROM {h} \
                     WHERE key = :key AND field = :field AND (expiry IS NULL OR expiry > :now)",
                    h = t.hash
                ),
                named_params! { ":key": key, ":field": field, ":now": now },
                |row| row.get(0),
            )
            .optional()?;
        out.push(value);
    }
    Ok(out)
}

/// HGETALL: every live field/value pair, ordered by field bytes.
pub fn hgetall(
    conn: &Connection,
    t: &TableNames,
    key: &str,
    now: i64,
) -> RedisResult<Vec<(Vec<u8>, Vec<u8>)>> {
    keys::check_type(conn, t, key, KeyType::Hash, now)?;
    let mut stmt = conn.prepare(&format!(
        "SELECT field, value FROM {h} \
         WHERE key = :key AND (expiry IS NULL OR expiry > :now) \
         ORDER BY field ASC",
        h = t.hash
    ))?;
    let rows = stmt.query_map(named_params! { ":key": key, ":now": now }, |row| {
        Ok((row.get(0)?, row.get(1)?))
    })?;
    rows.map(|r| r.map_err(Into::into)).collect()
}

/// HDEL: deletes the named fields, returning the count actually removed.
pub fn hdel(
    conn: &Connection,
    t: &TableNames,
    key: &str,
    fields: &[Vec<u8>],
    now: i64,
) -> RedisResult<i64> {
    keys::check_type(conn, t, key, KeyType::Hash, now)?;
    let mut removed = 0;
    for field in fields {
        removed += conn.execute(
            &format!(
                "DELETE FROM {h} \
                 WHERE key = :key AND field = :field AND (expiry IS NULL OR expiry > :now)",
                h = t.hash
            ),
            named_params! { ":key": key, ":field": field, ":now": now },
        )? as i64;
    }
    Ok(removed)
}

fn field_exists(
    conn: &Connection,
    t: &TableNames,
    key: &str,
    field: &[u8],
    now: i64,
) -> RedisResult<bool> {
    let hit: Option<i64> = conn
        .query_row(
            &format!(
                "SELECT 1 FROM {h} \
                 WHERE key = :key AND field = :field AND (expiry IS NULL OR expiry > :now)",
                h = t.hash
            ),
            named_params! { ":key": key, ":field": field, ":now": now },
            |row| row.get(0),
        )
        .optional()?;
    Ok(hit.is_some())
}
