//! List commands.
//!
//! Lists are rows `(key, idx, value, expiry)` with indices kept contiguous
//! in `[0, len)` after every operation; index 0 is the head.

use rusqlite::{named_params, Connection, OptionalExtension};

use super::keys::{self, KeyType};
use crate::error::RedisResult;
use crate::storage::TableNames;

/// LPUSH: each value in turn becomes the new head (LIFO), so the last
/// argument ends up at index 0. Returns the new length.
pub fn lpush(
    conn: &Connection,
    t: &TableNames,
    key: &str,
    values: &[Vec<u8>],
    now: i64,
) -> RedisResult<i64> {
    keys::check_type(conn, t, key, KeyType::List, now)?;
    keys::purge_dead(conn, &t.list, key, now)?;

    let n = values.len() as i64;
    shift_indices(conn, t, key, n)?;
    let expiry = keys::current_expiry(conn, &t.list, key, now)?;
    for (i, value) in values.iter().enumerate() {
        insert(conn, t, key, n - 1 - i as i64, value, expiry)?;
    }
    len(conn, t, key, now)
}

/// RPUSH: appends values at the tail in argument order. Returns the new
/// length.
pub fn rpush(
    conn: &Connection,
    t: &TableNames,
    key: &str,
    values: &[Vec<u8>],
    now: i64,
) -> RedisResult<i64> {
    keys::check_type(conn, t, key, KeyType::List, now)?;
    keys::purge_dead(conn, &t.list, key, now)?;

    let start = len(conn, t, key, now)?;
    let expiry = keys::current_expiry(conn, &t.list, key, now)?;
    for (i, value) in values.iter().enumerate() {
        insert(conn, t, key, start + i as i64, value, expiry)?;
    }
    len(conn, t, key, now)
}

/// LPOP: removes and returns the head, renumbering the survivors.
pub fn lpop(conn: &Connection, t: &TableNames, key: &str, now: i64) -> RedisResult<Option<Vec<u8>>> {
    keys::check_type(conn, t, key, KeyType::List, now)?;
    let Some((idx, value)) = end_row(conn, t, key, now, "ASC")? else {
        return Ok(None);
    };
    remove_at(conn, t, key, idx)?;
    shift_indices(conn, t, key, -1)?;
    Ok(Some(value))
}

/// RPOP: removes and returns the tail. No renumbering needed.
pub fn rpop(conn: &Connection, t: &TableNames, key: &str, now: i64) -> RedisResult<Option<Vec<u8>>> {
    keys::check_type(conn, t, key, KeyType::List, now)?;
    let Some((idx, value)) = end_row(conn, t, key, now, "DESC")? else {
        return Ok(None);
    };
    remove_at(conn, t, key, idx)?;
    Ok(Some(value))
}

/// LLEN: the list length, 0 when the key is absent.
pub fn llen(conn: &Connection, t: &TableNames, key: &str, now: i64) -> RedisResult<i64> {
    keys::check_type(conn, t, key, KeyType::List, now)?;
    len(conn, t, key, now)
}

/// LRANGE: inclusive range with Redis negative-index semantics.
pub fn lrange(
    conn: &Connection,
    t: &TableNames,
    key: &str,
    start: i64,
    stop: i64,
    now: i64,
) -> RedisResult<Vec<Vec<u8>>> {
    keys::check_type(conn, t, key, KeyType::List, now)?;
    let len = len(conn, t, key, now)?;
    if len == 0 {
        return Ok(Vec::new());
    }

    let mut start = if start < 0 { len + start } else { start };
    let mut stop = if stop < 0 { len + stop } else { stop };
    start = start.max(0);
    stop = stop.min(len - 1);
    if start > stop {
        return Ok(Vec::new());
    }

    let mut stmt = conn.prepare(&format!(
        "SELECT value FROM {l} \
         WHERE key = :key AND idx BETWEEN :start AND :stop \
           AND (expiry IS NULL OR expiry > :now) \
         ORDER BY idx ASC",
        l = t.list
    ))?;
    let rows = stmt.query_map(
        named_params! { ":key": key, ":start": start, ":stop": stop, ":now": now },
        |row| row.get::<_, Vec<u8>>(0),
    )?;
    rows.map(|r| r.map_err(Into::into)).collect()
}

/// RPOPLPUSH: moves the tail of `src` to the head of `dst` atomically.
///
/// Both type checks run before any write so that a wrong-typed `dst`
/// cannot leave `src` popped when the error is captured per-slot inside
/// an EXEC batch.
pub fn rpoplpush(
    conn: &Connection,
    t: &TableNames,
    src: &str,
    dst: &str,
    now: i64,
) -> RedisResult<Option<Vec<u8>>> {
    keys::check_type(conn, t, src, KeyType::List, now)?;
    keys::check_type(conn, t, dst, KeyType::List, now)?;
    let Some(value) = rpop(conn, t, src, now)? else {
        return Ok(None);
    };
    lpush(conn, t, dst, std::slice::from_ref(&value), now)?;
    Ok(Some(value))
}

fn len(conn: &Connection, t: &TableNames, key: &str, now: i64) -> RedisResult<i64> {
    let count = conn.query_row(
        &format!(
            "SELECT COUNT(*) FROM {l} \
             WHERE key = :key AND (expiry IS NULL OR expiry > :now)",
            l = t.list
        ),
        named_params! { ":key": key, ":now": now },
        |row| row.get(0),
    )?;
    Ok(count)
}

fn insert(
    conn: &Connection,
    t: &TableNames,
    key: &str,
    idx: i64,
    value: &[u8],
    expiry: Option<i64>,
) -> RedisResult<()> {
    conn.execute(
        &format!(
            "INSERT INTO {l} (key, idx, value, expiry) VALUES (:key, :idx, :value, :expiry)",
            l = t.list
        ),
        named_params! { ":key": key, ":idx": idx, ":value": value, ":expiry": expiry },
    )?;
    Ok(())
}

fn end_row(
    conn: &Connection,
    t: &TableNames,
    key: &str,
    now: i64,
    order: &str,
) -> RedisResult<Option<(i64, Vec<u8>)>> {
    let row = conn
        .query_row(
            &format!(
                "SELECT idx, value FROM {l} \
                 WHERE key = :key AND (expiry IS NULL OR expiry > :now) \
                 ORDER BY idx {order} LIMIT 1",
                l = t.list
            ),
            named_params! { ":key": key, ":now": now },
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    Ok(row)
}

fn remove_at(conn: &Connection, t: &TableNames, key: &str, idx: i64) -> RedisResult<()> {
    conn.execute(
        &format!("DELETE FROM {l} WHERE key = :key AND idx = :idx", l = t.list),
        named_params! { ":key": key, ":idx": idx },
    )?;
    Ok(())
}

/// Shifts every index of `key` by `delta`.
///
/// SQLite checks the `(key, idx)` primary key per updated row, so a
/// direct `idx = idx + :delta` can collide with a not-yet-updated
/// neighbor. The update goes through negative space (`-(x) - 1`, which
/// cannot clash with any real index) and is flipped back in a second
/// pass.
fn shift_indices(conn: &Connection, t: &TableNames, key: &str, delta: i64) -> RedisResult<()> {
    conn.execute(
        &format!(
            "UPDATE {l} SET idx = -(idx + :delta) - 1 WHERE key = :key",
            l = t.list
        ),
        named_params! { ":key": key, ":delta": delta },
    )?;
    conn.execute(
        &format!(
            "UPDATE {l} SET idx = -idx - 1 WHERE key = :key AND idx < 0",
            l = t.list
        ),
        named_params! { ":key": key },
    )?;
    Ok(())
}
