//! Set commands.

use rusqlite::{named_params, Connection, OptionalExtension};

use super::keys::{self, KeyType};
use crate::error::RedisResult;
use crate::storage::TableNames;

/// SADD: insert-or-ignore each member, returning the number newly added.
pub fn sadd(
    conn: &Connection,
    t: &TableNames,
    key: &str,
    members: &[Vec<u8>],
    now: i64,
) -> RedisResult<i64> {
    keys::check_type(conn, t, key, KeyType::Set, now)?;
    keys::purge_dead(conn, &t.set, key, now)?;

    let expiry = keys::current_expiry(conn, &t.set, key, now)?;
    let mut added = 0;
    for member in members {
        added += conn.execute(
            &format!(
                "INSERT OR IGNORE INTO {s} (key, member, expiry) VALUES (:key, :member, :expiry)",
                s = t.set
            ),
            named_params! { ":key": key, ":member": member, ":expiry": expiry },
        )? as i64;
    }
    Ok(added)
}

/// SREM: deletes the named members, returning the count actually removed.
pub fn srem(
    conn: &Connection,
    t: &TableNames,
    key: &str,
    members: &[Vec<u8>],
    now: i64,
) -> RedisResult<i64> {
    keys::check_type(conn, t, key, KeyType::Set, now)?;
    let mut removed = 0;
    for member in members {
        removed += conn.execute(
            &format!(
                "DELETE FROM {s} \
                 WHERE key = :key AND member = :member AND (expiry IS NULL OR expiry > :now)",
                s = t.set
            ),
            named_params! { ":key": key, ":member": member, ":now": now },
        )? as i64;
    }
    Ok(removed)
}

/// SISMEMBER: whether the member is live in the set.
pub fn sismember(
    conn: &Connection,
    t: &TableNames,
    key: &str,
    member: &[u8],
    now: i64,
) -> RedisResult<bool> {
    keys::check_type(conn, t, key, KeyType::Set, now)?;
    let hit: Option<i64> = conn
        .query_row(
            &format!(
                "SELECT 1 FROM {s} \
                 WHERE key = :key AND member = :member AND (expiry IS NULL OR expiry > :now)",
                s = t.set
            ),
            named_params! { ":key": key, ":member": member, ":now": now },
            |row| row.get(0),
        )
        .optional()?;
    Ok(hit.is_some())
}

/// SMEMBERS: all live members ordered ascending by member bytes.
pub fn smembers(
    conn: &Connection,
    t: &TableNames,
    key: &str,
    now: i64,
) -> RedisResult<Vec<Vec<u8>>> {
    keys::check_type(conn, t, key, KeyType::Set, now)?;
    let mut stmt = conn.prepare(&format!(
        "SELECT member FROM {s} \
         WHERE key = :key AND (expiry IS NULL OR expiry > :now) \
         ORDER BY member ASC",
        s = t.set
    ))?;
    let rows = stmt.query_map(named_params! { ":key": key, ":now": now }, |row| {
        row.get::<_, Vec<u8>>(0)
    })?;
    rows.map(|r| r.map_err(Into::into)).collect()
}
