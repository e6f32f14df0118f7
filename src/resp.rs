//! RESP2 protocol codec.
//!
//! The parser is incremental: callers accumulate bytes in a buffer and
//! retry; `Ok(None)` means a frame is not complete yet. Serialization
//! writes [`Value`]s and errors straight into the output buffer.

use crate::error::{RedisError, RedisResult};
use crate::types::Value;

/// Largest accepted bulk-string payload (the Redis proto limit).
const MAX_BULK_LEN: i64 = 512 * 1024 * 1024;
/// Largest accepted multibulk element count.
const MAX_ARRAY_LEN: i64 = 1024 * 1024;

/// One parsed RESP2 frame.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum Frame {
    Simple(String),
    Error(String),
    Integer(i64),
    Bulk(Vec<u8>),
    Null,
    Array(Vec<Frame>),
    NullArray,
}

impl Frame {
    /// Attempts to parse one frame from the front of `buf`.
    ///
    /// Returns the frame and the number of bytes it occupied, or
    /// `Ok(None)` when the buffer does not yet hold a complete frame.
    pub fn parse(buf: &[u8]) -> RedisResult<Option<(Frame, usize)>> {
        parse_at(buf, 0)
    }
}

fn parse_at(buf: &[u8], pos: usize) -> RedisResult<Option<(Frame, usize)>> {
    let Some(&kind) = buf.get(pos) else {
        return Ok(None);
    };
    match kind {
        b'+' => parse_line(buf, pos + 1, |line| {
            Ok(Frame::Simple(String::from_utf8_lossy(line).into_owned()))
        }),
        b'-' => parse_line(buf, pos + 1, |line| {
            Ok(Frame::Error(String::from_utf8_lossy(line).into_owned()))
        }),
        b':' => parse_line(buf, pos + 1, |line| Ok(Frame::Integer(parse_int(line)?))),
        b'$' => parse_bulk(buf, pos + 1),
        b'*' => parse_array(buf, pos + 1),
        other => Err(RedisError::Protocol(format!(
            "expected '$', '*', '+', '-' or ':', got '{}'",
            other as char
        ))),
    }
}

fn parse_line<F>(buf: &[u8], start: usize, build: F) -> RedisResult<Option<(Frame, usize)>>
where
    F: FnOnce(&[u8]) -> RedisResult<Frame>,
{
    match find_line(buf, start)? {
        Some((line, end)) => Ok(Some((build(line)?, end))),
        None => Ok(None),
    }
}

fn parse_bulk(buf: &[u8], start: usize) -> RedisResult<Option<(Frame, usize)>> {
    let Some((line, body_start)) = find_line(buf, start)? else {
        return Ok(None);
    };
    let len = parse_int(line)?;
    if len == -1 {
        return Ok(Some((Frame::Null, body_start)));
    }
    if len < 0 || len > MAX_BULK_LEN {
        return Err(RedisError::Protocol("invalid bulk length".to_string()));
    }
    let len = len as usize;
    let end = body_start + len + 2;
    if buf.len() < end {
        return Ok(None);
    }
    if &buf[body_start + len..end] != b"\r\n" {
        return Err(RedisError::Protocol(
            "bulk string missing CRLF terminator".to_string(),
        ));
    }
    Ok(Some((
        Frame::Bulk(buf[body_start..body_start + len].to_vec()),
        end,
    )))
}

fn parse_array(buf: &[u8], start: usize) -> RedisResult<Option<(Frame, usize)>> {
    let Some((line, mut pos)) = find_line(buf, start)? else {
        return Ok(None);
    };
    let count = parse_int(line)?;
    if count == -1 {
        return Ok(Some((Frame::NullArray, pos)));
    }
    if count < 0 || count > MAX_ARRAY_LEN {
        return Err(RedisError::Protocol("invalid multibulk length".to_string()));
    }
    let mut items = Vec::with_capacity(count as usize);
    for _ in 0..count {
        match parse_at(buf, pos)? {
            Some((frame, end)) => {
                items.push(frame);
                pos = end;
            }
            None => return Ok(None),
        }
    }
    Ok(Some((Frame::Array(items), pos)))
}

/// Finds the `\r\n`-terminated line starting at `start`; returns the line
/// body and the position just past the terminator.
fn find_line(buf: &[u8], start: usize) -> RedisResult<Option<(&[u8], usize)>> {
    let mut i = start;
    while i < buf.len() {
        if buf[i] == b'\r' {
            return match buf.get(i + 1) {
                Some(b'\n') => Ok(Some((&buf[start..i], i + 2))),
                Some(_) => Err(RedisError::Protocol("expected LF after CR".to_string())),
                None => Ok(None),
            };
        }
        if buf[i] == b'\n' {
            return Err(RedisError::Protocol("unexpected bare LF".to_string()));
        }
        i += 1;
    }
    Ok(None)
}

fn parse_int(line: &[u8]) -> RedisResult<i64> {
    std::str::from_utf8(line)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| RedisError::Protocol("invalid integer".to_string()))
}

/// Extracts `(NAME, args)` from a command frame: an array of bulk
/// strings whose first element is the case-insensitive command name.
pub fn frame_to_command(frame: Frame) -> RedisResult<(String, Vec<Vec<u8>>)> {
    let items = match frame {
        Frame::Array(items) if !items.is_empty() => items,
        _ => {
            return Err(RedisError::Protocol(
                "expected non-empty array of bulk strings".to_string(),
            ))
        }
    };
    let mut parts = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Frame::Bulk(bytes) => parts.push(bytes),
            _ => {
                return Err(RedisError::Protocol(
                    "command arguments must be bulk strings".to_string(),
                ))
            }
        }
    }
    let name = String::from_utf8_lossy(&parts[0]).to_ascii_uppercase();
    parts.remove(0);
    Ok((name, parts))
}

/// Serializes a [`Value`] as its RESP2 reply.
pub fn write_value(out: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Okay => out.extend_from_slice(b"+OK\r\n"),
        Value::Int(n) => {
            out.push(b':');
            write_i64(out, *n);
            out.extend_from_slice(b"\r\n");
        }
        Value::String(bytes) => write_bulk(out, bytes),
        Value::Null => out.extend_from_slice(b"$-1\r\n"),
        Value::Array(items) => {
            out.push(b'*');
            write_i64(out, items.len() as i64);
            out.extend_from_slice(b"\r\n");
            for item in items {
                write_value(out, item);
            }
        }
        // RESP2 has no map type; field/value pairs flatten into an array.
        Value::Map(pairs) => {
            out.push(b'*');
            write_i64(out, (pairs.len() * 2) as i64);
            out.extend_from_slice(b"\r\n");
            for (field, value) in pairs {
                write_value(out, field);
                write_value(out, value);
            }
        }
    }
}

/// Serializes the header of an array reply whose elements the caller
/// writes next (used for EXEC result batches).
pub fn write_array_header(out: &mut Vec<u8>, len: usize) {
    out.push(b'*');
    write_i64(out, len as i64);
    out.extend_from_slice(b"\r\n");
}

/// Serializes a simple-string reply such as `+QUEUED`.
pub fn write_simple(out: &mut Vec<u8>, text: &str) {
    out.push(b'+');
    out.extend_from_slice(text.as_bytes());
    out.extend_from_slice(b"\r\n");
}

/// Serializes an error reply, preserving a `WRONGTYPE`/`NOAUTH`/`ERR`
/// class prefix verbatim and defaulting to `ERR` otherwise.
pub fn write_error(out: &mut Vec<u8>, error: &RedisError) {
    let msg = error.to_string();
    out.push(b'-');
    if !(msg.starts_with("WRONGTYPE") || msg.starts_with("NOAUTH") || msg.starts_with("ERR")) {
        out.extend_from_slice(b"ERR ");
    }
    // Error text must stay on one line.
    out.extend(msg.bytes().filter(|b| *b != b'\r' && *b != b'\n'));
    out.extend_from_slice(b"\r\n");
}

fn write_bulk(out: &mut Vec<u8>, bytes: &[u8]) {
    out.push(b'$');
    write_i64(out, bytes.len() as i64);
    out.extend_from_slice(b"\r\n");
    out.extend_from_slice(bytes);
    out.extend_from_slice(b"\r\n");
}

fn write_i64(out: &mut Vec<u8>, n: i64) {
    let mut buf = itoa::Buffer::new();
    out.extend_from_slice(buf.format(n).as_bytes());
}
