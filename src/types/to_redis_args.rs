//! Trait for marshaling Rust values into command arguments.
//!
//! Engine commands take byte-string arguments, the same opaque bytes the
//! store writes to its BLOB columns, so marshaling goes straight to
//! `Vec<u8>` with no intermediate value type. Numbers and booleans are
//! rendered the way Redis clients put them on the wire: as decimal text
//! and `1`/`0`.

/// A trait for marshaling values into byte-string command arguments.
///
/// # Implementors
///
/// - `String`, `&str`: UTF-8 bytes
/// - `Vec<u8>`, `&[u8]`: raw bytes, unchanged
/// - `i64`, `u64`, `isize`, `usize`: decimal text
/// - `bool`: `1` or `0`
/// - `Option<T>`: `None` becomes an empty byte string
/// - `Vec<T>`, `&[T]`, `[T; N]`: one argument per element
/// - Pairs and triples: elements in order, for ad-hoc pipeline commands
pub trait ToRedisArgs {
    /// Appends this value's byte-string arguments to `out`.
    fn write_redis_args(&self, out: &mut Vec<Vec<u8>>);

    /// Collects the arguments into a fresh vector.
    fn to_redis_args(&self) -> Vec<Vec<u8>> {
        let mut out = Vec::new();
        self.write_redis_args(&mut out);
        out
    }
}

impl ToRedisArgs for String {
    fn write_redis_args(&self, out: &mut Vec<Vec<u8>>) {
        out.push(self.as_bytes().to_vec());
    }
}

impl ToRedisArgs for &str {
    fn write_redis_args(&self, out: &mut Vec<Vec<u8>>) {
        out.push(self.as_bytes().to_vec());
    }
}

impl ToRedisArgs for Vec<u8> {
    fn write_redis_args(&self, out: &mut Vec<Vec<u8>>) {
        out.push(self.clone());
    }
}

impl ToRedisArgs for &[u8] {
    fn write_redis_args(&self, out: &mut Vec<Vec<u8>>) {
        out.push(self.to_vec());
    }
}

macro_rules! int_args {
    ($($t:ty),*) => {
        $(impl ToRedisArgs for $t {
            fn write_redis_args(&self, out: &mut Vec<Vec<u8>>) {
                let mut buf = itoa::Buffer::new();
                out.push(buf.format(*self).as_bytes().to_vec());
            }
        })*
    };
}

int_args!(i64, u64, isize, usize);

impl ToRedisArgs for bool {
    fn write_redis_args(&self, out: &mut Vec<Vec<u8>>) {
        out.push(if *self { b"1".to_vec() } else { b"0".to_vec() });
    }
}

impl<T: ToRedisArgs> ToRedisArgs for Option<T> {
    fn write_redis_args(&self, out: &mut Vec<Vec<u8>>) {
        match self {
            Some(v) => v.write_redis_args(out),
            None => out.push(Vec::new()),
        }
    }
}

impl<T: ToRedisArgs> ToRedisArgs for Vec<T> {
    fn write_redis_args(&self, out: &mut Vec<Vec<u8>>) {
        for v in self {
            v.write_redis_args(out);
        }
    }
}

impl<T: ToRedisArgs> ToRedisArgs for &[T] {
    fn write_redis_args(&self, out: &mut Vec<Vec<u8>>) {
        for v in *self {
            v.write_redis_args(out);
        }
    }
}

impl<T: ToRedisArgs, const N: usize> ToRedisArgs for [T; N] {
    fn write_redis_args(&self, out: &mut Vec<Vec<u8>>) {
        for v in self {
            v.write_redis_args(out);
        }
    }
}

// Mixed-type pairs and triples cover ad-hoc Pipeline::cmd calls such as
// ("key", 100i64); wider tuples have no caller.
impl<A: ToRedisArgs, B: ToRedisArgs> ToRedisArgs for (A, B) {
    fn write_redis_args(&self, out: &mut Vec<Vec<u8>>) {
        self.0.write_redis_args(out);
        self.1.write_redis_args(out);
    }
}

impl<A: ToRedisArgs, B: ToRedisArgs, C: ToRedisArgs> ToRedisArgs for (A, B, C) {
    fn write_redis_args(&self, out: &mut Vec<Vec<u8>>) {
        self.0.write_redis_args(out);
        self.1.write_redis_args(out);
        self.2.write_redis_args(out);
    }
}
