use thiserror::Error;

/// Error type for all store operations.
///
/// The `Display` rendering of each variant is the message written to the
/// wire, so the Redis error classes (`WRONGTYPE`, `NOAUTH`, `ERR`) must
/// stay in the text verbatim.
#[derive(Error, Debug)]
#[allow(missing_docs)]
pub enum RedisError {
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,

    #[error("NOAUTH Authentication required.")]
    NoAuth,

    #[error("ERR invalid password")]
    InvalidPassword,

    #[error("ERR Client sent AUTH, but no password is set")]
    AuthNotConfigured,

    #[error("ERR wrong number of arguments for '{0}' command")]
    WrongArity(String),

    #[error("ERR unknown command '{0}'")]
    UnknownCommand(String),

    #[error("ERR MULTI calls can not be nested")]
    NestedMulti,

    #[error("ERR EXEC without MULTI")]
    ExecWithoutMulti,

    #[error("ERR DISCARD without MULTI")]
    DiscardWithoutMulti,

    #[error("ERR value is not an integer or out of range")]
    NotAnInteger,

    #[error("ERR timeout is not an integer or out of range")]
    InvalidTimeout,

    #[error("ERR Protocol error: {0}")]
    Protocol(String),

    #[error("Cannot parse value")]
    ParseError,

    #[error("ERR database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("ERR io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ERR {0}")]
    Unknown(String),
}

impl RedisError {
    /// Whether this error must abort a whole EXEC batch.
    ///
    /// Logic-level failures (wrong type, bad arity, unknown command) are
    /// captured in the failing command's result slot and the batch keeps
    /// going; a failure at the SQL or I/O layer rolls the transaction back
    /// and becomes the error of the batch itself.
    pub fn aborts_batch(&self) -> bool {
        matches!(self, RedisError::Sqlite(_) | RedisError::Io(_))
    }
}

/// A specialized `Result` type for store operations.
pub type RedisResult<T> = Result<T, RedisError>;
