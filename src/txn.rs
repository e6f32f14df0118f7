//! MULTI/EXEC command buffering.
//!
//! One controller per calling context: per socket on the RESP server,
//! per pipeline for the in-process client. Buffered commands are not
//! observable until EXEC materializes them inside a single SQL
//! transaction.

use crate::error::{RedisError, RedisResult};

/// A command captured between MULTI and EXEC.
#[derive(Debug, Clone)]
pub struct BufferedCommand {
    /// Upper-cased command name.
    pub name: String,
    /// Raw byte-string arguments, exactly as received.
    pub args: Vec<Vec<u8>>,
}

/// Per-caller transaction state.
#[derive(Default)]
pub struct TxnController {
    buffer: Option<Vec<BufferedCommand>>,
}

impl TxnController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_buffering(&self) -> bool {
        self.buffer.is_some()
    }

    /// MULTI: enters buffering mode.
    pub fn begin(&mut self) -> RedisResult<()> {
        if self.buffer.is_some() {
            return Err(RedisError::NestedMulti);
        }
        self.buffer = Some(Vec::new());
        Ok(())
    }

    /// Appends a command to the buffer. Only valid while buffering.
    pub fn queue(&mut self, name: String, args: Vec<Vec<u8>>) {
        if let Some(buffer) = self.buffer.as_mut() {
            buffer.push(BufferedCommand { name, args });
        }
    }

    /// DISCARD: drops the buffer.
    pub fn discard(&mut self) -> RedisResult<()> {
        match self.buffer.take() {
            Some(_) => Ok(()),
            None => Err(RedisError::DiscardWithoutMulti),
        }
    }

    /// EXEC: hands the buffer to the caller and returns to normal mode.
    pub fn take(&mut self) -> RedisResult<Vec<BufferedCommand>> {
        self.buffer.take().ok_or(RedisError::ExecWithoutMulti)
    }
}
