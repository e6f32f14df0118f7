//! RESP TCP server.
//!
//! Accepts connections and gives each its own task holding the receive
//! buffer, authentication flag, and MULTI/EXEC state. Commands route
//! through the auth gate and transaction controller into the shared
//! [`Engine`].

use std::net::SocketAddr;

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use crate::engine::{dispatch, Engine};
use crate::error::{RedisError, RedisResult};
use crate::resp::{self, Frame};
use crate::storage::StorageConfig;
use crate::txn::TxnController;
use crate::types::Value;

/// Configuration for the RESP server.
#[derive(Debug, Clone)]
#[allow(missing_docs)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub storage: StorageConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6379,
            storage: StorageConfig::default(),
        }
    }
}

#[allow(missing_docs)]
impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_storage(mut self, storage: StorageConfig) -> Self {
        self.storage = storage;
        self
    }

    /// Reads host, port, database filename, and password from
    /// `REDIS_SQLITE_HOST` / `REDIS_SQLITE_PORT` / `REDIS_SQLITE_DB` /
    /// `REDIS_SQLITE_PASSWORD`; the table prefix comes through
    /// [`StorageConfig`]'s own environment handling.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(host) = std::env::var("REDIS_SQLITE_HOST") {
            config.host = host;
        }
        if let Ok(port) = std::env::var("REDIS_SQLITE_PORT") {
            match port.parse() {
                Ok(port) => config.port = port,
                Err(_) => warn!(%port, "ignoring unparseable REDIS_SQLITE_PORT"),
            }
        }
        if let Ok(filename) = std::env::var("REDIS_SQLITE_DB") {
            config.storage.filename = filename;
        }
        if let Ok(password) = std::env::var("REDIS_SQLITE_PASSWORD") {
            config.storage.password = Some(password);
        }
        config
    }
}

/// A bound RESP server ready to accept connections.
pub struct RespServer {
    engine: Engine,
    listener: TcpListener,
}

impl RespServer {
    /// Opens the engine and binds the listen socket.
    pub async fn bind(config: ServerConfig) -> RedisResult<Self> {
        let engine = Engine::open(config.storage).await?;
        let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
        info!(addr = %listener.local_addr()?, "listening");
        Ok(Self { engine, listener })
    }

    /// The bound address, useful when the configured port was 0.
    pub fn local_addr(&self) -> RedisResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// The engine backing this server.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Accept loop. Runs until the listener fails.
    pub async fn run(self) -> RedisResult<()> {
        loop {
            let (stream, addr) = self.listener.accept().await?;
            let engine = self.engine.clone();
            tokio::spawn(async move {
                debug!(%addr, "client connected");
                if let Err(e) = handle_connection(engine, stream).await {
                    debug!(%addr, error = %e, "connection error");
                }
                debug!(%addr, "client disconnected");
            });
        }
    }
}

/// Per-connection read/dispatch loop. Buffered MULTI state and the auth
/// flag live on this task's stack and die with the connection.
async fn handle_connection(engine: Engine, mut stream: TcpStream) -> RedisResult<()> {
    let mut buf = BytesMut::with_capacity(4 * 1024);
    let mut authenticated = !engine.requires_auth();
    let mut txn = TxnController::new();
    let mut out = Vec::new();

    loop {
        loop {
            let (frame, consumed) = match Frame::parse(&buf) {
                Ok(Some(parsed)) => parsed,
                Ok(None) => break,
                Err(e) => {
                    // Framing is unrecoverable; report and drop the
                    // connection like Redis does.
                    out.clear();
                    resp::write_error(&mut out, &e);
                    stream.write_all(&out).await?;
                    return Ok(());
                }
            };
            buf.advance(consumed);

            out.clear();
            let keep_open =
                handle_command(&engine, &mut authenticated, &mut txn, frame, &mut out).await;
            stream.write_all(&out).await?;
            if !keep_open {
                return Ok(());
            }
        }

        if stream.read_buf(&mut buf).await? == 0 {
            return Ok(());
        }
    }
}

/// Handles one parsed frame, appending the reply to `out`. Returns
/// `false` when the connection should close.
async fn handle_command(
    engine: &Engine,
    authenticated: &mut bool,
    txn: &mut TxnController,
    frame: Frame,
    out: &mut Vec<u8>,
) -> bool {
    let (name, args) = match resp::frame_to_command(frame) {
        Ok(parsed) => parsed,
        Err(e) => {
            resp::write_error(out, &e);
            return false;
        }
    };

    // Connection-level commands come before the auth gate.
    match name.as_str() {
        "QUIT" => {
            resp::write_simple(out, "OK");
            return false;
        }
        "AUTH" => {
            if args.len() != 1 {
                resp::write_error(out, &RedisError::WrongArity("auth".to_string()));
                return true;
            }
            let attempt = String::from_utf8_lossy(&args[0]).into_owned();
            match engine.verify_password(&attempt) {
                Ok(()) => {
                    *authenticated = true;
                    resp::write_simple(out, "OK");
                }
                Err(e) => resp::write_error(out, &e),
            }
            return true;
        }
        _ => {}
    }

    if !*authenticated {
        resp::write_error(out, &RedisError::NoAuth);
        return true;
    }

    match name.as_str() {
        "MULTI" => reply(out, txn.begin().map(|_| Value::Okay)),
        "DISCARD" => reply(out, txn.discard().map(|_| Value::Okay)),
        "EXEC" => match txn.take() {
            Err(e) => resp::write_error(out, &e),
            Ok(commands) => match engine.exec_batch(commands).await {
                Err(e) => resp::write_error(out, &e),
                Ok(results) => {
                    resp::write_array_header(out, results.len());
                    for result in &results {
                        match result {
                            Ok(value) => resp::write_value(out, value),
                            Err(e) => resp::write_error(out, e),
                        }
                    }
                }
            },
        },
        // Accepted for compatibility; the EXEC transaction already runs
        // serialized, so there is nothing to watch.
        "WATCH" | "UNWATCH" => resp::write_simple(out, "OK"),
        _ if txn.is_buffering() => match dispatch::check_arity(&name, args.len()) {
            Ok(()) => {
                txn.queue(name, args);
                resp::write_simple(out, "QUEUED");
            }
            Err(e) => resp::write_error(out, &e),
        },
        _ => reply(out, engine.execute(&name, args).await),
    }
    true
}

fn reply(out: &mut Vec<u8>, result: RedisResult<Value>) {
    match result {
        Ok(value) => resp::write_value(out, &value),
        Err(e) => resp::write_error(out, &e),
    }
}
