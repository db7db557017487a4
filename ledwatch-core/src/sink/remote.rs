//! Strip driven by a remote LED server over TCP
//!
//! The server owns the physical strip. Each command is one JSON object per
//! line:
//!
//! ```text
//! {"op":"set","index":5,"color":[0,8,0],"brightness":0.05}
//! {"op":"clear","index":5}
//! ```

use super::IndicatorSink;
use crate::color::Color;
use crate::error::{LedwatchError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// One command sent to the LED server
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum StripCommand {
    Set {
        index: usize,
        color: Color,
        brightness: f32,
    },
    Clear {
        index: usize,
    },
}

impl StripCommand {
    pub fn index(&self) -> usize {
        match self {
            StripCommand::Set { index, .. } | StripCommand::Clear { index } => *index,
        }
    }
}

/// Sink forwarding writes to a remote strip server.
///
/// The connection is established once at startup; an unreachable server at
/// that point is a startup failure. Later write failures are logged, the
/// connection is dropped, and the next write reconnects.
#[derive(Debug)]
pub struct RemoteSink {
    address: String,
    slots: usize,
    timeout: Duration,
    brightness: f32,
    stream: Mutex<Option<TcpStream>>,
}

impl RemoteSink {
    /// Connect to the strip server at `address`
    pub async fn connect(
        address: impl Into<String>,
        slots: usize,
        comms_timeout: Duration,
        brightness_percent: u8,
    ) -> Result<Self> {
        let address = address.into();
        let stream = open(&address, comms_timeout)
            .await
            .map_err(|reason| LedwatchError::SinkUnavailable(format!("{}: {}", address, reason)))?;

        info!("Connected to LED server at {}", address);

        Ok(Self {
            address,
            slots,
            timeout: comms_timeout,
            brightness: f32::from(brightness_percent.min(100)) / 100.0,
            stream: Mutex::new(Some(stream)),
        })
    }

    async fn send(&self, command: StripCommand) {
        if command.index() >= self.slots {
            warn!(
                "Ignoring write to slot {} on a strip with {} slots",
                command.index(),
                self.slots
            );
            return;
        }

        let mut line = match serde_json::to_vec(&command) {
            Ok(line) => line,
            Err(e) => {
                warn!("Failed to encode strip command: {}", e);
                return;
            }
        };
        line.push(b'\n');

        let mut guard = self.stream.lock().await;

        if guard.as_ref().is_some_and(|stream| !is_open(stream)) {
            debug!("LED server {} closed the connection", self.address);
            *guard = None;
        }

        // A write that fails on a stale connection is resent once on a fresh one
        for attempt in 1..=2 {
            if guard.is_none() {
                match open(&self.address, self.timeout).await {
                    Ok(stream) => {
                        debug!("Reconnected to LED server at {}", self.address);
                        *guard = Some(stream);
                    }
                    Err(reason) => {
                        warn!(
                            "LED server {} unavailable, dropping write: {}",
                            self.address, reason
                        );
                        return;
                    }
                }
            }
            let Some(stream) = guard.as_mut() else {
                return;
            };

            match write_line(stream, &line, self.timeout).await {
                Ok(()) => return,
                Err(reason) => {
                    warn!(
                        "Write to LED server {} failed (attempt {}/2): {}",
                        self.address, attempt, reason
                    );
                    *guard = None;
                }
            }
        }
    }
}

/// False once the server has closed its end of the connection
fn is_open(stream: &TcpStream) -> bool {
    let mut buf = [0u8; 64];
    loop {
        match stream.try_read(&mut buf) {
            Ok(0) => return false,
            // The server has nothing to say; anything it sends is discarded
            Ok(_) => continue,
            Err(e) if e.kind() == ErrorKind::WouldBlock => return true,
            Err(_) => return false,
        }
    }
}

async fn write_line(
    stream: &mut TcpStream,
    line: &[u8],
    comms_timeout: Duration,
) -> std::result::Result<(), String> {
    let written = timeout(comms_timeout, async {
        stream.write_all(line).await?;
        stream.flush().await
    })
    .await;

    match written {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err(format!("timed out after {:?}", comms_timeout)),
    }
}

async fn open(address: &str, comms_timeout: Duration) -> std::result::Result<TcpStream, String> {
    match timeout(comms_timeout, TcpStream::connect(address)).await {
        Ok(Ok(stream)) => Ok(stream),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err(format!("connect timed out after {:?}", comms_timeout)),
    }
}

#[async_trait]
impl IndicatorSink for RemoteSink {
    fn slot_count(&self) -> usize {
        self.slots
    }

    async fn set_pixel(&self, index: usize, color: Color) {
        self.send(StripCommand::Set {
            index,
            color,
            brightness: self.brightness,
        })
        .await;
    }

    async fn clear(&self, index: usize) {
        self.send(StripCommand::Clear { index }).await;
    }
}
