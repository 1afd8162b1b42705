//! Framed connection over a TCP stream.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufStream};
use tokio::net::TcpStream;

use crate::store::StoreError;

/// Upper bound for a single frame, in bytes.
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// A buffered TCP stream carrying newline-delimited JSON frames.
#[derive(Debug)]
pub struct Connection {
    stream: BufStream<TcpStream>,
    line: String,
}

impl Connection {
    pub fn new(socket: TcpStream) -> Self {
        Self {
            stream: BufStream::new(socket),
            line: String::with_capacity(4 * 1024),
        }
    }

    /// Read the next frame. Returns `None` when the peer closed the connection
    /// cleanly between frames.
    pub async fn read_frame<T: DeserializeOwned>(&mut self) -> Result<Option<T>, StoreError> {
        self.line.clear();
        let n = (&mut self.stream)
            .take(MAX_FRAME_LEN as u64 + 1)
            .read_line(&mut self.line)
            .await?;
        if n == 0 {
            return Ok(None);
        }
        if self.line.len() > MAX_FRAME_LEN {
            return Err(StoreError::Protocol(format!(
                "frame of {} bytes exceeds limit",
                self.line.len()
            )));
        }
        if !self.line.ends_with('\n') {
            return Err(StoreError::ConnectionClosed);
        }
        let frame = serde_json::from_str(self.line.trim_end())
            .map_err(|e| StoreError::Protocol(format!("invalid frame: {}", e)))?;
        Ok(Some(frame))
    }

    /// Write a frame and flush it to the socket.
    pub async fn write_frame<T: Serialize>(&mut self, frame: &T) -> Result<(), StoreError> {
        let mut buf = serde_json::to_vec(frame)?;
        buf.push(b'\n');
        self.stream.write_all(&buf).await?;
        self.stream.flush().await?;
        Ok(())
    }
}
