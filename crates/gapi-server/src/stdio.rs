//! Line-oriented stdio transport.
//!
//! Requests are handled strictly one at a time: a line is read, handled to
//! completion and its response flushed before the next line is read.

use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};
use tracing::{debug, error, info, warn};

use gapi_protocol::{ErrorCode, ErrorObject, MAX_MESSAGE_SIZE, Response, encode_message};

use crate::error::ServerResult;
use crate::handler::RequestHandler;

/// MCP server bound to a pair of byte streams.
#[derive(Debug, Clone)]
pub struct StdioServer {
    handler: RequestHandler,
}

impl StdioServer {
    pub fn new(handler: RequestHandler) -> Self {
        Self { handler }
    }

    /// Serves on the process stdin/stdout until EOF or Ctrl-C.
    pub async fn run(&self) -> ServerResult<()> {
        info!("serving MCP on stdio");
        let stdin = tokio::io::stdin();
        let stdout = tokio::io::stdout();

        tokio::select! {
            result = self.serve(stdin, stdout) => result,
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received, shutting down");
                Ok(())
            }
        }
    }

    /// Serves until `reader` reaches EOF.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> ServerResult<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut reader = BufReader::new(reader);
        let mut line = Vec::new();
        let limit = MAX_MESSAGE_SIZE as u64 + 1;

        loop {
            line.clear();
            let read = (&mut reader).take(limit).read_until(b'\n', &mut line).await?;
            if read == 0 {
                debug!("stdin closed");
                return Ok(());
            }
            if read as u64 == limit && line.last() != Some(&b'\n') {
                // The truncated line still fails decoding as too large.
                warn!(max = MAX_MESSAGE_SIZE, "oversized message, skipping to end of line");
                discard_line(&mut reader).await?;
            }

            let Some(response) = self.handler.handle_line(&line).await else {
                continue;
            };
            let bytes = match encode_message(&response) {
                Ok(bytes) => bytes,
                Err(err) => {
                    error!(error = %err, "failed to encode response");
                    let fallback = Response::error(
                        response.id.clone(),
                        ErrorObject::new(ErrorCode::InternalError, err.to_string()),
                    );
                    encode_message(&fallback)?
                }
            };

            writer.write_all(&bytes).await?;
            writer.flush().await?;
        }
    }
}

/// Drops input up to and including the next newline.
async fn discard_line<R: AsyncBufRead + Unpin>(reader: &mut R) -> std::io::Result<()> {
    loop {
        let buf = reader.fill_buf().await?;
        if buf.is_empty() {
            return Ok(());
        }
        let (consumed, done) = match buf.iter().position(|&b| b == b'\n') {
            Some(end) => (end + 1, true),
            None => (buf.len(), false),
        };
        reader.consume(consumed);
        if done {
            return Ok(());
        }
    }
}
