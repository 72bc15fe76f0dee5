//! Newline-delimited message framing.
//!
//! ```text
//! +------------------+----+
//! |  JSON payload    | \n |
//! +------------------+----+
//! ```

use serde::{Serialize, de::DeserializeOwned};

use crate::MAX_MESSAGE_SIZE;
use crate::error::{ProtocolError, ProtocolResult};

/// Encodes a message as a single JSON line, including the trailing `\n`.
pub fn encode_message<T: Serialize>(message: &T) -> ProtocolResult<Vec<u8>> {
    let mut buffer = serde_json::to_vec(message)?;

    if buffer.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: buffer.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }

    buffer.push(b'\n');
    Ok(buffer)
}

/// Decodes a single line. A trailing `\n` or `\r\n` is ignored.
pub fn decode_message<T: DeserializeOwned>(data: &[u8]) -> ProtocolResult<T> {
    if data.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: data.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }

    let line = trim_line_ending(data);
    if line.iter().all(u8::is_ascii_whitespace) {
        return Err(ProtocolError::EmptyMessage);
    }

    Ok(serde_json::from_slice(line)?)
}

fn trim_line_ending(data: &[u8]) -> &[u8] {
    let data = data.strip_suffix(b"\n").unwrap_or(data);
    data.strip_suffix(b"\r").unwrap_or(data)
}
