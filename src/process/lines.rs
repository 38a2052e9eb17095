//! Line framing for terminal-style subprocess output
//!
//! yt-dlp rewrites its progress line in place with `\r`, so a plain `\n`
//! splitter would only ever see the final update. This codec treats both
//! `\r` and `\n` as terminators and drops the empty frames a `\r\n` pair
//! produces.

use bytes::BytesMut;
use std::io;
use tokio_util::codec::Decoder;

/// Upper bound for a single frame; longer runs are flushed as-is.
const MAX_LINE_LENGTH: usize = 64 * 1024;

#[derive(Debug, Default, Clone)]
pub struct TerminalLineCodec {
    // Bytes already scanned for a terminator
    next_index: usize,
}

impl TerminalLineCodec {
    pub fn new() -> Self {
        Self::default()
    }
}

fn to_line(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

impl Decoder for TerminalLineCodec {
    type Item = String;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, io::Error> {
        loop {
            let terminator = src[self.next_index..]
                .iter()
                .position(|b| *b == b'\n' || *b == b'\r');

            match terminator {
                Some(offset) => {
                    let end = self.next_index + offset;
                    self.next_index = 0;
                    let frame = src.split_to(end + 1);
                    let line = &frame[..frame.len() - 1];
                    if line.is_empty() {
                        continue;
                    }
                    return Ok(Some(to_line(line)));
                }
                None if src.len() >= MAX_LINE_LENGTH => {
                    self.next_index = 0;
                    let frame = src.split_to(src.len());
                    return Ok(Some(to_line(&frame)));
                }
                None => {
                    self.next_index = src.len();
                    return Ok(None);
                }
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<String>, io::Error> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }
        self.next_index = 0;
        if src.is_empty() {
            return Ok(None);
        }
        let frame = src.split_to(src.len());
        Ok(Some(to_line(&frame)))
    }
}
