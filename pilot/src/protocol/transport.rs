//! Line-delimited stdio loop: one JSON-RPC request per input line, one response per output line.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::protocol::dispatcher::Dispatcher;
use crate::protocol::envelope::{PARSE_ERROR, Request, Response, extract_id};

/// Serve newline-delimited requests from `reader` until EOF.
///
/// Requests are handled strictly in order; each response is written as one
/// compact JSON line and flushed before the next line is read.
pub fn serve<R: BufRead, W: Write>(
    mut reader: R,
    mut writer: W,
    dispatcher: &Dispatcher<'_>,
) -> Result<()> {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let n = reader.read_until(b'\n', &mut buf).context("read request")?;
        if n == 0 {
            debug!("input closed; stopping");
            return Ok(());
        }

        let line = String::from_utf8_lossy(&buf);
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = match Request::parse(line) {
            Some(request) => {
                debug!(method = %request.method, id = ?request.id, "request");
                dispatcher.handle(&request)
            }
            None => {
                warn!("malformed request line");
                Some(Response::error(extract_id(line), PARSE_ERROR, "Parse error"))
            }
        };

        if let Some(response) = response {
            write_response(&mut writer, &response)?;
        }
    }
}

fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    serde_json::to_writer(&mut *writer, response).context("write response")?;
    writer.write_all(b"\n").context("write response")?;
    writer.flush().context("flush response")
}
