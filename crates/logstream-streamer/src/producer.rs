//! Feeds input lines into the stream.

use logstream_core::BufferedLogStream;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Write every line from `reader` to `stream`, in order, until EOF.
///
/// Line terminators are stripped. Returns the number of lines written.
///
/// # Errors
///
/// Returns the first read error; lines read before it have already been
/// written to the stream.
pub async fn pump_lines<R>(reader: R, stream: &BufferedLogStream) -> std::io::Result<u64>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut count: u64 = 0;

    while let Some(line) = lines.next_line().await? {
        stream.write_line(line);
        count = count.saturating_add(1);
    }

    Ok(count)
}
