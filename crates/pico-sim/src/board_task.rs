//! Board actor task
//!
//! Serves a [`VirtualBoard`] over any async byte stream, so tests can wire
//! one end of `tokio::io::duplex()` to a `DeviceSession` and talk to the
//! board exactly as they would over a serial port.

use std::io;

use pico_protocol::{normalize_reply, LINE_TERMINATOR};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::VirtualBoard;

/// Run the board task until the stream closes
///
/// Reads request lines, feeds them through the board's handler, and writes
/// one CRLF-terminated reply line per replying request (an empty reply is a
/// bare line terminator, which the host decodes as the empty reply).
///
/// Returns the board so callers can inspect its counters afterwards.
pub async fn run_board_task<S>(mut stream: S, mut board: VirtualBoard) -> io::Result<VirtualBoard>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    info!("Starting board task for {}", board.id());

    let mut buf = [0u8; 1024];
    let mut pending: Vec<u8> = Vec::new();

    loop {
        let n = match stream.read(&mut buf).await {
            Ok(0) => {
                debug!("Stream closed for board {}", board.id());
                break;
            }
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::ConnectionAborted => {
                debug!("Stream aborted for board {}", board.id());
                break;
            }
            Err(e) => {
                warn!("Board {} stream error: {}", board.id(), e);
                return Err(e);
            }
        };

        pending.extend_from_slice(&buf[..n]);

        while let Some(pos) = pending.iter().position(|&b| b == b'\n') {
            let line_bytes: Vec<u8> = pending.drain(..=pos).collect();
            let line = normalize_reply(&line_bytes);
            debug!("Board {} received request: {:?}", board.id(), line);

            if let Some(reply) = board.handle_line(&line) {
                stream.write_all(reply.as_bytes()).await?;
                stream.write_all(LINE_TERMINATOR.as_bytes()).await?;
                stream.flush().await?;
            }
        }
    }

    info!("Board task ended for {}", board.id());
    Ok(board)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    async fn read_reply(stream: &mut tokio::io::DuplexStream) -> String {
        let mut buf = [0u8; 256];
        let n = stream.read(&mut buf).await.unwrap();
        normalize_reply(&buf[..n])
    }

    #[tokio::test]
    async fn board_answers_len_over_stream() {
        let (mut host, device) = tokio::io::duplex(1024);
        let task = tokio::spawn(run_board_task(device, VirtualBoard::new("Test")));

        host.write_all(b"addToData()\r\n").await.unwrap();
        host.write_all(b"getLen()\r\n").await.unwrap();

        assert_eq!(read_reply(&mut host).await, "1");

        drop(host);
        let board = task.await.unwrap().unwrap();
        assert_eq!(board.accumulate_count(), 1);
    }

    #[tokio::test]
    async fn empty_reply_is_a_bare_line() {
        let (mut host, device) = tokio::io::duplex(1024);
        let mut board = VirtualBoard::new("Test");
        board.script_len_replies(Vec::<String>::new());
        let task = tokio::spawn(run_board_task(device, board));

        host.write_all(b"getLen()\r\n").await.unwrap();

        let mut buf = [0u8; 16];
        let n = host.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"\r\n");

        drop(host);
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn split_request_across_reads() {
        let (mut host, device) = tokio::io::duplex(1024);
        let task = tokio::spawn(run_board_task(device, VirtualBoard::new("Test")));

        host.write_all(b"getEn").await.unwrap();
        host.write_all(b"ded()\r\n").await.unwrap();

        assert_eq!(read_reply(&mut host).await, "no");

        drop(host);
        task.await.unwrap().unwrap();
    }
}
