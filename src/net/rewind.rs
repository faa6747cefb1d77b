//! A stream that replays already-consumed bytes before the live socket.
//!
//! The accept loop reads the first request head raw off the wire to decide
//! whether the connection is an upgrade. When it is not, the HTTP layer
//! still needs to see an untouched byte stream; this wrapper yields the
//! sniffed bytes first and then hands off to the socket.

use std::cmp;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;

pub struct RewindStream {
    stream: TcpStream,
    replay: Vec<u8>,
    cursor: usize,
}

impl RewindStream {
    pub fn new(stream: TcpStream, replay: Vec<u8>) -> Self {
        Self {
            stream,
            replay,
            cursor: 0,
        }
    }
}

impl AsyncRead for RewindStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if self.cursor < self.replay.len() && buf.remaining() > 0 {
            let available = self.replay.len() - self.cursor;
            let take = cmp::min(available, buf.remaining());
            buf.put_slice(&self.replay[self.cursor..self.cursor + take]);
            self.cursor += take;
            return Poll::Ready(Ok(()));
        }

        Pin::new(&mut self.stream).poll_read(cx, buf)
    }
}

impl AsyncWrite for RewindStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        data: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.stream).poll_write(cx, data)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.stream).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.stream).poll_shutdown(cx)
    }
}
