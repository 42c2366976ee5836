use async_trait::async_trait;
use tokio::io;
use tokio::net::TcpStream;

use crate::buffer::Buffer;
use crate::dev_print;

/// Moves bytes between a non-blocking socket and a [`Buffer`], waiting for
/// readiness before each attempt.
#[async_trait]
pub trait StreamHttp {
    /// One scatter read into `buf`. `Ok(0)` means the peer closed its side.
    async fn read_buffer(&self, buf: &mut Buffer) -> io::Result<usize>;

    /// Writes until `buf` is drained. Returns the number of bytes sent.
    async fn write_buffer(&self, buf: &mut Buffer) -> io::Result<usize>;
}

#[async_trait]
impl StreamHttp for TcpStream {
    async fn read_buffer(&self, buf: &mut Buffer) -> io::Result<usize> {
        loop {
            self.readable().await?;
            match buf.read_with(|segments| self.try_read_vectored(segments)) {
                Ok(n) => return Ok(n),
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                    dev_print!("read would block, waiting for readiness");
                    continue;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn write_buffer(&self, buf: &mut Buffer) -> io::Result<usize> {
        let mut total = 0;
        while buf.readable_bytes() > 0 {
            self.writable().await?;
            match buf.write_with(|data| self.try_write(data)) {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(n) => total += n,
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                    continue;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    async fn pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (server, _) = listener.accept().await.unwrap();
        (client, server)
    }

    #[tokio::test]
    async fn reads_large_payload_in_order() {
        let (mut client, server) = pair().await;
        let payload: Vec<u8> = (0..200_000u32).map(|i| (i % 253) as u8).collect();

        let expected = payload.clone();
        let writer = tokio::spawn(async move {
            client.write_all(&payload).await.unwrap();
            client.shutdown().await.unwrap();
        });

        let mut buf = Buffer::default();
        loop {
            if server.read_buffer(&mut buf).await.unwrap() == 0 {
                break;
            }
        }
        writer.await.unwrap();
        assert_eq!(buf.peek(), expected.as_slice());
    }

    #[tokio::test]
    async fn writes_whole_buffer() {
        let (mut client, server) = pair().await;
        let mut buf = Buffer::new(16);
        buf.append_str("HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n");

        let sent = server.write_buffer(&mut buf).await.unwrap();
        assert_eq!(sent, 38);
        assert_eq!(buf.readable_bytes(), 0);

        let mut received = vec![0; sent];
        client.read_exact(&mut received).await.unwrap();
        assert_eq!(received, b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n");
    }
}
