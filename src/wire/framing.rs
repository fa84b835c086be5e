use bytes::BytesMut;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::{Decoder, Encoder, LinesCodec, LinesCodecError};

/// Longest line either side will buffer before giving up on the peer.
pub(crate) const MAX_LINE_LENGTH: usize = 8 * 1024;

/// LineStream exchanges single `\n` terminated lines over a byte stream. There is no framing
/// beyond the terminator.
pub(crate) struct LineStream<S> {
    stream: S,
    codec: LinesCodec,
    read_buf: BytesMut,
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum ReadLineError {
    #[error("line is longer than {} bytes", MAX_LINE_LENGTH)]
    LineTooLong,
    #[error("line is not valid UTF-8")]
    NotUtf8,
    #[error("read failed: {0}")]
    Io(io::Error),
}

impl From<LinesCodecError> for ReadLineError {
    fn from(e: LinesCodecError) -> Self {
        match e {
            LinesCodecError::MaxLineLengthExceeded => ReadLineError::LineTooLong,
            LinesCodecError::Io(e) if e.kind() == io::ErrorKind::InvalidData => ReadLineError::NotUtf8,
            LinesCodecError::Io(e) => ReadLineError::Io(e),
        }
    }
}

impl From<io::Error> for ReadLineError {
    fn from(e: io::Error) -> Self {
        ReadLineError::Io(e)
    }
}

impl<S> LineStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub(crate) fn new(stream: S) -> Self {
        LineStream {
            stream,
            codec: LinesCodec::new_with_max_length(MAX_LINE_LENGTH),
            read_buf: BytesMut::with_capacity(256),
        }
    }

    /// Returns `Ok(None)` if the peer closed the stream before sending anything. A trailing
    /// fragment without a terminator is returned as a line, the same as a terminated one.
    pub(crate) async fn read_line(&mut self) -> Result<Option<String>, ReadLineError> {
        loop {
            if let Some(line) = self.codec.decode(&mut self.read_buf)? {
                return Ok(Some(line));
            }

            let bytes_read = self.stream.read_buf(&mut self.read_buf).await?;
            if bytes_read == 0 {
                return Ok(self.codec.decode_eof(&mut self.read_buf)?);
            }
        }
    }

    pub(crate) async fn write_line(&mut self, line: &str) -> io::Result<()> {
        let mut frame = BytesMut::with_capacity(line.len() + 1);
        self.codec
            .encode(line, &mut frame)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        self.stream.write_all(&frame).await?;
        self.stream.flush().await
    }

    pub(crate) fn into_inner(self) -> S {
        self.stream
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    #[tokio::test]
    async fn reads_lines_in_order_then_eof() {
        let (client, mut server) = duplex(64);
        let mut lines = LineStream::new(client);

        server.write_all(b"OK 1\nOK 2\r\n").await.unwrap();
        drop(server);

        assert_eq!(lines.read_line().await.unwrap(), Some("OK 1".to_string()));
        assert_eq!(lines.read_line().await.unwrap(), Some("OK 2".to_string()));
        assert_eq!(lines.read_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn unterminated_fragment_before_eof_is_a_line() {
        let (client, mut server) = duplex(64);
        let mut lines = LineStream::new(client);

        server.write_all(b"OK 7").await.unwrap();
        drop(server);

        assert_eq!(lines.read_line().await.unwrap(), Some("OK 7".to_string()));
    }

    #[tokio::test]
    async fn oversized_line_is_rejected() {
        let (client, mut server) = duplex(MAX_LINE_LENGTH * 2);
        let mut lines = LineStream::new(client);

        tokio::spawn(async move {
            let junk = vec![b'x'; MAX_LINE_LENGTH + 10];
            server.write_all(&junk).await.unwrap();
            server.write_all(b"\n").await.unwrap();
        });

        match lines.read_line().await {
            Err(ReadLineError::LineTooLong) => {}
            other => panic!("Expected LineTooLong, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn write_line_appends_terminator() {
        let (client, server) = duplex(64);
        let mut writer = LineStream::new(client);
        let mut reader = LineStream::new(server);

        writer.write_line("GET_COUNTER").await.unwrap();

        assert_eq!(reader.read_line().await.unwrap(), Some("GET_COUNTER".to_string()));
    }
}
