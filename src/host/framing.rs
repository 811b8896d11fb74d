//! Frame codecs for the message host byte stream.

use std::fmt;
use std::io::ErrorKind;
use std::str::FromStr;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::HostError;

/// Largest response a native-messaging host may send (1 MiB).
pub const MAX_NATIVE_OUTBOUND_FRAME: usize = 1024 * 1024;

/// Largest inbound frame the host accepts (64 MiB).
pub const MAX_INBOUND_FRAME: usize = 64 * 1024 * 1024;

/// How envelopes are delimited on the byte stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Framing {
    /// One JSON document per line.
    #[default]
    JsonLines,
    /// 4-byte little-endian length prefix followed by UTF-8 JSON.
    Native,
}

impl Framing {
    /// Returns the stable string label used on the command line and in config.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::JsonLines => "json-lines",
            Self::Native => "native",
        }
    }
}

impl fmt::Display for Framing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Framing {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "json-lines" => Ok(Self::JsonLines),
            "native" => Ok(Self::Native),
            other => Err(format!(
                "unknown framing '{other}'; expected one of: json-lines, native"
            )),
        }
    }
}

/// Reads the next frame, or `None` at a clean end of input.
pub(crate) async fn read_frame<R>(reader: &mut R, framing: Framing) -> Result<Option<Vec<u8>>, HostError>
where
    R: AsyncBufRead + Unpin,
{
    match framing {
        Framing::JsonLines => read_line_frame(reader, MAX_INBOUND_FRAME).await,
        Framing::Native => read_native_frame(reader).await,
    }
}

async fn read_line_frame<R>(reader: &mut R, max: usize) -> Result<Option<Vec<u8>>, HostError>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let mut line = Vec::new();
        // One byte past the limit is enough to tell an oversized line apart.
        let mut limited = (&mut *reader).take(max as u64 + 1);
        let read = limited.read_until(b'\n', &mut line).await?;
        if read == 0 {
            return Ok(None);
        }
        if line.len() > max {
            return Err(HostError::FrameTooLarge {
                len: line.len(),
                max,
            });
        }
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        return Ok(Some(line));
    }
}

async fn read_native_frame<R>(reader: &mut R) -> Result<Option<Vec<u8>>, HostError>
where
    R: AsyncBufRead + Unpin,
{
    let mut prefix = [0u8; 4];
    match reader.read_exact(&mut prefix).await {
        Ok(_) => {}
        Err(error) if error.kind() == ErrorKind::UnexpectedEof => return Ok(None),
        Err(error) => return Err(error.into()),
    }

    let len = u32::from_le_bytes(prefix) as usize;
    if len > MAX_INBOUND_FRAME {
        return Err(HostError::FrameTooLarge {
            len,
            max: MAX_INBOUND_FRAME,
        });
    }

    let mut frame = vec![0u8; len];
    reader.read_exact(&mut frame).await?;
    Ok(Some(frame))
}

/// Writes one frame and flushes.
pub(crate) async fn write_frame<W>(writer: &mut W, framing: Framing, payload: &[u8]) -> Result<(), HostError>
where
    W: AsyncWrite + Unpin,
{
    match framing {
        Framing::JsonLines => {
            writer.write_all(payload).await?;
            writer.write_all(b"\n").await?;
        }
        Framing::Native => {
            if payload.len() > MAX_NATIVE_OUTBOUND_FRAME {
                return Err(HostError::FrameTooLarge {
                    len: payload.len(),
                    max: MAX_NATIVE_OUTBOUND_FRAME,
                });
            }
            let len = u32::try_from(payload.len()).map_err(|_| HostError::FrameTooLarge {
                len: payload.len(),
                max: MAX_NATIVE_OUTBOUND_FRAME,
            })?;
            writer.write_all(&len.to_le_bytes()).await?;
            writer.write_all(payload).await?;
        }
    }
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tokio::io::BufReader;

    #[test]
    fn test_framing_parses_labels() {
        assert_eq!("json-lines".parse::<Framing>().unwrap(), Framing::JsonLines);
        assert_eq!("native".parse::<Framing>().unwrap(), Framing::Native);
        assert!("xml".parse::<Framing>().is_err());
        assert_eq!(Framing::Native.to_string(), "native");
    }

    #[tokio::test]
    async fn test_read_line_frames_skip_blank_lines() {
        let input: &[u8] = b"{\"a\":1}\n\n   \n{\"b\":2}";
        let mut reader = BufReader::new(input);
        let first = read_frame(&mut reader, Framing::JsonLines).await.unwrap().unwrap();
        assert_eq!(first, b"{\"a\":1}\n");
        let second = read_frame(&mut reader, Framing::JsonLines).await.unwrap().unwrap();
        assert_eq!(second, b"{\"b\":2}");
        assert!(read_frame(&mut reader, Framing::JsonLines).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_line_frame_stops_at_limit_without_newline() {
        let mut reader = BufReader::new(tokio::io::repeat(b'x'));
        let err = read_line_frame(&mut reader, 16).await.unwrap_err();
        assert!(matches!(err, HostError::FrameTooLarge { len: 17, max: 16 }));
    }

    #[tokio::test]
    async fn test_read_line_frame_accepts_line_at_limit() {
        let input: &[u8] = b"{\"a\":12345678}\n{}\n";
        let mut reader = BufReader::new(input);
        let first = read_line_frame(&mut reader, 15).await.unwrap().unwrap();
        assert_eq!(first, b"{\"a\":12345678}\n");
        let second = read_line_frame(&mut reader, 15).await.unwrap().unwrap();
        assert_eq!(second, b"{}\n");
    }

    #[tokio::test]
    async fn test_native_frames_use_little_endian_prefix() {
        let mut buffer = Vec::new();
        write_frame(&mut buffer, Framing::Native, b"{}").await.unwrap();
        assert_eq!(buffer, [2, 0, 0, 0, b'{', b'}']);

        let mut reader = BufReader::new(buffer.as_slice());
        let frame = read_frame(&mut reader, Framing::Native).await.unwrap().unwrap();
        assert_eq!(frame, b"{}");
        assert!(read_frame(&mut reader, Framing::Native).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_native_truncated_body_is_error() {
        let input: &[u8] = &[10, 0, 0, 0, b'{'];
        let mut reader = BufReader::new(input);
        assert!(read_frame(&mut reader, Framing::Native).await.is_err());
    }

    #[tokio::test]
    async fn test_native_oversized_prefix_is_rejected() {
        let input = u32::MAX.to_le_bytes();
        let mut reader = BufReader::new(&input[..]);
        let err = read_frame(&mut reader, Framing::Native).await.unwrap_err();
        assert!(matches!(err, HostError::FrameTooLarge { .. }));
    }

    #[tokio::test]
    async fn test_native_outbound_limit() {
        let payload = vec![b' '; MAX_NATIVE_OUTBOUND_FRAME + 1];
        let mut buffer = Vec::new();
        let err = write_frame(&mut buffer, Framing::Native, &payload)
            .await
            .unwrap_err();
        assert!(matches!(err, HostError::FrameTooLarge { .. }));
        assert!(buffer.is_empty());
    }
}
