//! 고정 길이 바이트 청크 읽기
//!
//! 파일 끝(0 바이트 남음)은 정상 종료 신호이고,
//! 프레임 도중 끝난 경우(1..n-1 바이트 남음)는 I/O 실패입니다.
//! 파일 헤더처럼 짧은 읽기를 직접 판단해야 하면 `read_prefix`를 씁니다.

use crate::error::{BinlogError, Result};
use bytes::{Bytes, BytesMut};
use std::io::{self, Read};

/// `read_exact` 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Data(Bytes),
    EndOfStream,
}

/// 프레임 리더
pub struct FrameReader<R> {
    inner: R,
    offset: u64,
}

impl<R: Read> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        FrameReader { inner, offset: 0 }
    }

    /// 지금까지 소비한 바이트 수
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// 정확히 `len` 바이트 읽기
    pub fn read_exact(&mut self, len: usize) -> Result<ReadOutcome> {
        let bytes = self.read_prefix(len)?;
        if bytes.len() == len {
            return Ok(ReadOutcome::Data(bytes));
        }
        if bytes.is_empty() {
            return Ok(ReadOutcome::EndOfStream);
        }

        Err(BinlogError::IoFailure(format!(
            "파일이 끝났습니다. {} 바이트가 더 필요합니다 (offset {})",
            len - bytes.len(),
            self.offset
        )))
    }

    /// 최대 `len` 바이트 읽기. 파일 끝이면 더 짧게 반환
    ///
    /// OS 읽기 에러만 `IoFailure`입니다.
    pub fn read_prefix(&mut self, len: usize) -> Result<Bytes> {
        let mut buf = BytesMut::zeroed(len);
        let mut filled = 0;

        while filled < len {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(BinlogError::IoFailure(format!(
                        "offset {}에서 읽기 실패: {}",
                        self.offset + filled as u64,
                        e
                    )))
                }
            }
        }

        self.offset += filled as u64;
        buf.truncate(filled);
        Ok(buf.freeze())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// 한 번에 한 바이트씩만 돌려주는 리더
    struct Trickle(Cursor<Vec<u8>>);

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let len = buf.len().min(1);
            self.0.read(&mut buf[..len])
        }
    }

    /// 항상 실패하는 리더
    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk on fire"))
        }
    }

    #[test]
    fn test_read_exact_data() {
        let mut reader = FrameReader::new(Cursor::new(vec![1u8, 2, 3, 4]));
        assert_eq!(
            reader.read_exact(3).unwrap(),
            ReadOutcome::Data(Bytes::from_static(&[1, 2, 3]))
        );
        assert_eq!(reader.offset(), 3);
    }

    #[test]
    fn test_end_of_stream_on_boundary() {
        let mut reader = FrameReader::new(Cursor::new(vec![1u8, 2]));
        assert!(matches!(reader.read_exact(2).unwrap(), ReadOutcome::Data(_)));
        assert_eq!(reader.read_exact(19).unwrap(), ReadOutcome::EndOfStream);
    }

    #[test]
    fn test_short_read_is_io_failure() {
        let mut reader = FrameReader::new(Cursor::new(vec![1u8, 2, 3]));
        assert!(matches!(
            reader.read_exact(19),
            Err(BinlogError::IoFailure(_))
        ));
    }

    #[test]
    fn test_read_prefix_stops_at_end() {
        let mut reader = FrameReader::new(Cursor::new(vec![0xfeu8, b'b']));
        assert_eq!(reader.read_prefix(4).unwrap(), Bytes::from_static(&[0xfe, b'b']));
        assert_eq!(reader.offset(), 2);
        assert!(reader.read_prefix(4).unwrap().is_empty());
    }

    #[test]
    fn test_os_error_is_io_failure() {
        let mut reader = FrameReader::new(Broken);
        assert!(matches!(reader.read_prefix(4), Err(BinlogError::IoFailure(_))));
        assert!(matches!(reader.read_exact(19), Err(BinlogError::IoFailure(_))));
    }

    #[test]
    fn test_zero_length_read() {
        let mut reader = FrameReader::new(Cursor::new(Vec::new()));
        assert_eq!(reader.read_exact(0).unwrap(), ReadOutcome::Data(Bytes::new()));
    }

    #[test]
    fn test_partial_reads_are_assembled() {
        let mut reader = FrameReader::new(Trickle(Cursor::new(vec![9u8; 19])));
        match reader.read_exact(19).unwrap() {
            ReadOutcome::Data(bytes) => assert_eq!(bytes.len(), 19),
            ReadOutcome::EndOfStream => panic!("unexpected end of stream"),
        }
    }
}
