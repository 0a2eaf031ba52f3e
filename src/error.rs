//! Binlog 디코딩 에러 타입
//!
//! 파일 끝(EndOfStream)은 에러가 아니므로 여기에 없습니다.
//! `reader::ReadOutcome::EndOfStream` 참고.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BinlogError {
    /// 매직 바이트 / "bin" 마커 불일치
    #[error("binlog 파일 형식 에러: {0}")]
    FormatError(String),

    /// 프레임 중간에서 파일이 끝났거나 읽기 자체가 실패
    #[error("I/O 에러: {0}")]
    IoFailure(String),

    /// 컨텍스트가 준비되지 않은 상태에서 디코딩 시도
    #[error("프로토콜 에러: {0}")]
    ProtocolError(String),

    #[error("유효하지 않은 이벤트: {0}")]
    InvalidEvent(String),

    #[error("Binlog 파싱 에러: {0}")]
    BinlogParseError(String),

    #[error("직렬화 에러: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("채널이 닫혔습니다")]
    ChannelClosed,

    #[error("작업 실행 에러: {0}")]
    TaskFailed(String),
}

impl BinlogError {
    /// 로그 필드용 짧은 에러 분류명
    pub fn kind(&self) -> &'static str {
        match self {
            BinlogError::FormatError(_) => "format",
            BinlogError::IoFailure(_) => "io",
            BinlogError::ProtocolError(_) => "protocol",
            BinlogError::InvalidEvent(_) => "invalid_event",
            BinlogError::BinlogParseError(_) => "parse",
            BinlogError::SerializationError(_) => "serialization",
            BinlogError::ChannelClosed => "channel_closed",
            BinlogError::TaskFailed(_) => "task",
        }
    }
}

impl From<io::Error> for BinlogError {
    fn from(err: io::Error) -> Self {
        BinlogError::IoFailure(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BinlogError>;
