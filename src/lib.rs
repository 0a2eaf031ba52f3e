//! MySQL Binlog 파일 디코더
//!
//! 디스크에 저장된 MySQL 바이너리 로그를 처음부터 끝까지 읽어
//! 의미 있는 변경 이벤트 스트림으로 분류합니다.
//! 주요 기능:
//! - 파일 헤더 / 이벤트 프레임 검증
//! - 세션 컨텍스트 (포맷 디스크립션, rotate, 테이블 맵)
//! - 타입 코드별 이벤트 디코딩 및 테이블 메타데이터 해석
//! - GTID / ROW / 트랜잭션 경계 분류

pub mod binlog;
pub mod classify;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod factory;
pub mod gtid;
pub mod metadata;
pub mod offset;
pub mod reader;
pub mod traversal;

#[cfg(test)]
mod test_support;

pub use classify::{classify, ClassifiedEvent, EventCategory, EventSink};
pub use config::ReaderConfig;
pub use context::SessionContext;
pub use error::{BinlogError, Result};
pub use events::{BinlogEvent, BinlogEventData, EventType};
pub use gtid::GtidSet;
pub use metadata::{TableMeta, TableMetaProvider};
pub use offset::BinlogPosition;
pub use traversal::{BinlogFileReader, Completion, TraversalSummary};
