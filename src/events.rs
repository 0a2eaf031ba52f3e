//! MySQL Binlog 이벤트 타입 및 데이터 구조 정의

use crate::metadata::TableMeta;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// MySQL Binlog 이벤트 타입
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventType {
    /// 알 수 없는 이벤트
    Unknown = 0,
    StartEventV3 = 1,
    /// 쿼리 이벤트 (DDL, BEGIN, ROLLBACK 등)
    QueryEvent = 2,
    StopEvent = 3,
    /// 로테이션 이벤트 (새 binlog 파일)
    RotateEvent = 4,
    IntvarEvent = 5,
    /// 포맷 디스크립션 이벤트 (파일 맨 앞, 서버 버전 및 post-header 길이)
    FormatDescriptionEvent = 15,
    /// XID 이벤트 (트랜잭션 커밋)
    XidEvent = 16,
    /// 테이블 맵 이벤트 (스키마 정보)
    TableMapEvent = 19,
    WriteRowsEventV1 = 23,
    UpdateRowsEventV1 = 24,
    DeleteRowsEventV1 = 25,
    HeartbeatLogEvent = 27,
    /// Rows Query 이벤트 (원본 쿼리)
    RowsQueryEvent = 29,
    /// WRITE_ROWS 이벤트 (INSERT)
    WriteRowsEvent = 30,
    /// UPDATE_ROWS 이벤트 (UPDATE)
    UpdateRowsEvent = 31,
    /// DELETE_ROWS 이벤트 (DELETE)
    DeleteRowsEvent = 32,
    /// GTID 이벤트 (Global Transaction ID)
    GtidEvent = 33,
    /// 익명 GTID 이벤트
    AnonymousGtidEvent = 34,
    PreviousGtidsEvent = 35,
    /// 트랜잭션 페이로드 이벤트
    TransactionPayloadEvent = 40,
}

impl EventType {
    pub fn from_u8(val: u8) -> Self {
        match val {
            1 => EventType::StartEventV3,
            2 => EventType::QueryEvent,
            3 => EventType::StopEvent,
            4 => EventType::RotateEvent,
            5 => EventType::IntvarEvent,
            15 => EventType::FormatDescriptionEvent,
            16 => EventType::XidEvent,
            19 => EventType::TableMapEvent,
            23 => EventType::WriteRowsEventV1,
            24 => EventType::UpdateRowsEventV1,
            25 => EventType::DeleteRowsEventV1,
            27 => EventType::HeartbeatLogEvent,
            29 => EventType::RowsQueryEvent,
            30 => EventType::WriteRowsEvent,
            31 => EventType::UpdateRowsEvent,
            32 => EventType::DeleteRowsEvent,
            33 => EventType::GtidEvent,
            34 => EventType::AnonymousGtidEvent,
            35 => EventType::PreviousGtidsEvent,
            40 => EventType::TransactionPayloadEvent,
            _ => EventType::Unknown,
        }
    }

    /// 행 변경 이벤트인 경우 (종류, 버전)
    pub fn rows_kind(&self) -> Option<(RowsKind, u8)> {
        match self {
            EventType::WriteRowsEventV1 => Some((RowsKind::Write, 1)),
            EventType::UpdateRowsEventV1 => Some((RowsKind::Update, 1)),
            EventType::DeleteRowsEventV1 => Some((RowsKind::Delete, 1)),
            EventType::WriteRowsEvent => Some((RowsKind::Write, 2)),
            EventType::UpdateRowsEvent => Some((RowsKind::Update, 2)),
            EventType::DeleteRowsEvent => Some((RowsKind::Delete, 2)),
            _ => None,
        }
    }
}

/// MySQL 컬럼 타입 (테이블 맵 이벤트의 column type 바이트)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ColumnType {
    Decimal = 0,
    Tiny = 1,
    Short = 2,
    Long = 3,
    Float = 4,
    Double = 5,
    Null = 6,
    Timestamp = 7,
    LongLong = 8,
    Int24 = 9,
    Date = 10,
    Time = 11,
    DateTime = 12,
    Year = 13,
    NewDate = 14,
    Varchar = 15,
    Bit = 16,
    Timestamp2 = 17,
    DateTime2 = 18,
    Time2 = 19,
    TypedArray = 20,
    Json = 245,
    NewDecimal = 246,
    Enum = 247,
    Set = 248,
    TinyBlob = 249,
    MediumBlob = 250,
    LongBlob = 251,
    Blob = 252,
    VarString = 253,
    String = 254,
    Geometry = 255,
}

impl ColumnType {
    pub fn from_u8(val: u8) -> Option<Self> {
        let column_type = match val {
            0 => ColumnType::Decimal,
            1 => ColumnType::Tiny,
            2 => ColumnType::Short,
            3 => ColumnType::Long,
            4 => ColumnType::Float,
            5 => ColumnType::Double,
            6 => ColumnType::Null,
            7 => ColumnType::Timestamp,
            8 => ColumnType::LongLong,
            9 => ColumnType::Int24,
            10 => ColumnType::Date,
            11 => ColumnType::Time,
            12 => ColumnType::DateTime,
            13 => ColumnType::Year,
            14 => ColumnType::NewDate,
            15 => ColumnType::Varchar,
            16 => ColumnType::Bit,
            17 => ColumnType::Timestamp2,
            18 => ColumnType::DateTime2,
            19 => ColumnType::Time2,
            20 => ColumnType::TypedArray,
            245 => ColumnType::Json,
            246 => ColumnType::NewDecimal,
            247 => ColumnType::Enum,
            248 => ColumnType::Set,
            249 => ColumnType::TinyBlob,
            250 => ColumnType::MediumBlob,
            251 => ColumnType::LongBlob,
            252 => ColumnType::Blob,
            253 => ColumnType::VarString,
            254 => ColumnType::String,
            255 => ColumnType::Geometry,
            _ => return None,
        };
        Some(column_type)
    }
}

/// Binlog 이벤트 헤더 (19 바이트)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventHeader {
    /// 이벤트 타임스탬프 (초 단위)
    pub timestamp: u32,
    /// 이벤트 타입
    pub event_type: EventType,
    /// 원본 타입 코드 (Unknown 이벤트 구분용)
    pub type_code: u8,
    /// MySQL 서버 ID
    pub server_id: u32,
    /// 이벤트 길이 (헤더 포함, 바이트)
    pub event_length: u32,
    /// 다음 이벤트 위치
    pub next_pos: u32,
    /// 이벤트 플래그
    pub flags: u16,
}

/// 포맷 디스크립션 이벤트 데이터
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatDescriptionData {
    pub binlog_version: u16,
    pub server_version: String,
    pub create_timestamp: u32,
    pub header_length: u8,
    /// 타입 코드 1부터 시작하는 이벤트별 post-header 길이
    pub post_header_lengths: Vec<u8>,
    /// 서버가 알린 체크섬 알고리즘 (0 = NONE, 1 = CRC32), 5.6 이전 서버는 None
    pub checksum_alg: Option<u8>,
}

impl FormatDescriptionData {
    pub fn post_header_len(&self, event_type: EventType) -> Option<u8> {
        let code = event_type as usize;
        if code == 0 {
            return None;
        }
        self.post_header_lengths.get(code - 1).copied()
    }

    /// 테이블 맵 / 행 이벤트의 table id 바이트 수
    pub fn table_id_width(&self, event_type: EventType) -> usize {
        match self.post_header_len(event_type) {
            Some(6) => 4,
            _ => 6,
        }
    }
}

/// 테이블 맵 정보 (컬럼 메타데이터)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMapData {
    /// 테이블 ID
    pub table_id: u64,
    pub flags: u16,
    /// 데이터베이스명
    pub database: String,
    /// 테이블명
    pub table: String,
    /// 컬럼 타입들
    pub column_types: Vec<ColumnType>,
    /// 컬럼 메타데이터 (원본 바이트)
    pub column_meta: Vec<u8>,
    /// nullable 비트맵
    pub nullable_bitmap: Vec<u8>,
}

impl TableMapData {
    pub fn full_table_name(&self) -> String {
        format!("{}.{}", self.database, self.table)
    }
}

/// 행 변경 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowsKind {
    Write,
    Update,
    Delete,
}

/// WRITE/UPDATE/DELETE_ROWS 이벤트 데이터
///
/// 행 이미지 자체는 해석하지 않고 원본 바이트로 보관합니다.
/// 값 해석은 `table_meta`의 컬럼 타입과 charset을 사용하는 쪽의 몫입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowsEventData {
    pub kind: RowsKind,
    /// 1 또는 2
    pub version: u8,
    pub table_id: u64,
    pub flags: u16,
    /// 컬럼 개수
    pub column_count: u64,
    /// 사용된 컬럼 비트맵
    pub columns_present: Vec<u8>,
    /// UPDATE의 변경 후 컬럼 비트맵
    pub columns_changed: Option<Vec<u8>>,
    pub database: String,
    pub table: String,
    pub table_meta: TableMeta,
    pub rows_image: Vec<u8>,
}

impl RowsEventData {
    pub fn full_table_name(&self) -> String {
        format!("{}.{}", self.database, self.table)
    }
}

/// GTID 이벤트 데이터
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GtidEventData {
    /// GTID 문자열 (format: uuid:sequence-number)
    pub gtid: String,
    pub sid: Uuid,
    pub gno: u64,
    /// 커밋 플래그
    pub committed: bool,
}

/// 쿼리 이벤트 데이터
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryEventData {
    /// 스레드 ID
    pub thread_id: u32,
    /// 실행 시간 (초)
    pub exec_time: u32,
    pub error_code: u16,
    /// 데이터베이스명
    pub database: String,
    /// 쿼리 문자열
    pub query: String,
}

/// 회전 이벤트 데이터
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotateEventData {
    /// 새 바이너리 로그 파일명
    pub next_binlog_name: String,
    /// 새 파일의 시작 위치
    pub position: u64,
}

/// XID 이벤트 데이터
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct XidEventData {
    pub xid: u64,
}

/// 모든 Binlog 이벤트를 포함하는 열거형
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinlogEventData {
    FormatDescription(FormatDescriptionData),
    Rotate(RotateEventData),
    TableMap(TableMapData),
    Query(QueryEventData),
    Gtid(GtidEventData),
    AnonymousGtid(GtidEventData),
    Xid(XidEventData),
    Rows(RowsEventData),
    RowsQuery(String),
    Unknown { type_code: u8, payload: Vec<u8> },
}

/// 완성된 Binlog 이벤트
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinlogEvent {
    /// 이벤트 헤더
    pub header: EventHeader,
    /// 이벤트 데이터
    pub data: BinlogEventData,
}

impl BinlogEvent {
    /// 헤더 타임스탬프를 UTC 시각으로 변환
    pub fn occurred_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(i64::from(self.header.timestamp), 0)
            .single()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_from_u8() {
        assert_eq!(EventType::from_u8(15), EventType::FormatDescriptionEvent);
        assert_eq!(EventType::from_u8(16), EventType::XidEvent);
        assert_eq!(EventType::from_u8(33), EventType::GtidEvent);
        assert_eq!(EventType::from_u8(200), EventType::Unknown);
        assert_eq!(
            EventType::UpdateRowsEventV1.rows_kind(),
            Some((RowsKind::Update, 1))
        );
        assert_eq!(EventType::QueryEvent.rows_kind(), None);
    }

    #[test]
    fn test_occurred_at() {
        let event = BinlogEvent {
            header: EventHeader {
                timestamp: 1_456_000_000,
                event_type: EventType::XidEvent,
                type_code: 16,
                server_id: 1,
                event_length: 27,
                next_pos: 500,
                flags: 0,
            },
            data: BinlogEventData::Xid(XidEventData { xid: 1 }),
        };
        assert_eq!(event.occurred_at().to_rfc3339(), "2016-02-20T20:26:40+00:00");
    }

    #[test]
    fn test_column_type_from_u8() {
        assert_eq!(ColumnType::from_u8(15), Some(ColumnType::Varchar));
        assert_eq!(ColumnType::from_u8(252), Some(ColumnType::Blob));
        assert_eq!(ColumnType::from_u8(100), None);
    }

    #[test]
    fn test_table_id_width() {
        let mut post_header_lengths = vec![0u8; 40];
        post_header_lengths[EventType::TableMapEvent as usize - 1] = 6;
        post_header_lengths[EventType::WriteRowsEvent as usize - 1] = 10;
        let fde = FormatDescriptionData {
            binlog_version: 4,
            server_version: "5.1.73".to_string(),
            create_timestamp: 0,
            header_length: 19,
            post_header_lengths,
            checksum_alg: None,
        };
        assert_eq!(fde.table_id_width(EventType::TableMapEvent), 4);
        assert_eq!(fde.table_id_width(EventType::WriteRowsEvent), 6);
        assert_eq!(fde.post_header_len(EventType::Unknown), None);
    }
}
