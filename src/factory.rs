//! 이벤트 팩토리: 타입 코드 → 디코딩 연산
//!
//! 테이블 맵 / 행 이벤트는 포맷 디스크립션 이벤트의 post-header 길이가
//! 있어야 table id 폭을 알 수 있으므로, 그 전에 만나면 바로 실패합니다.

use crate::binlog::{BinlogParser, CHECKSUM_SIZE, EVENT_HEADER_SIZE};
use crate::context::SessionContext;
use crate::error::{BinlogError, Result};
use crate::events::*;
use crate::metadata::TableMetaProvider;
use bytes::Bytes;
use tracing::debug;

/// 타입별 디코더 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoder {
    FormatDescription,
    Rotate,
    Query,
    Xid,
    Gtid,
    AnonymousGtid,
    TableMap { table_id_width: usize },
    Rows { kind: RowsKind, version: u8, table_id_width: usize },
    RowsQuery,
    Opaque,
}

/// 한 이벤트를 디코딩하는 연산
pub struct DecodeOperation<'a> {
    decoder: Decoder,
    log_pos: u32,
    checksum_enabled: bool,
    context: &'a SessionContext,
}

pub struct EventFactory;

impl EventFactory {
    pub fn build(
        event_type: EventType,
        log_pos: u32,
        context: &SessionContext,
        checksum_enabled: bool,
    ) -> Result<DecodeOperation<'_>> {
        let decoder = match event_type {
            EventType::FormatDescriptionEvent => Decoder::FormatDescription,
            EventType::RotateEvent => Decoder::Rotate,
            EventType::QueryEvent => Decoder::Query,
            EventType::XidEvent => Decoder::Xid,
            EventType::GtidEvent => Decoder::Gtid,
            EventType::AnonymousGtidEvent => Decoder::AnonymousGtid,
            EventType::RowsQueryEvent => Decoder::RowsQuery,
            EventType::TableMapEvent => Decoder::TableMap {
                table_id_width: Self::table_id_width(event_type, log_pos, context)?,
            },
            _ => match event_type.rows_kind() {
                Some((kind, version)) => Decoder::Rows {
                    kind,
                    version,
                    table_id_width: Self::table_id_width(event_type, log_pos, context)?,
                },
                None => Decoder::Opaque,
            },
        };

        Ok(DecodeOperation {
            decoder,
            log_pos,
            checksum_enabled,
            context,
        })
    }

    fn table_id_width(event_type: EventType, log_pos: u32, context: &SessionContext) -> Result<usize> {
        context
            .format_description()
            .map(|fde| fde.table_id_width(event_type))
            .ok_or_else(|| {
                BinlogError::ProtocolError(format!(
                    "{:?} at {}: 포맷 디스크립션 이벤트 이전에 디코딩할 수 없습니다",
                    event_type, log_pos
                ))
            })
    }
}

impl DecodeOperation<'_> {
    pub fn decoder(&self) -> Decoder {
        self.decoder
    }

    /// 헤더 뒤에 스트림에서 읽어야 할 바이트 수 (체크섬 포함)
    pub fn body_len(&self, header: &EventHeader) -> Result<usize> {
        let minimum = EVENT_HEADER_SIZE + if self.checksum_enabled { CHECKSUM_SIZE } else { 0 };
        let event_length = header.event_length as usize;
        if event_length < minimum {
            return Err(BinlogError::InvalidEvent(format!(
                "event at {}: length {} is smaller than {}",
                self.log_pos, event_length, minimum
            )));
        }
        Ok(event_length - EVENT_HEADER_SIZE)
    }

    /// `body_len` 바이트를 받아 이벤트로 디코딩
    pub fn decode(&self, header: EventHeader, body: Bytes) -> Result<BinlogEvent> {
        let expected = self.body_len(&header)?;
        if body.len() != expected {
            return Err(BinlogError::InvalidEvent(format!(
                "event at {}: body is {} bytes, header says {}",
                self.log_pos,
                body.len(),
                expected
            )));
        }

        // CRC32 트레일러는 해석하지 않음
        let payload = if self.checksum_enabled {
            body.slice(..body.len() - CHECKSUM_SIZE)
        } else {
            body
        };

        debug!(
            "Decoding {:?} at {}: {} payload bytes",
            header.event_type,
            self.log_pos,
            payload.len()
        );

        let data = match self.decoder {
            Decoder::FormatDescription => BinlogEventData::FormatDescription(
                BinlogParser::parse_format_description_event(&payload)?,
            ),
            Decoder::Rotate => BinlogEventData::Rotate(BinlogParser::parse_rotate_event(&payload)?),
            Decoder::Query => BinlogEventData::Query(BinlogParser::parse_query_event(&payload)?),
            Decoder::Xid => BinlogEventData::Xid(BinlogParser::parse_xid_event(&payload)?),
            Decoder::Gtid => BinlogEventData::Gtid(BinlogParser::parse_gtid_event(&payload)?),
            Decoder::AnonymousGtid => {
                BinlogEventData::AnonymousGtid(BinlogParser::parse_gtid_event(&payload)?)
            }
            Decoder::RowsQuery => {
                BinlogEventData::RowsQuery(BinlogParser::parse_rows_query_event(&payload)?)
            }
            Decoder::TableMap { table_id_width } => BinlogEventData::TableMap(
                BinlogParser::parse_table_map_event(&payload, table_id_width)?,
            ),
            Decoder::Rows {
                kind,
                version,
                table_id_width,
            } => BinlogEventData::Rows(self.decode_rows(&payload, kind, version, table_id_width)?),
            Decoder::Opaque => BinlogEventData::Unknown {
                type_code: header.type_code,
                payload: payload.to_vec(),
            },
        };

        Ok(BinlogEvent { header, data })
    }

    fn decode_rows(
        &self,
        payload: &[u8],
        kind: RowsKind,
        version: u8,
        table_id_width: usize,
    ) -> Result<RowsEventData> {
        let mut rows = BinlogParser::parse_rows_event(payload, kind, version, table_id_width)?;

        let (database, table) = match self.context.table_map() {
            Some(map) => (map.database.clone(), map.table.clone()),
            None => (String::new(), String::new()),
        };
        rows.table_meta = self.context.table_meta(rows.table_id, &database, &table)?;
        rows.database = database;
        rows.table = table;

        if rows.table_meta.column_count() as u64 != rows.column_count {
            debug!(
                "Rows event for {} declares {} columns, table map has {}",
                rows.full_table_name(),
                rows.column_count,
                rows.table_meta.column_count()
            );
        }

        Ok(rows)
    }
}
