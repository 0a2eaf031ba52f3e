//! MySQL Binlog 파일 형식 파싱
//!
//! 파일 헤더: 4 바이트 (0xfe 0x62 0x69 0x6e, 즉 0xfe + "bin")
//! 각 이벤트:
//!   - Timestamp (4 bytes)
//!   - Type (1 byte)
//!   - Server ID (4 bytes)
//!   - Event Length (4 bytes)
//!   - Next Position (4 bytes)
//!   - Flags (2 bytes)
//!   - Event Data (variable, 체크섬 사용 시 끝 4 바이트는 CRC32)
//!
//! 여기의 함수들은 모두 상태가 없는 순수 함수입니다. 체크섬 트레일러는
//! 호출 전에 이미 잘려 있어야 합니다.

use crate::error::{BinlogError, Result};
use crate::events::*;
use crate::metadata::TableMeta;
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{self, Cursor, Read};
use uuid::Uuid;

pub const BINLOG_MAGIC_BYTE: u8 = 0xfe;
pub const BINLOG_MARKER: &[u8] = b"bin";
pub const EVENT_HEADER_SIZE: usize = 19;
pub const CHECKSUM_SIZE: usize = 4;

const SERVER_VERSION_LEN: usize = 50;

/// Binlog 파일 파서
pub struct BinlogParser;

impl BinlogParser {
    /// 첫 바이트 검증
    pub fn verify_magic_byte(byte: u8) -> Result<()> {
        if byte == BINLOG_MAGIC_BYTE {
            Ok(())
        } else {
            Err(BinlogError::FormatError(format!(
                "첫 바이트는 0xfe 이어야 합니다 (0x{:02x})",
                byte
            )))
        }
    }

    /// 매직 바이트 다음 3 바이트 "bin" 검증
    pub fn verify_marker(data: &[u8]) -> Result<()> {
        if data == BINLOG_MARKER {
            Ok(())
        } else {
            Err(BinlogError::FormatError(
                "MySQL binlog 파일이 아닙니다".to_string(),
            ))
        }
    }

    /// 이벤트 헤더 파싱
    pub fn parse_header(data: &[u8]) -> Result<EventHeader> {
        if data.len() < EVENT_HEADER_SIZE {
            return Err(BinlogError::BinlogParseError(format!(
                "Invalid event header: {} bytes",
                data.len()
            )));
        }

        let mut cursor = Cursor::new(data);

        let timestamp = cursor.read_u32::<LittleEndian>()?;
        let type_code = cursor.read_u8()?;
        let server_id = cursor.read_u32::<LittleEndian>()?;
        let event_length = cursor.read_u32::<LittleEndian>()?;
        let next_pos = cursor.read_u32::<LittleEndian>()?;
        let flags = cursor.read_u16::<LittleEndian>()?;

        Ok(EventHeader {
            timestamp,
            event_type: EventType::from_u8(type_code),
            type_code,
            server_id,
            event_length,
            next_pos,
            flags,
        })
    }

    /// 포맷 디스크립션 이벤트 파싱 (15)
    pub fn parse_format_description_event(data: &[u8]) -> Result<FormatDescriptionData> {
        decode("format description", || {
            let mut cursor = Cursor::new(data);

            let binlog_version = cursor.read_u16::<LittleEndian>()?;
            let mut version_bytes = [0u8; SERVER_VERSION_LEN];
            cursor.read_exact(&mut version_bytes)?;
            let server_version = String::from_utf8_lossy(&version_bytes)
                .trim_end_matches('\0')
                .to_string();
            let create_timestamp = cursor.read_u32::<LittleEndian>()?;
            let header_length = cursor.read_u8()?;

            let mut post_header_lengths = Vec::new();
            cursor.read_to_end(&mut post_header_lengths)?;

            // 5.6 이상은 post-header 목록 뒤에 checksum 알고리즘 1 바이트가 붙음
            let checksum_alg = if version_has_checksum(&server_version) {
                post_header_lengths.pop()
            } else {
                None
            };

            Ok(FormatDescriptionData {
                binlog_version,
                server_version,
                create_timestamp,
                header_length,
                post_header_lengths,
                checksum_alg,
            })
        })
    }

    /// 테이블 맵 이벤트 파싱 (19)
    pub fn parse_table_map_event(data: &[u8], table_id_width: usize) -> Result<TableMapData> {
        decode("table map", || {
            let mut cursor = Cursor::new(data);

            let table_id = read_table_id(&mut cursor, table_id_width)?;
            let flags = cursor.read_u16::<LittleEndian>()?;

            let database = read_name(&mut cursor)?;
            let table = read_name(&mut cursor)?;

            // 컬럼 개수
            let column_count = read_count(&mut cursor)?;
            let type_bytes = read_bytes(&mut cursor, column_count)?;
            let column_types = type_bytes
                .iter()
                .map(|&code| {
                    ColumnType::from_u8(code).ok_or_else(|| {
                        io::Error::new(
                            io::ErrorKind::InvalidData,
                            format!("unknown column type {}", code),
                        )
                    })
                })
                .collect::<io::Result<Vec<_>>>()?;

            // Metadata
            let metadata_length = read_count(&mut cursor)?;
            let column_meta = read_bytes(&mut cursor, metadata_length)?;

            // nullable bitmap
            let nullable_bitmap = read_bytes(&mut cursor, column_count.div_ceil(8))?;

            Ok(TableMapData {
                table_id,
                flags,
                database,
                table,
                column_types,
                column_meta,
                nullable_bitmap,
            })
        })
    }

    /// 행 이벤트 헤더 부분 파싱 (v1: 23-25, v2: 30-32)
    ///
    /// 테이블 정보는 아직 비어 있으며, 팩토리가 컨텍스트에서 채웁니다.
    pub fn parse_rows_event(
        data: &[u8],
        kind: RowsKind,
        version: u8,
        table_id_width: usize,
    ) -> Result<RowsEventData> {
        decode("rows", || {
            let mut cursor = Cursor::new(data);

            let table_id = read_table_id(&mut cursor, table_id_width)?;
            let flags = cursor.read_u16::<LittleEndian>()?;

            if version == 2 {
                // extra data 길이는 자기 자신 2 바이트를 포함
                let extra_len = cursor.read_u16::<LittleEndian>()? as usize;
                read_bytes(&mut cursor, extra_len.saturating_sub(2))?;
            }

            // 컬럼 개수
            let column_count = read_count(&mut cursor)?;

            // 컬럼 존재 비트맵
            let bitmap_bytes = column_count.div_ceil(8);
            let columns_present = read_bytes(&mut cursor, bitmap_bytes)?;

            // 변경된 컬럼 비트맵
            let columns_changed = if kind == RowsKind::Update {
                Some(read_bytes(&mut cursor, bitmap_bytes)?)
            } else {
                None
            };

            let mut rows_image = Vec::new();
            cursor.read_to_end(&mut rows_image)?;

            Ok(RowsEventData {
                kind,
                version,
                table_id,
                flags,
                column_count: column_count as u64,
                columns_present,
                columns_changed,
                database: String::new(),
                table: String::new(),
                table_meta: TableMeta::new(table_id),
                rows_image,
            })
        })
    }

    /// QUERY 이벤트 파싱 (2)
    pub fn parse_query_event(data: &[u8]) -> Result<QueryEventData> {
        decode("query", || {
            let mut cursor = Cursor::new(data);

            let thread_id = cursor.read_u32::<LittleEndian>()?;
            let exec_time = cursor.read_u32::<LittleEndian>()?;
            let db_len = cursor.read_u8()? as usize;
            let error_code = cursor.read_u16::<LittleEndian>()?;
            let status_len = cursor.read_u16::<LittleEndian>()? as usize;

            // Status variables skip
            read_bytes(&mut cursor, status_len)?;

            // 데이터베이스명 + null terminator
            let db_bytes = read_bytes(&mut cursor, db_len)?;
            let database = String::from_utf8_lossy(&db_bytes).to_string();
            cursor.read_u8()?;

            // 쿼리
            let remaining = &data[cursor.position() as usize..];
            let query = String::from_utf8_lossy(remaining).to_string();

            Ok(QueryEventData {
                thread_id,
                exec_time,
                error_code,
                database,
                query,
            })
        })
    }

    /// ROTATE 이벤트 파싱 (4)
    pub fn parse_rotate_event(data: &[u8]) -> Result<RotateEventData> {
        decode("rotate", || {
            let mut cursor = Cursor::new(data);

            let position = cursor.read_u64::<LittleEndian>()?;
            let filename_bytes = &data[cursor.position() as usize..];
            let next_binlog_name = String::from_utf8_lossy(filename_bytes)
                .trim_end_matches('\0')
                .to_string();

            Ok(RotateEventData {
                next_binlog_name,
                position,
            })
        })
    }

    /// GTID / ANONYMOUS_GTID 이벤트 파싱 (33, 34)
    pub fn parse_gtid_event(data: &[u8]) -> Result<GtidEventData> {
        decode("gtid", || {
            let mut cursor = Cursor::new(data);

            let flags = cursor.read_u8()?;
            let mut uuid_bytes = [0u8; 16];
            cursor.read_exact(&mut uuid_bytes)?;
            let sid = Uuid::from_bytes(uuid_bytes);
            let gno = cursor.read_u64::<LittleEndian>()?;

            Ok(GtidEventData {
                gtid: format!("{}:{}", sid.hyphenated(), gno),
                sid,
                gno,
                committed: flags == 0,
            })
        })
    }

    /// XID 이벤트 파싱 (16)
    pub fn parse_xid_event(data: &[u8]) -> Result<XidEventData> {
        decode("xid", || {
            let mut cursor = Cursor::new(data);
            let xid = cursor.read_u64::<LittleEndian>()?;
            Ok(XidEventData { xid })
        })
    }

    /// ROWS_QUERY 이벤트 파싱 (29), 첫 바이트 길이 값은 잘려 있을 수 있어 무시
    pub fn parse_rows_query_event(data: &[u8]) -> Result<String> {
        match data.split_first() {
            Some((_, text)) => Ok(String::from_utf8_lossy(text).to_string()),
            None => Err(BinlogError::BinlogParseError(
                "rows query: empty payload".to_string(),
            )),
        }
    }
}

/// 페이로드가 짧거나 깨진 경우를 파싱 에러로 변환
fn decode<T>(what: &str, f: impl FnOnce() -> io::Result<T>) -> Result<T> {
    f().map_err(|e| BinlogError::BinlogParseError(format!("{}: {}", what, e)))
}

/// MySQL 버전 문자열로 checksum 알고리즘 바이트 존재 여부 판단
fn version_has_checksum(version: &str) -> bool {
    let mut parts = version.split('.');
    let major: u32 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    let minor: u32 = parts
        .next()
        .map(|p| p.chars().take_while(|c| c.is_ascii_digit()).collect::<String>())
        .and_then(|p| p.parse().ok())
        .unwrap_or(0);

    if version.contains("MariaDB") {
        return major > 5 || (major == 5 && minor >= 3);
    }
    major > 5 || (major == 5 && minor >= 6)
}

fn read_table_id(cursor: &mut Cursor<&[u8]>, width: usize) -> io::Result<u64> {
    if width == 4 {
        Ok(cursor.read_u32::<LittleEndian>()? as u64)
    } else {
        cursor.read_u48::<LittleEndian>()
    }
}

/// 길이 1 바이트 + 이름 + null terminator
fn read_name(cursor: &mut Cursor<&[u8]>) -> io::Result<String> {
    let len = cursor.read_u8()? as usize;
    let bytes = read_bytes(cursor, len)?;
    cursor.read_u8()?;
    Ok(String::from_utf8_lossy(&bytes).to_string())
}

/// 남은 페이로드 안에서만 `len` 바이트 읽기. 버퍼는 길이 검증 후에 할당
fn read_bytes(cursor: &mut Cursor<&[u8]>, len: usize) -> io::Result<Vec<u8>> {
    let remaining = (cursor.get_ref().len() as u64).saturating_sub(cursor.position());
    if len as u64 > remaining {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("{} bytes requested, {} left", len, remaining),
        ));
    }
    let mut bytes = vec![0u8; len];
    cursor.read_exact(&mut bytes)?;
    Ok(bytes)
}

/// LCB 길이 값을 usize로
fn read_count(cursor: &mut Cursor<&[u8]>) -> io::Result<usize> {
    let value = read_lcb(cursor)?;
    usize::try_from(value).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("length {} out of range", value),
        )
    })
}

/// LCB (Length-Coded Binary) 읽기
fn read_lcb(cursor: &mut Cursor<&[u8]>) -> io::Result<u64> {
    let byte = cursor.read_u8()?;
    match byte {
        0..=0xfa => Ok(byte as u64),
        0xfc => Ok(cursor.read_u16::<LittleEndian>()? as u64),
        0xfd => Ok(cursor.read_u24::<LittleEndian>()? as u64),
        0xfe => cursor.read_u64::<LittleEndian>(),
        _ => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Invalid LCB prefix 0x{:02x}", byte),
        )),
    }
}
