//! 테스트용 binlog 바이트 생성기

use crate::binlog::EVENT_HEADER_SIZE;
use crate::events::{EventType, RowsKind};
use byteorder::{LittleEndian, WriteBytesExt};
use uuid::Uuid;

pub const SAMPLE_UUID: &str = "364e6af7-daf7-11e5-a15d-0cc47a4e0b5c";

pub fn file_header() -> Vec<u8> {
    vec![0xfe, b'b', b'i', b'n']
}

/// 헤더 + 페이로드 (+ 체크섬 자리 4 바이트)
pub fn frame(type_code: u8, timestamp: u32, next_pos: u32, payload: &[u8], checksum: bool) -> Vec<u8> {
    let trailer = if checksum { 4 } else { 0 };
    let event_length = (EVENT_HEADER_SIZE + payload.len() + trailer) as u32;

    let mut buf = Vec::new();
    buf.write_u32::<LittleEndian>(timestamp).unwrap();
    buf.write_u8(type_code).unwrap();
    buf.write_u32::<LittleEndian>(1).unwrap();
    buf.write_u32::<LittleEndian>(event_length).unwrap();
    buf.write_u32::<LittleEndian>(next_pos).unwrap();
    buf.write_u16::<LittleEndian>(0).unwrap();
    buf.extend_from_slice(payload);
    buf.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef][..trailer]);
    buf
}

pub fn fde_payload(server_version: &str, checksum_alg: u8) -> Vec<u8> {
    fde_payload_with_table_map_len(server_version, checksum_alg, 8)
}

/// 테이블 맵 post-header 길이 지정. 6이면 table id 4 바이트
pub fn fde_payload_with_table_map_len(server_version: &str, checksum_alg: u8, table_map_len: u8) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.write_u16::<LittleEndian>(4).unwrap();
    let mut version = [0u8; 50];
    version[..server_version.len()].copy_from_slice(server_version.as_bytes());
    buf.extend_from_slice(&version);
    buf.write_u32::<LittleEndian>(0).unwrap();
    buf.write_u8(EVENT_HEADER_SIZE as u8).unwrap();

    let mut post_header_lengths = vec![0u8; 39];
    post_header_lengths[EventType::TableMapEvent as usize - 1] = table_map_len;
    for code in [23usize, 24, 25] {
        post_header_lengths[code - 1] = 8;
    }
    for code in [30usize, 31, 32] {
        post_header_lengths[code - 1] = 10;
    }
    buf.extend_from_slice(&post_header_lengths);
    buf.push(checksum_alg);
    buf
}

pub fn rotate_payload(position: u64, name: &str) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.write_u64::<LittleEndian>(position).unwrap();
    buf.extend_from_slice(name.as_bytes());
    buf
}

pub fn table_map_payload(table_id: u64, database: &str, table: &str, column_types: &[u8]) -> Vec<u8> {
    table_map_payload_with_id_width(table_id, 6, database, table, column_types)
}

pub fn table_map_payload_with_id_width(
    table_id: u64,
    id_width: usize,
    database: &str,
    table: &str,
    column_types: &[u8],
) -> Vec<u8> {
    let mut buf = Vec::new();
    if id_width == 4 {
        buf.write_u32::<LittleEndian>(table_id as u32).unwrap();
    } else {
        buf.write_u48::<LittleEndian>(table_id).unwrap();
    }
    buf.write_u16::<LittleEndian>(1).unwrap();
    buf.push(database.len() as u8);
    buf.extend_from_slice(database.as_bytes());
    buf.push(0);
    buf.push(table.len() as u8);
    buf.extend_from_slice(table.as_bytes());
    buf.push(0);
    buf.push(column_types.len() as u8);
    buf.extend_from_slice(column_types);
    buf.push(column_types.len() as u8);
    buf.extend(std::iter::repeat(0u8).take(column_types.len()));
    buf.extend(std::iter::repeat(0xffu8).take(column_types.len().div_ceil(8)));
    buf
}

/// v2 행 이벤트, 모든 컬럼 present
pub fn rows_payload(table_id: u64, column_count: u8, kind: RowsKind, image: &[u8]) -> Vec<u8> {
    rows_payload_with_version(table_id, column_count, kind, image, 2)
}

/// v1 행 이벤트 (extra data 블록 없음)
pub fn rows_v1_payload(table_id: u64, column_count: u8, kind: RowsKind, image: &[u8]) -> Vec<u8> {
    rows_payload_with_version(table_id, column_count, kind, image, 1)
}

fn rows_payload_with_version(
    table_id: u64,
    column_count: u8,
    kind: RowsKind,
    image: &[u8],
    version: u8,
) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.write_u48::<LittleEndian>(table_id).unwrap();
    buf.write_u16::<LittleEndian>(1).unwrap();
    if version == 2 {
        buf.write_u16::<LittleEndian>(2).unwrap();
    }
    buf.push(column_count);

    let bitmap_len = (column_count as usize).div_ceil(8);
    let bitmap: Vec<u8> = (0..bitmap_len)
        .map(|i| {
            let bits = (column_count as usize - i * 8).min(8);
            ((1u16 << bits) - 1) as u8
        })
        .collect();
    buf.extend_from_slice(&bitmap);
    if kind == RowsKind::Update {
        buf.extend_from_slice(&bitmap);
    }
    buf.extend_from_slice(image);
    buf
}

pub fn query_payload(database: &str, query: &str) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.write_u32::<LittleEndian>(11).unwrap();
    buf.write_u32::<LittleEndian>(0).unwrap();
    buf.push(database.len() as u8);
    buf.write_u16::<LittleEndian>(0).unwrap();
    buf.write_u16::<LittleEndian>(0).unwrap();
    buf.extend_from_slice(database.as_bytes());
    buf.push(0);
    buf.extend_from_slice(query.as_bytes());
    buf
}

pub fn gtid_payload(uuid: &str, gno: u64) -> Vec<u8> {
    let mut buf = vec![0u8];
    buf.extend_from_slice(Uuid::parse_str(uuid).unwrap().as_bytes());
    buf.write_u64::<LittleEndian>(gno).unwrap();
    buf.push(2);
    buf.extend_from_slice(&[0u8; 16]);
    buf
}

pub fn xid_payload(xid: u64) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.write_u64::<LittleEndian>(xid).unwrap();
    buf
}

/// 이벤트 목록을 순서대로 이어 붙인 binlog 파일 바이트 생성
pub struct BinlogBuilder {
    bytes: Vec<u8>,
    checksum: bool,
    position: u32,
}

impl BinlogBuilder {
    pub fn new() -> Self {
        BinlogBuilder {
            bytes: file_header(),
            checksum: false,
            position: 4,
        }
    }

    pub fn with_checksum(mut self) -> Self {
        self.checksum = true;
        self
    }

    pub fn event(mut self, event_type: EventType, payload: &[u8]) -> Self {
        let trailer = if self.checksum { 4 } else { 0 };
        self.position += (EVENT_HEADER_SIZE + payload.len() + trailer) as u32;
        let bytes = frame(event_type as u8, 1_456_000_000, self.position, payload, self.checksum);
        self.bytes.extend_from_slice(&bytes);
        self
    }

    /// rotate + format description, 스트리밍 직전 상태
    pub fn primed(self) -> Self {
        let checksum_alg = u8::from(self.checksum);
        self.event(EventType::RotateEvent, &rotate_payload(4, "mysql-bin.000057"))
            .event(EventType::FormatDescriptionEvent, &fde_payload("5.7.30-log", checksum_alg))
    }

    pub fn build(self) -> Vec<u8> {
        self.bytes
    }
}
