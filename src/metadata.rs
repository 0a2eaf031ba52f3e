//! 테이블 메타데이터 해석
//!
//! 실제 카탈로그를 조회하지 않고, 가장 최근 테이블 맵 이벤트의 컬럼 타입으로
//! 컬럼 정의를 만들어 냅니다. 컬럼명은 위치 기반의 `@0`, `@1`, ...입니다.

use crate::context::SessionContext;
use crate::error::{BinlogError, Result};
use crate::events::ColumnType;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// 값 해석용 문자셋 분류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Charset {
    Utf8,
    Binary,
}

impl Charset {
    /// 문자열 / blob 계열은 텍스트, 나머지는 바이너리
    pub fn for_column(column_type: ColumnType) -> Self {
        match column_type {
            ColumnType::Varchar
            | ColumnType::String
            | ColumnType::VarString
            | ColumnType::Blob
            | ColumnType::LongBlob
            | ColumnType::MediumBlob => Charset::Utf8,
            _ => Charset::Binary,
        }
    }
}

/// 컬럼 정의
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub column_type: ColumnType,
    pub name: String,
    pub charset: Charset,
}

/// 테이블 메타데이터
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMeta {
    pub table_id: u64,
    pub columns: Vec<ColumnDefinition>,
}

impl TableMeta {
    pub fn new(table_id: u64) -> Self {
        TableMeta {
            table_id,
            columns: Vec::new(),
        }
    }

    pub fn add_column(&mut self, column: ColumnDefinition) {
        self.columns.push(column);
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

/// 행 이벤트 디코딩 중 호출되는 테이블 메타데이터 제공자
pub trait TableMetaProvider {
    fn table_meta(&self, table_id: u64, schema_name: &str, table_name: &str) -> Result<TableMeta>;
}

impl TableMetaProvider for SessionContext {
    /// 스키마명 / 테이블명은 받기만 하고 구분에는 쓰지 않습니다.
    /// 한 번에 하나의 테이블 맵만 활성 상태라고 가정합니다.
    fn table_meta(&self, table_id: u64, _schema_name: &str, _table_name: &str) -> Result<TableMeta> {
        let table_map = self.table_map().ok_or_else(|| {
            BinlogError::ProtocolError(format!(
                "table id {}: 테이블 맵 이벤트 없이 행 이벤트를 디코딩할 수 없습니다",
                table_id
            ))
        })?;

        if table_map.table_id != table_id {
            warn!(
                "Row event table id {} differs from active table map {} ({})",
                table_id,
                table_map.table_id,
                table_map.full_table_name()
            );
        }

        let mut meta = TableMeta::new(table_id);
        for (index, &column_type) in table_map.column_types.iter().enumerate() {
            meta.add_column(ColumnDefinition {
                column_type,
                name: format!("@{}", index),
                charset: Charset::for_column(column_type),
            });
        }

        Ok(meta)
    }
}
