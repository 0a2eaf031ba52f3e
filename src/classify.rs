//! 디코딩된 이벤트를 의미 있는 출력 분류로 매핑
//!
//! 우선순위: GTID → ROW → XID(커밋) → BEGIN → ROLLBACK → 나머지는 출력 없음

use crate::error::Result;
use crate::events::{BinlogEvent, BinlogEventData};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 출력 이벤트 분류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventCategory {
    Gtid,
    Row,
    TransactionBegin,
    TransactionRollback,
    TransactionCommit,
}

impl EventCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::Gtid => "GTID",
            EventCategory::Row => "ROW",
            EventCategory::TransactionBegin => "TRANSACTION_BEGIN",
            EventCategory::TransactionRollback => "TRANSACTION_ROLLBACK",
            EventCategory::TransactionCommit => "TRANSACTION_COMMIT",
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 분류된 출력 (이벤트, 원본 파일 경로, 분류)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedEvent {
    pub event: BinlogEvent,
    pub source: String,
    pub category: EventCategory,
}

impl ClassifiedEvent {
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// 이벤트 분류. 같은 이벤트에 대해 항상 같은 결과
pub fn classify(event: &BinlogEvent) -> Option<EventCategory> {
    match &event.data {
        BinlogEventData::Gtid(_) => Some(EventCategory::Gtid),
        BinlogEventData::Rows(_) => Some(EventCategory::Row),
        BinlogEventData::Xid(_) => Some(EventCategory::TransactionCommit),
        BinlogEventData::Query(query) => match query.query.as_str() {
            "BEGIN" => Some(EventCategory::TransactionBegin),
            "ROLLBACK" => Some(EventCategory::TransactionRollback),
            // DDL 등
            _ => None,
        },
        BinlogEventData::FormatDescription(_)
        | BinlogEventData::Rotate(_)
        | BinlogEventData::TableMap(_)
        | BinlogEventData::AnonymousGtid(_)
        | BinlogEventData::RowsQuery(_)
        | BinlogEventData::Unknown { .. } => None,
    }
}

/// 분류된 이벤트를 받는 출력 대상
pub trait EventSink {
    fn push(&mut self, out: ClassifiedEvent) -> Result<()>;
}

impl<F> EventSink for F
where
    F: FnMut(ClassifiedEvent) -> Result<()>,
{
    fn push(&mut self, out: ClassifiedEvent) -> Result<()> {
        self(out)
    }
}
