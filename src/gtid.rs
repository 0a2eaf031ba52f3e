//! 트래버설 중 관찰한 GTID 집합
//!
//! GTID 형식: UUID:sequence-number
//! 텍스트 형식: "uuid1:1-100:200,uuid2:1-50"

use crate::error::{BinlogError, Result};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// GTID 범위 (sequence 범위, 양 끝 포함)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct GtidRange {
    pub start: u64,
    pub end: u64,
}

impl GtidRange {
    pub fn contains(&self, gno: u64) -> bool {
        gno >= self.start && gno <= self.end
    }
}

/// 서버 UUID별 정렬 / 병합된 범위 목록
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GtidSet {
    sets: BTreeMap<Uuid, Vec<GtidRange>>,
}

impl GtidSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, sid: Uuid, gno: u64) {
        let ranges = self.sets.entry(sid).or_default();
        if ranges.iter().any(|r| r.contains(gno)) {
            return;
        }
        ranges.push(GtidRange { start: gno, end: gno });
        ranges.sort();

        // 연접한 범위 병합
        let mut merged: Vec<GtidRange> = Vec::with_capacity(ranges.len());
        for range in ranges.drain(..) {
            match merged.last_mut() {
                Some(last) if last.end.saturating_add(1) >= range.start => {
                    last.end = last.end.max(range.end);
                }
                _ => merged.push(range),
            }
        }
        *ranges = merged;
    }

    pub fn contains(&self, gtid: &str) -> bool {
        match parse_gtid(gtid) {
            Ok((sid, gno)) => self
                .sets
                .get(&sid)
                .is_some_and(|ranges| ranges.iter().any(|r| r.contains(gno))),
            Err(_) => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sets.values().all(Vec::is_empty)
    }
}

impl fmt::Display for GtidSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (sid, ranges) in &self.sets {
            if ranges.is_empty() {
                continue;
            }
            if !first {
                f.write_str(",")?;
            }
            first = false;
            write!(f, "{}", sid.hyphenated())?;
            for range in ranges {
                if range.start == range.end {
                    write!(f, ":{}", range.start)?;
                } else {
                    write!(f, ":{}-{}", range.start, range.end)?;
                }
            }
        }
        Ok(())
    }
}

fn parse_gtid(gtid: &str) -> Result<(Uuid, u64)> {
    let (sid, gno) = gtid
        .split_once(':')
        .ok_or_else(|| BinlogError::InvalidEvent(format!("Invalid GTID format: {}", gtid)))?;
    let sid = Uuid::parse_str(sid)
        .map_err(|e| BinlogError::InvalidEvent(format!("Invalid GTID uuid {}: {}", sid, e)))?;
    let gno = gno
        .parse::<u64>()
        .map_err(|_| BinlogError::InvalidEvent(format!("Invalid sequence: {}", gno)))?;
    Ok((sid, gno))
}
