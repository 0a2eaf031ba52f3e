//! 트래버설 세션 컨텍스트
//!
//! 트래버설 하나당 하나. 드라이버만 갱신하고, 팩토리와 메타데이터 해석기는
//! 참조로 받아 읽기만 합니다. 도중에 초기화하지 않습니다.

use crate::events::{FormatDescriptionData, RotateEventData, TableMapData};

#[derive(Debug, Default, Clone)]
pub struct SessionContext {
    format_description: Option<FormatDescriptionData>,
    rotate: Option<RotateEventData>,
    table_map: Option<TableMapData>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn format_description(&self) -> Option<&FormatDescriptionData> {
        self.format_description.as_ref()
    }

    pub fn set_format_description(&mut self, event: FormatDescriptionData) {
        self.format_description = Some(event);
    }

    pub fn rotate(&self) -> Option<&RotateEventData> {
        self.rotate.as_ref()
    }

    pub fn set_rotate(&mut self, event: RotateEventData) {
        self.rotate = Some(event);
    }

    pub fn table_map(&self) -> Option<&TableMapData> {
        self.table_map.as_ref()
    }

    pub fn set_table_map(&mut self, event: TableMapData) {
        self.table_map = Some(event);
    }
}
