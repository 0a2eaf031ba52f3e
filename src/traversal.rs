//! Binlog 파일 트래버설
//!
//! 진행 순서:
//! 1. 파일 헤더 검증 (0xfe + "bin")
//! 2. 포맷 디스크립션 이벤트가 나올 때까지 메타 이벤트 읽기
//! 3. 파일 끝까지 이벤트를 읽어 분류 후 출력
//!
//! 파일 끝은 정상 종료, 그 외의 모든 에러는 트래버설을 중단합니다.
//! 재시도나 이어 읽기는 없습니다.

use crate::binlog::{BinlogParser, BINLOG_MARKER, EVENT_HEADER_SIZE};
use crate::classify::{classify, ClassifiedEvent, EventCategory, EventSink};
use crate::config::ReaderConfig;
use crate::context::SessionContext;
use crate::error::{BinlogError, Result};
use crate::events::*;
use crate::factory::EventFactory;
use crate::gtid::GtidSet;
use crate::offset::{BinlogPosition, FIRST_EVENT_POSITION};
use crate::reader::{FrameReader, ReadOutcome};
use bytes::Bytes;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// 드라이버 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalState {
    Start,
    MetaPriming,
    Streaming,
    Finished,
}

/// 정상 종료 사유
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// 프레임 경계에서 파일이 끝남
    EndOfStream,
    /// 프레임 사이에서 취소됨
    Cancelled,
}

/// 트래버설 결과 요약
#[derive(Debug, Clone)]
pub struct TraversalSummary {
    pub source: String,
    pub events_read: u64,
    pub events_emitted: u64,
    pub categories: BTreeMap<EventCategory, u64>,
    pub gtid_set: GtidSet,
    /// 마지막으로 읽은 이벤트 다음 위치
    pub position: BinlogPosition,
    pub completion: Completion,
}

impl TraversalSummary {
    fn new(source: String, file_name: String) -> Self {
        TraversalSummary {
            source,
            events_read: 0,
            events_emitted: 0,
            categories: BTreeMap::new(),
            gtid_set: GtidSet::new(),
            position: BinlogPosition::new(file_name, FIRST_EVENT_POSITION),
            completion: Completion::EndOfStream,
        }
    }

    pub fn count(&self, category: EventCategory) -> u64 {
        self.categories.get(&category).copied().unwrap_or(0)
    }
}

enum Next {
    Event(BinlogEvent),
    Stop(Completion),
}

/// 한 번의 트래버설. 리더와 컨텍스트를 독점합니다.
pub struct Traversal<R> {
    reader: FrameReader<R>,
    context: SessionContext,
    source: String,
    checksum_enabled: bool,
    cancel: CancellationToken,
    state: TraversalState,
    summary: TraversalSummary,
}

impl<R: Read> Traversal<R> {
    pub fn new(inner: R, config: &ReaderConfig, cancel: CancellationToken) -> Self {
        Traversal {
            reader: FrameReader::new(inner),
            context: SessionContext::new(),
            source: config.source(),
            checksum_enabled: config.checksum_enabled,
            cancel,
            state: TraversalState::Start,
            summary: TraversalSummary::new(config.source(), config.file_name()),
        }
    }

    pub fn run<S: EventSink + ?Sized>(mut self, sink: &mut S) -> Result<TraversalSummary> {
        self.summary.completion = self.drive(sink)?;
        Ok(self.summary)
    }

    /// 상태 전이 루프. 에러는 어느 상태에서든 즉시 전파
    fn drive<S: EventSink + ?Sized>(&mut self, sink: &mut S) -> Result<Completion> {
        let mut completion = Completion::EndOfStream;
        loop {
            self.state = match self.state {
                TraversalState::Start => {
                    self.read_file_header()?;
                    TraversalState::MetaPriming
                }
                TraversalState::MetaPriming => match self.read_meta()? {
                    Some(stopped) => {
                        completion = stopped;
                        TraversalState::Finished
                    }
                    None => TraversalState::Streaming,
                },
                TraversalState::Streaming => {
                    completion = self.read_valid_events(sink)?;
                    TraversalState::Finished
                }
                TraversalState::Finished => return Ok(completion),
            };
            debug!("{}: {:?}", self.source, self.state);
        }
    }

    fn read_file_header(&mut self) -> Result<()> {
        let header = self.reader.read_prefix(1 + BINLOG_MARKER.len())?;
        if header.len() < 1 + BINLOG_MARKER.len() {
            return Err(BinlogError::FormatError(format!(
                "파일 헤더가 너무 짧습니다 ({} 바이트)",
                header.len()
            )));
        }
        BinlogParser::verify_magic_byte(header[0])?;
        BinlogParser::verify_marker(&header[1..])
    }

    /// 포맷 디스크립션 이벤트까지 읽기. 그 전에 멈추면 종료 사유 반환
    fn read_meta(&mut self) -> Result<Option<Completion>> {
        loop {
            let event = match self.next_event()? {
                Next::Event(event) => event,
                Next::Stop(completion) => {
                    warn!(
                        "{} ended before a format description event ({:?})",
                        self.source, completion
                    );
                    return Ok(Some(completion));
                }
            };

            match event.data {
                BinlogEventData::Rotate(rotate) => {
                    debug!("Rotate event: {}:{}", rotate.next_binlog_name, rotate.position);
                    self.context.set_rotate(rotate);
                }
                BinlogEventData::FormatDescription(fde) => {
                    info!(
                        "Format description: binlog v{}, server {}",
                        fde.binlog_version, fde.server_version
                    );
                    self.check_checksum(&fde);
                    self.context.set_format_description(fde);
                    return Ok(None);
                }
                _ => debug!(
                    "Skipping {:?} before format description",
                    event.header.event_type
                ),
            }
        }
    }

    fn read_valid_events<S: EventSink + ?Sized>(&mut self, sink: &mut S) -> Result<Completion> {
        loop {
            let event = match self.next_event()? {
                Next::Event(event) => event,
                Next::Stop(completion) => return Ok(completion),
            };

            // 같은 트랜잭션의 다음 행 이벤트가 새 테이블 맵을 보도록 분류 전에 갱신
            let event = match event {
                BinlogEvent {
                    data: BinlogEventData::TableMap(table_map),
                    ..
                } => {
                    info!("table name from table map event {}", table_map.full_table_name());
                    self.context.set_table_map(table_map);
                    continue;
                }
                other => other,
            };

            match &event.data {
                BinlogEventData::Rotate(rotate) => self.context.set_rotate(rotate.clone()),
                BinlogEventData::FormatDescription(fde) => {
                    self.check_checksum(fde);
                    self.context.set_format_description(fde.clone());
                }
                _ => {}
            }

            if let Some(category) = classify(&event) {
                self.emit(event, category, sink)?;
            }
        }
    }

    /// 프레임 하나 읽기. 시작한 프레임은 끝까지 읽거나 에러
    fn next_event(&mut self) -> Result<Next> {
        if self.cancel.is_cancelled() {
            info!("Traversal of {} cancelled at {}", self.source, self.summary.position);
            return Ok(Next::Stop(Completion::Cancelled));
        }

        let header_bytes = match self.reader.read_exact(EVENT_HEADER_SIZE)? {
            ReadOutcome::Data(bytes) => bytes,
            ReadOutcome::EndOfStream => return Ok(Next::Stop(Completion::EndOfStream)),
        };
        let header = BinlogParser::parse_header(&header_bytes)?;

        let operation = EventFactory::build(
            header.event_type,
            header.next_pos,
            &self.context,
            self.checksum_enabled,
        )?;
        let body_len = operation.body_len(&header)?;
        let body = match self.reader.read_exact(body_len)? {
            ReadOutcome::Data(bytes) => bytes,
            ReadOutcome::EndOfStream => {
                return Err(BinlogError::IoFailure(format!(
                    "offset {}: 헤더 뒤에 {} 바이트가 없습니다",
                    self.reader.offset(),
                    body_len
                )))
            }
        };
        let event = operation.decode(header, body)?;

        self.summary.events_read += 1;
        self.summary.position.position = u64::from(event.header.next_pos);
        Ok(Next::Event(event))
    }

    fn emit<S: EventSink + ?Sized>(
        &mut self,
        event: BinlogEvent,
        category: EventCategory,
        sink: &mut S,
    ) -> Result<()> {
        if let BinlogEventData::Gtid(gtid) = &event.data {
            self.summary.gtid_set.add(gtid.sid, gtid.gno);
        }
        *self.summary.categories.entry(category).or_insert(0) += 1;
        self.summary.events_emitted += 1;

        sink.push(ClassifiedEvent {
            event,
            source: self.source.clone(),
            category,
        })
    }

    fn check_checksum(&self, fde: &FormatDescriptionData) {
        if let Some(alg) = fde.checksum_alg {
            if (alg == 1) != self.checksum_enabled {
                warn!(
                    "Format description announces checksum algorithm {} but checksum_enabled={}",
                    alg, self.checksum_enabled
                );
            }
        }
    }
}

/// 로컬 binlog 파일 리더
pub struct BinlogFileReader {
    config: ReaderConfig,
    cancel: CancellationToken,
}

impl BinlogFileReader {
    pub fn new(config: ReaderConfig) -> Self {
        BinlogFileReader {
            config,
            cancel: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// 프레임 사이에서 확인되는 취소 토큰
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// 파일을 열어 끝까지 트래버설. 파일은 어떤 경로로 끝나든 닫힙니다.
    pub fn traverse<S: EventSink + ?Sized>(&self, sink: &mut S) -> Result<TraversalSummary> {
        let file = File::open(self.config.path()).map_err(|e| {
            BinlogError::IoFailure(format!("{} 열기 실패: {}", self.config.source(), e))
        })?;

        info!("Starting traversal of {}", self.config.source());
        Traversal::new(BufReader::new(file), &self.config, self.cancel.clone()).run(sink)
    }

    /// 에러를 로그로 보고하는 트래버설
    pub fn traversal<S: EventSink + ?Sized>(&self, sink: &mut S) -> Option<TraversalSummary> {
        match self.traverse(sink) {
            Ok(summary) => {
                info!(
                    "read to end: {} events read, {} emitted, position {}",
                    summary.events_read, summary.events_emitted, summary.position
                );
                Some(summary)
            }
            Err(e) => {
                error!("traversal error ({}): {}", e.kind(), e);
                None
            }
        }
    }

    /// blocking 스레드에서 트래버설하고 출력은 채널로 전달
    ///
    /// tokio 런타임 안에서 호출해야 합니다.
    pub fn stream(
        self,
    ) -> (
        mpsc::UnboundedReceiver<ClassifiedEvent>,
        JoinHandle<Result<TraversalSummary>>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();

        let handle = tokio::task::spawn_blocking(move || {
            let mut sink =
                |out: ClassifiedEvent| tx.send(out).map_err(|_| BinlogError::ChannelClosed);
            self.traverse(&mut sink)
        });

        (rx, handle)
    }
}

/// `stream`이 돌려준 작업의 결과 대기
pub async fn wait(handle: JoinHandle<Result<TraversalSummary>>) -> Result<TraversalSummary> {
    handle
        .await
        .map_err(|e| BinlogError::TaskFailed(e.to_string()))?
}
