/// 로컬 binlog 파일 트래버설
///
/// BINLOG_PATH 파일을 끝까지 읽고 분류된 이벤트를 로그로 출력합니다.
use binlog_file_reader::events::BinlogEventData;
use binlog_file_reader::traversal::wait;
use binlog_file_reader::{BinlogFileReader, ClassifiedEvent, EventCategory, ReaderConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 로깅 초기화
    tracing_subscriber::fmt::init();

    let config = ReaderConfig::from_env();
    info!(
        "Reading {} (checksum: {})",
        config.source(),
        config.checksum_enabled
    );

    let reader = BinlogFileReader::new(config);
    let cancel = reader.cancellation_token();
    let (mut rx, handle) = reader.stream();

    // Ctrl-C는 다음 프레임 경계에서 중단
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    while let Some(out) = rx.recv().await {
        output(&out);
    }

    match wait(handle).await {
        Ok(summary) => {
            info!(
                "read to end ({:?}): {} events, {} emitted, gtid set {}",
                summary.completion, summary.events_read, summary.events_emitted, summary.gtid_set
            );
            Ok(())
        }
        Err(e) => {
            error!("traversal error: {}", e);
            Err(e.into())
        }
    }
}

fn output(out: &ClassifiedEvent) {
    match (&out.category, &out.event.data) {
        (EventCategory::Gtid, BinlogEventData::Gtid(gtid)) => {
            info!("gtid is {}", gtid.gtid);
        }
        (EventCategory::Row, BinlogEventData::Rows(rows)) => {
            info!("row data table name is {}", rows.full_table_name());
        }
        (category, _) => {
            info!("event type is {} at {}", category, out.event.occurred_at());
        }
    }
}
