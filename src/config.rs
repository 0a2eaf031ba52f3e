//! Binlog 파일 리더 설정

use std::env;
use std::path::{Path, PathBuf};

/// 파일 리더 설정
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderConfig {
    /// 읽을 binlog 파일 경로
    pub path: PathBuf,
    /// 각 이벤트 끝에 CRC32 4 바이트가 붙어 있는지
    pub checksum_enabled: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        ReaderConfig {
            path: PathBuf::from("mysql-bin.000001"),
            checksum_enabled: false,
        }
    }
}

impl ReaderConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ReaderConfig {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_checksum(mut self, checksum_enabled: bool) -> Self {
        self.checksum_enabled = checksum_enabled;
        self
    }

    /// 환경 변수에서 설정 읽기 (BINLOG_PATH, BINLOG_CHECKSUM)
    pub fn from_env() -> Self {
        let defaults = ReaderConfig::default();
        ReaderConfig {
            path: env::var("BINLOG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.path),
            checksum_enabled: env::var("BINLOG_CHECKSUM")
                .ok()
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.checksum_enabled),
        }
    }

    /// 출력의 source 식별자로 쓰는 경로 문자열
    pub fn source(&self) -> String {
        self.path.display().to_string()
    }

    /// rotate 이벤트가 없을 때 쓰는 binlog 파일명
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| self.source())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" | "crc32" => Some(true),
        "0" | "false" | "no" | "off" | "none" => Some(false),
        _ => None,
    }
}
