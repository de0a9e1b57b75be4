//! 日志系统初始化.
//!
//! 库 crate 只通过 `log` 门面输出, 这里安装 `tracing-subscriber` 订阅器把记录
//! 写到控制台和按日期命名的日志文件 (`<prefix>.<YYYY-MM-DD>.log`).
//! 全局订阅器只能安装一次, 重复调用 [`init`] 直接返回成功.

use anyhow::{Context, Result};
use chrono::{Datelike, Duration as ChronoDuration, Local, NaiveDate, Timelike};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing_subscriber::{
    EnvFilter, Registry,
    fmt::{self, FormatEvent, FormatFields, format::Writer},
    layer::{Layer, SubscriberExt},
    registry::LookupSpan,
    util::SubscriberInitExt,
};

/// 日志配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 过滤指令, 语法同 `RUST_LOG` (如 `info`, `mft_transform=debug`)
    pub level: String,
    /// 是否输出到控制台
    pub console: bool,
    /// 日志文件目录, 为空时不写文件
    pub directory: Option<String>,
    /// 日志文件名前缀
    pub file_prefix: String,
    /// 历史日志保留天数, 初始化时清理更早的文件
    pub retention_days: i64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console: true,
            directory: None,
            file_prefix: "mft".to_string(),
            retention_days: 30,
        }
    }
}

static LOG_GUARD: OnceLock<Option<tracing_appender::non_blocking::WorkerGuard>> =
    OnceLock::new();

/// 安装全局日志订阅器
///
/// 只有第一次调用生效, 之后的调用不做任何事.
pub fn init(config: LoggingConfig) -> Result<()> {
    if LOG_GUARD.get().is_some() {
        return Ok(());
    }

    let console_layer = config.console.then(|| {
        fmt::Layer::default()
            .with_writer(std::io::stdout)
            .with_ansi(true)
            .event_format(ConsoleFormatter)
            .with_filter(EnvFilter::new(&config.level))
    });

    let mut guard = None;
    let file_layer = match config.directory.as_deref() {
        Some(directory) => {
            let directory = Path::new(directory);
            fs::create_dir_all(directory)
                .with_context(|| format!("创建日志目录失败, path={}", directory.display()))?;
            cleanup_logs(directory, &config.file_prefix, config.retention_days)?;

            let writer = CurrentFileWriter::new(directory, &config.file_prefix)?;
            let (non_blocking, worker_guard) = tracing_appender::non_blocking(writer);
            guard = Some(worker_guard);
            Some(
                fmt::Layer::default()
                    .with_writer(non_blocking)
                    .with_ansi(false)
                    .event_format(FileFormatter)
                    .with_filter(EnvFilter::new(&config.level)),
            )
        }
        None => None,
    };

    Registry::default()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("安装全局日志订阅器失败")?;

    LOG_GUARD.set(guard).ok();
    Ok(())
}

/// 写入当天日志文件, 日期变化时切换到新文件
struct CurrentFileWriter {
    directory: PathBuf,
    prefix: String,
    date: NaiveDate,
    file: File,
}

impl CurrentFileWriter {
    fn new(directory: &Path, prefix: &str) -> Result<Self> {
        let today = Local::now().date_naive();
        let file = open_append_file(&build_current_log_path(directory, prefix, today))?;
        Ok(Self {
            directory: directory.to_path_buf(),
            prefix: prefix.to_string(),
            date: today,
            file,
        })
    }

    fn reopen_if_date_changed(&mut self) -> std::io::Result<()> {
        let today = Local::now().date_naive();
        if today == self.date {
            return Ok(());
        }
        let file_path = build_current_log_path(&self.directory, &self.prefix, today);
        self.file = open_append_file(&file_path).map_err(std::io::Error::other)?;
        self.date = today;
        Ok(())
    }
}

impl Write for CurrentFileWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.reopen_if_date_changed()?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.file.flush()
    }
}

fn open_append_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("打开日志文件失败, path={}", path.display()))
}

pub(crate) fn build_current_log_path(directory: &Path, prefix: &str, date: NaiveDate) -> PathBuf {
    directory.join(format!("{}.{}.log", prefix, date.format("%Y-%m-%d")))
}

/// 删除超过保留天数的日志文件, 不认识的文件名原样保留
fn cleanup_logs(directory: &Path, prefix: &str, retention_days: i64) -> Result<()> {
    let cutoff = Local::now().date_naive() - ChronoDuration::days(retention_days);

    let entries = fs::read_dir(directory)
        .with_context(|| format!("读取日志目录失败, path={}", directory.display()))?;
    for entry in entries {
        let entry = entry?;
        let file_name = entry.file_name().to_string_lossy().to_string();
        let Some(date) = parse_log_date(&file_name, prefix) else {
            continue;
        };
        if date < cutoff {
            let _ = fs::remove_file(entry.path());
        }
    }
    Ok(())
}

fn parse_log_date(file_name: &str, prefix: &str) -> Option<NaiveDate> {
    let date_part = file_name
        .strip_prefix(prefix)?
        .strip_prefix('.')?
        .strip_suffix(".log")?;
    if date_part.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

struct ConsoleFormatter;

impl<S, N> FormatEvent<S, N> for ConsoleFormatter
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &fmt::FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let now = Local::now();
        let meta = event.metadata();
        write!(
            writer,
            "[{:02}-{:02} {:02}:{:02}:{:02}.{:03}] ",
            now.month(),
            now.day(),
            now.hour(),
            now.minute(),
            now.second(),
            now.timestamp_subsec_millis()
        )?;
        let color = match *meta.level() {
            tracing::Level::ERROR => "\x1b[31m",
            tracing::Level::WARN => "\x1b[33m",
            tracing::Level::INFO => "\x1b[32m",
            _ => "\x1b[34m",
        };
        write!(
            writer,
            "{}{:5}\x1b[0m {} > ",
            color,
            meta.level().to_string(),
            meta.target()
        )?;
        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

struct FileFormatter;

impl<S, N> FormatEvent<S, N> for FileFormatter
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &fmt::FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let now = Local::now();
        let meta = event.metadata();
        write!(
            writer,
            "[{} {:5} {}] ",
            now.format("%Y-%m-%d %H:%M:%S%.3f"),
            meta.level().to_string(),
            meta.target()
        )?;
        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_build_current_log_path() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 6);
        match date {
            Some(date) => {
                let path = build_current_log_path(Path::new("logs"), "mft", date);
                assert_eq!(path, PathBuf::from("logs/mft.2026-02-06.log"));
            }
            None => panic!("测试日期初始化失败"),
        }
    }

    #[test]
    fn test_parse_log_date() {
        assert_eq!(
            parse_log_date("mft.2026-02-06.log", "mft"),
            NaiveDate::from_ymd_opt(2026, 2, 6)
        );
        assert_eq!(parse_log_date("mft.log", "mft"), None);
        assert_eq!(parse_log_date("other.2026-02-06.log", "mft"), None);
        assert_eq!(parse_log_date("mft.2026-2-6.log", "mft"), None);
    }

    #[test]
    fn test_清理过期日志() {
        let temp_dir = match TempDir::new() {
            Ok(temp_dir) => temp_dir,
            Err(err) => panic!("创建临时目录失败: {}", err),
        };
        let dir = temp_dir.path();
        let today = Local::now().date_naive();
        let old = today - ChronoDuration::days(40);

        let old_path = build_current_log_path(dir, "mft", old);
        let today_path = build_current_log_path(dir, "mft", today);
        let unrelated = dir.join("notes.txt");
        for path in [&old_path, &today_path, &unrelated] {
            fs::write(path, b"x").unwrap();
        }

        cleanup_logs(dir, "mft", 30).unwrap();

        assert!(!old_path.exists(), "过期日志应被删除");
        assert!(today_path.exists());
        assert!(unrelated.exists());
    }

    #[test]
    fn test_日志配置默认值() {
        let config: LoggingConfig = serde_json::from_str(r#"{ "level": "debug" }"#).unwrap();
        assert_eq!(config.level, "debug");
        assert!(config.console);
        assert!(config.directory.is_none());
        assert_eq!(config.file_prefix, "mft");
        assert_eq!(config.retention_days, 30);
    }
}
