//! 日志系统集成测试.
//!
//! 全局订阅器在一个进程内只能安装一次, 所以所有断言放在同一个测试里.

use std::fs;
use std::time::Duration;

use mft::config::Config;
use mft::logging::{LoggingConfig, init};
use tempfile::TempDir;

#[test]
fn test_日志写入当天文件且重复初始化无副作用() {
    let temp_dir = match TempDir::new() {
        Ok(temp_dir) => temp_dir,
        Err(err) => panic!("创建临时目录失败: {}", err),
    };
    let log_dir = temp_dir.path().join("logs");

    let config = LoggingConfig {
        level: "debug".to_string(),
        console: false,
        directory: Some(log_dir.to_string_lossy().to_string()),
        file_prefix: "mft-test".to_string(),
        retention_days: 7,
    };
    let result = init(config.clone());
    assert!(result.is_ok(), "日志系统初始化失败: {:?}", result.err());
    assert!(log_dir.exists(), "日志目录应该被创建");

    // 第二次初始化直接返回成功
    assert!(init(config).is_ok());

    tracing::info!("tracing 信息日志");
    log::warn!("log 门面警告日志");
    tracing::trace!("低于过滤级别的日志");

    // 文件层经由后台线程写入
    std::thread::sleep(Duration::from_millis(200));

    let today = chrono::Local::now().date_naive();
    let log_path = log_dir.join(format!("mft-test.{}.log", today.format("%Y-%m-%d")));
    let content = fs::read_to_string(&log_path).unwrap_or_default();
    assert!(content.contains("tracing 信息日志"), "日志内容: {content}");
    assert!(content.contains("log 门面警告日志"), "日志内容: {content}");
    assert!(!content.contains("低于过滤级别的日志"));
    assert!(content.contains("WARN"));
}

#[test]
fn test_从文件加载配置() {
    let temp_dir = match TempDir::new() {
        Ok(temp_dir) => temp_dir,
        Err(err) => panic!("创建临时目录失败: {}", err),
    };
    let path = temp_dir.path().join("mft.json");
    fs::write(
        &path,
        r#"{
            "logging": { "level": "warn", "directory": "logs", "retention_days": 3 },
            "transform": { "log_truncation": false }
        }"#,
    )
    .unwrap();

    let config = Config::from_file(&path).unwrap();
    assert_eq!(config.logging.level, "warn");
    assert_eq!(config.logging.directory.as_deref(), Some("logs"));
    assert_eq!(config.logging.retention_days, 3);
    assert!(!config.transform.log_truncation);
    assert_eq!(config.transform.audio_output_buffer_size, 192_000);
}
