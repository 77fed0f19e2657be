use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use time::format_description::BorrowedFormatItem;
use time::{UtcOffset, macros::format_description};
use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::time::OffsetTime;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::InitCmd;
use crate::config::{AppConfig, ConfigError, LoggingConfig, LoggingProfile, load_config};
use crate::ledger::LedgerClient;

type LogTimeFormat = &'static [BorrowedFormatItem<'static>];

const LOG_TIME_FORMAT: LogTimeFormat =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]");

const CONFIG_TEMPLATE_NAME: &str = "memo-transfer.toml";
const CONFIG_TEMPLATE: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/memo-transfer.toml"
));

/// 初始化 tracing，兼顾 JSON 与文本输出模式。
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    if config.json {
        fmt()
            .with_timer(offset_timer(config)?)
            .with_file(false)
            .with_line_number(false)
            .with_thread_ids(false)
            .with_target(true)
            .with_level(true)
            .json()
            .with_current_span(false)
            .with_span_list(false)
            .with_env_filter(build_filter(config))
            .try_init()
            .map_err(|err| anyhow!(err.to_string()))?;
    } else {
        text_subscriber(config, std::io::stdout)?
            .try_init()
            .map_err(|err| anyhow!(err.to_string()))?;
    }
    Ok(())
}

fn offset_timer(config: &LoggingConfig) -> Result<OffsetTime<LogTimeFormat>> {
    let offset = UtcOffset::from_hms(config.timezone_offset_hours, 0, 0).map_err(|err| {
        anyhow!(
            "invalid logging timezone offset {}: {err}",
            config.timezone_offset_hours
        )
    })?;
    Ok(OffsetTime::new(offset, LOG_TIME_FORMAT))
}

/// 文本模式：compact 格式，时间戳按配置的时区偏移输出。
fn text_subscriber<W>(
    config: &LoggingConfig,
    writer: W,
) -> Result<impl Subscriber + Send + Sync + 'static>
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    Ok(fmt()
        .with_timer(offset_timer(config)?)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(true)
        .with_level(true)
        .compact()
        .with_env_filter(build_filter(config))
        .with_writer(writer)
        .finish())
}

fn build_filter(config: &LoggingConfig) -> EnvFilter {
    let mut filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));

    // Lean 模式压低 RPC 客户端的调试输出；Verbose 模式打开本项目各模块的 debug。
    let targets: &[(&str, &str)] = match config.profile {
        LoggingProfile::Lean => &[
            ("hyper", "warn"),
            ("hyper_util::client::legacy", "warn"),
            ("reqwest", "info"),
            ("solana_rpc_client", "info"),
        ],
        LoggingProfile::Verbose => &[
            ("ledger", "debug"),
            ("token", "debug"),
            ("scenario", "debug"),
        ],
    };
    for (module, level) in targets {
        if config.profile == LoggingProfile::Lean && config.level.contains(module) {
            continue;
        }
        if let Ok(directive) = format!("{module}={level}").parse() {
            filter = filter.add_directive(directive);
        }
    }
    filter
}

/// 加载主配置；用于 `memo-transfer --config` 的入口。
pub fn load_configuration(path: Option<PathBuf>) -> Result<AppConfig, ConfigError> {
    load_config(path)
}

pub fn build_ledger_client(config: &AppConfig) -> LedgerClient {
    LedgerClient::new(
        config.global.rpc_url.trim(),
        config.global.commitment.to_commitment_config(),
    )
}

/// 写出配置模版；目标文件已存在且未指定 `--force` 时跳过。
pub fn init_configs(args: InitCmd) -> Result<()> {
    let output_dir = match args.output {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    fs::create_dir_all(&output_dir)?;
    let target_path = output_dir.join(CONFIG_TEMPLATE_NAME);
    if write_template(&target_path, args.force)? {
        println!("已写入 {}", target_path.display());
    } else {
        println!(
            "跳过 {}（文件已存在，如需覆盖请加 --force）",
            target_path.display()
        );
    }
    Ok(())
}

fn write_template(target_path: &Path, force: bool) -> Result<bool> {
    if target_path.exists() && !force {
        return Ok(false);
    }
    fs::write(target_path, CONFIG_TEMPLATE)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().expect("lock").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn logged_hour(offset_hours: i8) -> u32 {
        let config = LoggingConfig {
            timezone_offset_hours: offset_hours,
            ..LoggingConfig::default()
        };
        let captured = Captured::default();
        let subscriber = text_subscriber(&config, captured.clone()).expect("subscriber");
        tracing::subscriber::with_default(subscriber, || tracing::info!("offset check"));

        let output = String::from_utf8(captured.0.lock().expect("lock").clone()).expect("utf8");
        let colon = output.find(':').expect("timestamp");
        output[colon - 2..colon].parse().expect("hour")
    }

    #[test]
    fn text_mode_honours_timezone_offset() {
        let utc = logged_hour(0);
        let shifted = logged_hour(12);
        assert_eq!((utc + 12) % 24, shifted);
    }

    #[test]
    fn template_parses_and_validates() {
        let config: AppConfig = toml::from_str(CONFIG_TEMPLATE).expect("template parses");
        config.validate().expect("template validates");
        assert_eq!(config.scenario.decimals, 9);
        assert_eq!(config.scenario.transfer_ui_amount, 1_000);
    }

    #[test]
    fn template_is_not_overwritten_without_force() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join(CONFIG_TEMPLATE_NAME);
        fs::write(&path, "# custom\n").expect("seed file");

        assert!(!write_template(&path, false).expect("write"));
        assert_eq!(fs::read_to_string(&path).expect("read"), "# custom\n");

        assert!(write_template(&path, true).expect("write"));
        assert_eq!(fs::read_to_string(&path).expect("read"), CONFIG_TEMPLATE);
    }

    #[test]
    fn verbose_profile_enables_debug_targets() {
        let config = LoggingConfig {
            profile: LoggingProfile::Verbose,
            ..LoggingConfig::default()
        };
        let rendered = build_filter(&config).to_string().to_ascii_lowercase();
        assert!(rendered.contains("scenario=debug"));
        assert!(rendered.contains("ledger=debug"));
    }

    #[test]
    fn lean_profile_respects_explicit_level() {
        let config = LoggingConfig {
            level: "info,reqwest=trace".into(),
            ..LoggingConfig::default()
        };
        let rendered = build_filter(&config).to_string().to_ascii_lowercase();
        assert!(rendered.contains("reqwest=trace"));
        assert!(!rendered.contains("reqwest=info"));
        assert!(rendered.contains("hyper=warn"));
    }
}
