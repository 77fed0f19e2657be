//! CLI 模块负责解析命令行参数并分发到各子命令处理逻辑。

mod runner;

pub mod context;

pub use runner::run;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "memo-transfer",
    version,
    about = "Token-2022 入账 memo 要求演示"
)]
pub struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "配置文件路径（默认查找 memo-transfer.toml 或 config/memo-transfer.toml）"
    )]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// 执行完整的 memo 转账场景（默认命令）
    Run,
    /// 读取任意 Token-2022 账户的 memo 要求标志
    Verify(VerifyCmd),
    /// 初始化配置模版文件
    Init(InitCmd),
}

#[derive(Args, Debug)]
pub struct VerifyCmd {
    #[arg(value_name = "ACCOUNT", help = "Token-2022 账户地址")]
    pub account: String,
}

#[derive(Args, Debug)]
pub struct InitCmd {
    #[arg(long, value_name = "DIR", help = "可选输出目录（默认当前目录）")]
    pub output: Option<PathBuf>,
    #[arg(long, help = "若文件存在则覆盖")]
    pub force: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_invocation_has_no_subcommand() {
        let cli = Cli::try_parse_from(["memo-transfer"]).expect("parse");
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn parses_verify_with_config() {
        let cli = Cli::try_parse_from([
            "memo-transfer",
            "--config",
            "local.toml",
            "verify",
            "11111111111111111111111111111111",
        ])
        .expect("parse");
        assert_eq!(cli.config, Some(PathBuf::from("local.toml")));
        match cli.command {
            Some(Command::Verify(cmd)) => {
                assert_eq!(cmd.account, "11111111111111111111111111111111")
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_init_flags() {
        let cli = Cli::try_parse_from(["memo-transfer", "init", "--output", "out", "--force"])
            .expect("parse");
        match cli.command {
            Some(Command::Init(cmd)) => {
                assert_eq!(cmd.output, Some(PathBuf::from("out")));
                assert!(cmd.force);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
