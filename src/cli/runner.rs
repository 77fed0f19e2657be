use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{Result, anyhow};
use solana_sdk::pubkey::Pubkey;
use tracing::{info, warn};

use crate::cli::context::{build_ledger_client, init_configs};
use crate::cli::{Cli, Command, VerifyCmd};
use crate::config::AppConfig;
use crate::config::wallet::load_payer;
use crate::ledger::LedgerClient;
use crate::scenario::ScenarioRunner;
use crate::token::state::read_memo_required;

/// 场景运行的失败已在最终行输出，只通过退出码向上传递；其余命令的错误照常返回。
pub async fn run(cli: Cli, config: AppConfig) -> Result<ExitCode> {
    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            let result = run_scenario(config).await;
            match &result {
                Ok(()) => println!("{}", final_line(&result)),
                Err(_) => eprintln!("{}", final_line(&result)),
            }
            Ok(if result.is_ok() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Verify(args) => {
            let ledger = build_ledger_client(&config);
            verify_account(&ledger, &args).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Init(args) => {
            init_configs(args)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn final_line(result: &Result<()>) -> String {
    match result {
        Ok(()) => "🎉 - Demo complete.".to_string(),
        Err(err) => format!("⚠️ - Demo failed: {err:#}"),
    }
}

async fn run_scenario(config: AppConfig) -> Result<()> {
    let ledger = build_ledger_client(&config);
    let payer = load_payer(&config.wallet)?;
    let runner = ScenarioRunner::new(ledger, config.scenario, payer);

    let report = tokio::select! {
        res = runner.run() => res?,
        _ = tokio::signal::ctrl_c() => {
            info!(target: "scenario", "收到终止信号，停止运行");
            return Err(anyhow!("运行被中断"));
        }
    };

    if !report.all_passed() {
        warn!(
            target: "scenario",
            passed = report.passed(),
            failed = report.failed().len(),
            "部分检查未通过"
        );
    }
    Ok(())
}

async fn verify_account(ledger: &LedgerClient, args: &VerifyCmd) -> Result<()> {
    let account = Pubkey::from_str(args.account.trim())
        .map_err(|err| anyhow!("账户地址无效 {}: {err}", args.account))?;
    let required = read_memo_required(ledger, &account).await?;
    let label = if required { "required" } else { "NOT required" };
    println!("🔎 - {account}: incoming transfer memo {label}.");
    Ok(())
}
