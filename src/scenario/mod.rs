//! memo 转账要求的端到端演示场景。
//!
//! 步骤严格串行：每一步都依赖上一步已确认的链上状态。准备阶段（空投、
//! 建 Mint、建账户、铸币、开关 memo 要求）失败即终止；转账步骤的结果
//! 只做分类与报告，不影响后续步骤。

pub mod outcome;
pub mod report;

use anyhow::{Context, Result, anyhow, ensure};
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use tracing::info;

use crate::config::ScenarioConfig;
use crate::ledger::{LedgerClient, SubmitOutcome};
use crate::token::{instructions, state};

use self::outcome::{Expectation, RejectReason, Verdict, classify};
use self::report::Report;

/// 一次运行内使用的全部身份，运行结束即丢弃。
pub struct Identities {
    pub payer: Keypair,
    pub mint_authority: Keypair,
    pub owner: Keypair,
    pub destination: Keypair,
    pub mint: Keypair,
}

impl Identities {
    pub fn generate(payer: Keypair) -> Self {
        Self {
            payer,
            mint_authority: Keypair::new(),
            owner: Keypair::new(),
            destination: Keypair::new(),
            mint: Keypair::new(),
        }
    }
}

/// 场景内已确认的地址与复用的转账指令。
struct Prepared {
    mint: Pubkey,
    destination: Pubkey,
    transfer: Instruction,
    transfer_amount: u64,
}

const REJECTED_WITHOUT_MEMO: &str = "Transaction failed without memo (memo is required).";
const REJECTED_AFTER_REENABLE: &str =
    "Transaction failed without memo after re-enabling (memo is required).";

/// 准备阶段之后的转账与开关步骤。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransferStep {
    RejectWithoutMemo(&'static str),
    AcceptWithMemo,
    AcceptWithoutMemo,
    ExpectBalance(u64),
    Toggle(bool),
    VerifyFlag(bool),
}

/// 6 - 11 的执行顺序；`recheck_after_enable` 决定是否追加第 11 步。
fn transfer_steps(config: &ScenarioConfig) -> Vec<TransferStep> {
    use TransferStep::*;

    let mut steps = vec![
        RejectWithoutMemo(REJECTED_WITHOUT_MEMO),
        AcceptWithMemo,
        ExpectBalance(1),
        Toggle(false),
        AcceptWithoutMemo,
        ExpectBalance(2),
        VerifyFlag(false),
        Toggle(true),
        VerifyFlag(true),
    ];
    if config.recheck_after_enable {
        steps.extend([RejectWithoutMemo(REJECTED_AFTER_REENABLE), ExpectBalance(2)]);
    }
    steps
}

fn toggle_message(enable: bool) -> &'static str {
    if enable {
        "Memo requirement re-enabled."
    } else {
        "Memo requirement disabled by owner."
    }
}

pub struct ScenarioRunner {
    ledger: LedgerClient,
    config: ScenarioConfig,
    ids: Identities,
    report: Report,
}

impl ScenarioRunner {
    pub fn new(ledger: LedgerClient, config: ScenarioConfig, payer: Keypair) -> Self {
        Self {
            ledger,
            config,
            ids: Identities::generate(payer),
            report: Report::default(),
        }
    }

    pub async fn run(mut self) -> Result<Report> {
        info!(
            target: "scenario",
            rpc = %self.ledger.url(),
            commitment = ?self.ledger.commitment().commitment,
            payer = %self.ids.payer.pubkey(),
            "开始执行 memo 转账场景"
        );

        self.fund_payer().await?;
        let mint = self.create_mint().await?;
        let destination = self.create_destination(&mint).await?;
        let prepared = self.fund_source(mint, destination).await?;

        for step in transfer_steps(&self.config) {
            self.execute(&prepared, step).await?;
        }

        self.report.print_summary();
        Ok(self.report)
    }

    async fn execute(&mut self, prepared: &Prepared, step: TransferStep) -> Result<()> {
        match step {
            TransferStep::RejectWithoutMemo(pass) => {
                self.transfer_without_memo_rejected(prepared, pass).await
            }
            TransferStep::AcceptWithMemo => self.transfer_with_memo(prepared).await,
            TransferStep::AcceptWithoutMemo => self.transfer_without_memo_accepted(prepared).await,
            TransferStep::ExpectBalance(transfers) => self.expect_balance(prepared, transfers).await,
            TransferStep::Toggle(enable) => self.toggle_requirement(prepared, enable).await,
            TransferStep::VerifyFlag(expected) => self.verify_flag(prepared, expected).await,
        }
    }

    /// 1 - 为付款钱包申请空投。
    async fn fund_payer(&mut self) -> Result<()> {
        let lamports = self.config.airdrop_lamports;
        if lamports == 0 {
            info!(target: "scenario", "airdrop_lamports=0，跳过空投");
            return Ok(());
        }
        let payer = self.ids.payer.pubkey();
        self.ledger
            .airdrop(&payer, lamports)
            .await
            .with_context(|| format!("为 {payer} 申请空投失败"))?;
        self.report.pass(format!("Payer {payer} funded with {lamports} lamports."));
        Ok(())
    }

    /// 2 - 创建 Token-2022 Mint。
    async fn create_mint(&mut self) -> Result<Pubkey> {
        let space = instructions::mint_len()?;
        let rent = self.ledger.minimum_balance_for_rent_exemption(space).await?;
        let mint = self.ids.mint.pubkey();
        let ixs = instructions::create_mint(
            &self.ids.payer.pubkey(),
            &mint,
            &self.ids.mint_authority.pubkey(),
            self.config.decimals,
            rent,
            space,
        )?;
        let signature = self
            .ledger
            .send(&ixs, &self.ids.payer, &[&self.ids.mint])
            .await
            .context("创建 Mint 失败")?;
        info!(target: "scenario", mint = %mint, signature = %signature, "Mint 已创建");
        self.report.pass(format!("Mint {mint} created."));
        Ok(mint)
    }

    /// 3 - 在同一笔交易里分配、初始化目标账户并开启 memo 要求。
    async fn create_destination(&mut self, mint: &Pubkey) -> Result<Pubkey> {
        let space = instructions::memo_account_len()?;
        let rent = self.ledger.minimum_balance_for_rent_exemption(space).await?;
        let destination = self.ids.destination.pubkey();
        let ixs = instructions::create_memo_required_account(
            &self.ids.payer.pubkey(),
            &destination,
            mint,
            &self.ids.owner.pubkey(),
            rent,
            space,
        )?;
        let signature = self
            .ledger
            .send(&ixs, &self.ids.payer, &[&self.ids.owner, &self.ids.destination])
            .await
            .context("创建目标账户失败")?;
        info!(
            target: "scenario",
            account = %destination,
            signature = %signature,
            "目标账户已创建并开启 memo 要求"
        );

        let required = state::read_memo_required(&self.ledger, &destination).await?;
        self.report.check(
            required,
            format!("Destination {destination} created with memo requirement enabled."),
            format!("Destination {destination} created but memo requirement reads false."),
        );
        Ok(destination)
    }

    /// 4 - 创建源账户并铸币；5 - 构造复用的转账指令。
    async fn fund_source(&mut self, mint: Pubkey, destination: Pubkey) -> Result<Prepared> {
        let transfer_amount = self
            .config
            .transfer_amount()
            .ok_or_else(|| anyhow!("转账数量溢出"))?;
        let mint_amount = self
            .config
            .mint_amount()
            .ok_or_else(|| anyhow!("铸造数量溢出"))?;

        let payer = self.ids.payer.pubkey();
        let (source, create_ix) = instructions::create_source_account(&payer, &payer, &mint);
        self.ledger
            .send(&[create_ix], &self.ids.payer, &[])
            .await
            .context("创建源关联账户失败")?;

        let mint_ix = instructions::mint_to(
            &mint,
            &source,
            &self.ids.mint_authority.pubkey(),
            mint_amount,
        )?;
        self.ledger
            .send(&[mint_ix], &self.ids.payer, &[&self.ids.mint_authority])
            .await
            .context("铸币到源账户失败")?;
        self.report
            .pass(format!("Minted {mint_amount} base units to source {source}."));

        let decimals = state::read_mint_decimals(&self.ledger, &mint).await?;
        ensure!(
            decimals == self.config.decimals,
            "Mint 精度 {decimals} 与配置 {} 不一致",
            self.config.decimals
        );

        let transfer = instructions::transfer_checked(
            &source,
            &mint,
            &destination,
            &payer,
            transfer_amount,
            decimals,
        )?;

        Ok(Prepared {
            mint,
            destination,
            transfer,
            transfer_amount,
        })
    }

    /// 6 / 11 - 不带 memo 的转账应因缺少 memo 被拒绝。
    async fn transfer_without_memo_rejected(
        &mut self,
        prepared: &Prepared,
        pass_message: &str,
    ) -> Result<()> {
        let outcome = self
            .ledger
            .submit(std::slice::from_ref(&prepared.transfer), &self.ids.payer, &[])
            .await?;
        self.record_transfer(
            &outcome,
            Expectation::Reject(RejectReason::MissingMemo),
            pass_message,
        );
        Ok(())
    }

    /// 7 - memo 指令紧跟转账指令，应成功。
    async fn transfer_with_memo(&mut self, prepared: &Prepared) -> Result<()> {
        let ixs = [instructions::memo(&self.config.memo), prepared.transfer.clone()];
        let outcome = self.ledger.submit(&ixs, &self.ids.payer, &[]).await?;
        self.record_transfer(
            &outcome,
            Expectation::Accept,
            "Successful transaction with memo (memo is required).",
        );
        Ok(())
    }

    /// 9 - 关闭要求后，不带 memo 的转账应成功。
    async fn transfer_without_memo_accepted(&mut self, prepared: &Prepared) -> Result<()> {
        let outcome = self
            .ledger
            .submit(std::slice::from_ref(&prepared.transfer), &self.ids.payer, &[])
            .await?;
        self.record_transfer(
            &outcome,
            Expectation::Accept,
            "Successful transaction without memo (memo is NOT required).",
        );
        Ok(())
    }

    fn record_transfer(&mut self, outcome: &SubmitOutcome, expectation: Expectation, pass: &str) {
        let verdict = classify(outcome, expectation);
        if verdict.passed() {
            self.report.pass(pass);
            return;
        }
        match (verdict, outcome) {
            (Verdict::UnexpectedAccept, SubmitOutcome::Accepted(signature)) => {
                self.report
                    .fail(format!("This should have failed, but didn't. Tx: {signature}"));
            }
            (Verdict::UnexpectedReject(reason), SubmitOutcome::Rejected(rejection)) => {
                let label = match expectation {
                    Expectation::Accept => "Tx failed unexpectedly",
                    Expectation::Reject(_) => "Unexpected error",
                };
                self.report.fail(format!("{label} ({reason:?}): {rejection}"));
            }
            (verdict, _) => {
                self.report.fail(format!("Unclassified transfer result: {verdict:?}"));
            }
        }
    }

    async fn expect_balance(&mut self, prepared: &Prepared, transfers: u64) -> Result<()> {
        let expected = prepared
            .transfer_amount
            .checked_mul(transfers)
            .ok_or_else(|| anyhow!("预期余额溢出"))?;
        let balance = state::read_token_balance(&self.ledger, &prepared.destination).await?;
        self.report.check(
            balance == expected,
            format!("Destination balance is {balance}."),
            format!("Destination balance is {balance}, expected {expected}."),
        );
        Ok(())
    }

    /// 8 / 10 - 由账户 owner 签名切换 memo 要求。
    async fn toggle_requirement(&mut self, prepared: &Prepared, enable: bool) -> Result<()> {
        let owner = self.ids.owner.pubkey();
        let ix = if enable {
            instructions::enable_required_memo(&prepared.destination, &owner)?
        } else {
            instructions::disable_required_memo(&prepared.destination, &owner)?
        };
        let signature = self
            .ledger
            .send(&[ix], &self.ids.payer, &[&self.ids.owner])
            .await
            .with_context(|| {
                let action = if enable { "开启" } else { "关闭" };
                format!("{action} memo 要求失败")
            })?;
        info!(
            target: "scenario",
            account = %prepared.destination,
            mint = %prepared.mint,
            enable,
            signature = %signature,
            "memo 要求已切换"
        );
        self.report.pass(toggle_message(enable));
        Ok(())
    }

    /// 10 - 直接读取账户状态确认标志。
    async fn verify_flag(&mut self, prepared: &Prepared, expected: bool) -> Result<()> {
        let required = state::read_memo_required(&self.ledger, &prepared.destination).await?;
        let (pass, fail) = if expected {
            (
                "Memo requirement enabled.",
                "Something's wrong. Expected memo to be required.",
            )
        } else {
            (
                "Memo requirement disabled.",
                "Something's wrong. Expected memo requirement to be disabled.",
            )
        };
        self.report.check(required == expected, pass, fail);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use solana_commitment_config::CommitmentConfig;
    use solana_sdk::instruction::InstructionError;
    use solana_sdk::signature::Signature;
    use solana_sdk::transaction::TransactionError;
    use spl_token_2022::error::TokenError;

    use crate::ledger::Rejection;

    fn offline_runner(config: ScenarioConfig) -> ScenarioRunner {
        let ledger = LedgerClient::new("http://127.0.0.1:1", CommitmentConfig::confirmed());
        ScenarioRunner::new(ledger, config, Keypair::new())
    }

    fn rejected(error: InstructionError) -> SubmitOutcome {
        SubmitOutcome::Rejected(Rejection {
            error: Some(TransactionError::InstructionError(0, error)),
            ..Rejection::default()
        })
    }

    fn no_memo() -> SubmitOutcome {
        rejected(InstructionError::Custom(TokenError::NoMemo as u32))
    }

    fn insufficient_funds() -> SubmitOutcome {
        rejected(InstructionError::Custom(TokenError::InsufficientFunds as u32))
    }

    #[test]
    fn identities_are_distinct_and_keep_payer() {
        let payer = Keypair::new();
        let payer_pubkey = payer.pubkey();
        let ids = Identities::generate(payer);

        assert_eq!(ids.payer.pubkey(), payer_pubkey);
        let unique: HashSet<Pubkey> = [
            ids.payer.pubkey(),
            ids.mint_authority.pubkey(),
            ids.owner.pubkey(),
            ids.destination.pubkey(),
            ids.mint.pubkey(),
        ]
        .into_iter()
        .collect();
        assert_eq!(unique.len(), 5);
    }

    #[tokio::test]
    async fn expected_outcomes_are_reported_as_passes() {
        let mut runner = offline_runner(ScenarioConfig::default());
        runner.record_transfer(
            &no_memo(),
            Expectation::Reject(RejectReason::MissingMemo),
            REJECTED_WITHOUT_MEMO,
        );
        runner.record_transfer(
            &SubmitOutcome::Accepted(Signature::default()),
            Expectation::Accept,
            "accepted",
        );

        assert_eq!(runner.report.passed(), 2);
        assert!(runner.report.all_passed());
    }

    #[tokio::test]
    async fn acceptance_of_memoless_transfer_names_the_signature() {
        let mut runner = offline_runner(ScenarioConfig::default());
        let signature = Signature::from([7u8; 64]);
        runner.record_transfer(
            &SubmitOutcome::Accepted(signature),
            Expectation::Reject(RejectReason::MissingMemo),
            REJECTED_WITHOUT_MEMO,
        );

        assert_eq!(runner.report.passed(), 0);
        assert_eq!(
            runner.report.failed(),
            &[format!("This should have failed, but didn't. Tx: {signature}")]
        );
    }

    #[tokio::test]
    async fn rejection_for_other_reason_is_unexpected_error() {
        let mut runner = offline_runner(ScenarioConfig::default());
        runner.record_transfer(
            &insufficient_funds(),
            Expectation::Reject(RejectReason::MissingMemo),
            REJECTED_WITHOUT_MEMO,
        );

        assert_eq!(runner.report.passed(), 0);
        let failed = runner.report.failed();
        assert_eq!(failed.len(), 1);
        assert!(failed[0].starts_with("Unexpected error (Other): "), "{}", failed[0]);
    }

    #[tokio::test]
    async fn rejection_of_expected_acceptance_keeps_reason() {
        let mut runner = offline_runner(ScenarioConfig::default());
        runner.record_transfer(&no_memo(), Expectation::Accept, "accepted");

        assert_eq!(runner.report.passed(), 0);
        let failed = runner.report.failed();
        assert_eq!(failed.len(), 1);
        assert!(
            failed[0].starts_with("Tx failed unexpectedly (MissingMemo): "),
            "{}",
            failed[0]
        );
    }

    #[test]
    fn recheck_step_follows_config() {
        let mut config = ScenarioConfig::default();
        config.recheck_after_enable = true;
        let with_recheck = transfer_steps(&config);
        assert_eq!(
            &with_recheck[with_recheck.len() - 2..],
            &[
                TransferStep::RejectWithoutMemo(REJECTED_AFTER_REENABLE),
                TransferStep::ExpectBalance(2),
            ]
        );

        config.recheck_after_enable = false;
        let without_recheck = transfer_steps(&config);
        assert_eq!(without_recheck.len(), with_recheck.len() - 2);
        assert_eq!(without_recheck.last(), Some(&TransferStep::VerifyFlag(true)));
        assert!(
            !without_recheck.contains(&TransferStep::RejectWithoutMemo(REJECTED_AFTER_REENABLE))
        );
    }

    #[test]
    fn requirement_is_disabled_before_memoless_acceptance() {
        let steps = transfer_steps(&ScenarioConfig::default());
        let position = |step: TransferStep| steps.iter().position(|s| *s == step);

        assert_eq!(steps[0], TransferStep::RejectWithoutMemo(REJECTED_WITHOUT_MEMO));
        assert!(position(TransferStep::Toggle(false)) < position(TransferStep::AcceptWithoutMemo));
        assert!(position(TransferStep::VerifyFlag(false)) < position(TransferStep::Toggle(true)));
        assert_ne!(toggle_message(true), toggle_message(false));
    }
}
