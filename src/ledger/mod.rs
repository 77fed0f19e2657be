//! 对 Solana RPC 的薄封装：统一 commitment、签名与确认流程。

pub mod error;
pub mod outcome;

use std::sync::Arc;

use solana_client::nonblocking::rpc_client::RpcClient;
use solana_commitment_config::CommitmentConfig;
use solana_sdk::account::Account;
use solana_sdk::hash::Hash;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature, Signer};
use solana_sdk::transaction::{Transaction, TransactionError};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub use error::{LedgerError, LedgerResult};
pub use outcome::{Rejection, SubmitOutcome};

#[derive(Clone)]
pub struct LedgerClient {
    rpc: Arc<RpcClient>,
    commitment: CommitmentConfig,
    last_blockhash: Arc<Mutex<Option<Hash>>>,
}

impl LedgerClient {
    pub fn new(url: impl Into<String>, commitment: CommitmentConfig) -> Self {
        let rpc = RpcClient::new_with_commitment(url.into(), commitment);
        Self {
            rpc: Arc::new(rpc),
            commitment,
            last_blockhash: Arc::new(Mutex::new(None)),
        }
    }

    pub fn url(&self) -> String {
        self.rpc.url()
    }

    pub fn commitment(&self) -> CommitmentConfig {
        self.commitment
    }

    /// 申请空投并阻塞到达到配置的 commitment。
    pub async fn airdrop(&self, recipient: &Pubkey, lamports: u64) -> LedgerResult<Signature> {
        let signature = self.rpc.request_airdrop(recipient, lamports).await?;
        debug!(
            target: "ledger",
            recipient = %recipient,
            lamports,
            signature = %signature,
            "空投已提交，等待确认"
        );
        self.rpc
            .poll_for_signature_with_commitment(&signature, self.commitment)
            .await?;
        let status = self
            .rpc
            .get_signature_status_with_commitment(&signature, self.commitment)
            .await?;
        ensure_landed(&signature, status)?;
        info!(target: "ledger", recipient = %recipient, lamports, "空投已确认");
        Ok(signature)
    }

    pub async fn minimum_balance_for_rent_exemption(&self, len: usize) -> LedgerResult<u64> {
        Ok(self.rpc.get_minimum_balance_for_rent_exemption(len).await?)
    }

    pub async fn get_account(&self, address: &Pubkey) -> LedgerResult<Account> {
        self.rpc
            .get_account_with_commitment(address, self.commitment)
            .await?
            .value
            .ok_or(LedgerError::AccountNotFound(*address))
    }

    /// 发送交易并等待确认；任何失败都向上传播。
    pub async fn send(
        &self,
        instructions: &[Instruction],
        payer: &Keypair,
        extra_signers: &[&Keypair],
    ) -> LedgerResult<Signature> {
        let tx = self.sign(instructions, payer, extra_signers).await?;
        let signature = self.rpc.send_and_confirm_transaction(&tx).await?;
        debug!(target: "ledger", signature = %signature, "交易已确认");
        Ok(signature)
    }

    /// 发送交易并把网络拒绝转换为 [`SubmitOutcome::Rejected`]，供调用方分类。
    pub async fn submit(
        &self,
        instructions: &[Instruction],
        payer: &Keypair,
        extra_signers: &[&Keypair],
    ) -> LedgerResult<SubmitOutcome> {
        let tx = self.sign(instructions, payer, extra_signers).await?;
        match self.rpc.send_and_confirm_transaction(&tx).await {
            Ok(signature) => {
                debug!(target: "ledger", signature = %signature, "交易已确认");
                Ok(SubmitOutcome::Accepted(signature))
            }
            Err(err) => {
                let rejection = Rejection::from_client_error(&err);
                warn!(target: "ledger", error = %err, "交易被拒绝");
                Ok(SubmitOutcome::Rejected(rejection))
            }
        }
    }

    async fn sign(
        &self,
        instructions: &[Instruction],
        payer: &Keypair,
        extra_signers: &[&Keypair],
    ) -> LedgerResult<Transaction> {
        if instructions.is_empty() {
            return Err(LedgerError::Transaction("交易指令不能为空".into()));
        }
        let blockhash = self.fresh_blockhash().await?;
        let mut signer_refs: Vec<&dyn Signer> = Vec::with_capacity(1 + extra_signers.len());
        signer_refs.push(payer);
        for signer in extra_signers {
            signer_refs.push(*signer);
        }
        let mut tx = Transaction::new_with_payer(instructions, Some(&payer.pubkey()));
        tx.try_sign(&signer_refs, blockhash)
            .map_err(|err| LedgerError::Transaction(format!("交易签名失败: {err}")))?;
        Ok(tx)
    }

    /// 每笔交易使用与上一笔不同的 blockhash，重复提交的同一转账不会被判为已处理。
    async fn fresh_blockhash(&self) -> LedgerResult<Hash> {
        let mut last = self.last_blockhash.lock().await;
        let blockhash = match *last {
            Some(previous) => self.rpc.get_new_latest_blockhash(&previous).await?,
            None => self.rpc.get_latest_blockhash().await?,
        };
        *last = Some(blockhash);
        Ok(blockhash)
    }
}

/// 轮询结束只说明签名有了状态，失败的交易同样会结束轮询。
fn ensure_landed(
    signature: &Signature,
    status: Option<Result<(), TransactionError>>,
) -> LedgerResult<()> {
    match status {
        Some(Ok(())) => Ok(()),
        Some(Err(err)) => Err(LedgerError::Transaction(format!(
            "交易 {signature} 执行失败: {err}"
        ))),
        None => Err(LedgerError::Transaction(format!(
            "交易 {signature} 未达到要求的 commitment"
        ))),
    }
}
