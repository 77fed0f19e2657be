//! 直接读取链上账户数据并解码 Token-2022 状态。

use solana_sdk::account::Account as RawAccount;
use solana_sdk::pubkey::Pubkey;
use spl_token_2022::extension::memo_transfer::MemoTransfer;
use spl_token_2022::extension::{BaseStateWithExtensions, StateWithExtensions};
use spl_token_2022::state::{Account, Mint};
use thiserror::Error;
use tracing::debug;

use crate::ledger::{LedgerClient, LedgerError};

use super::instructions::token_program_id;

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("账户 {account} 不属于 Token-2022 程序（owner={owner}）")]
    WrongOwner { account: Pubkey, owner: Pubkey },
    #[error("解析账户数据失败: {0}")]
    Unpack(String),
    #[error("账户缺少 MemoTransfer 扩展")]
    MissingExtension,
}

pub type VerifyResult<T> = Result<T, VerifyError>;

/// 从原始账户数据解码 memo 要求标志；扩展缺失视为前置条件错误。
pub fn memo_required(data: &[u8]) -> VerifyResult<bool> {
    let state = StateWithExtensions::<Account>::unpack(data)
        .map_err(|err| VerifyError::Unpack(err.to_string()))?;
    let extension = state
        .get_extension::<MemoTransfer>()
        .map_err(|_| VerifyError::MissingExtension)?;
    Ok(bool::from(extension.require_incoming_transfer_memos))
}

pub fn token_balance(data: &[u8]) -> VerifyResult<u64> {
    let state = StateWithExtensions::<Account>::unpack(data)
        .map_err(|err| VerifyError::Unpack(err.to_string()))?;
    Ok(state.base.amount)
}

pub fn mint_decimals(data: &[u8]) -> VerifyResult<u8> {
    let state = StateWithExtensions::<Mint>::unpack(data)
        .map_err(|err| VerifyError::Unpack(err.to_string()))?;
    Ok(state.base.decimals)
}

pub async fn read_memo_required(ledger: &LedgerClient, address: &Pubkey) -> VerifyResult<bool> {
    let account = fetch_token_program_account(ledger, address).await?;
    let required = memo_required(&account.data)?;
    debug!(target: "token", account = %address, required, "读取 memo 要求标志");
    Ok(required)
}

pub async fn read_token_balance(ledger: &LedgerClient, address: &Pubkey) -> VerifyResult<u64> {
    let account = fetch_token_program_account(ledger, address).await?;
    token_balance(&account.data)
}

pub async fn read_mint_decimals(ledger: &LedgerClient, address: &Pubkey) -> VerifyResult<u8> {
    let account = fetch_token_program_account(ledger, address).await?;
    mint_decimals(&account.data)
}

async fn fetch_token_program_account(
    ledger: &LedgerClient,
    address: &Pubkey,
) -> VerifyResult<RawAccount> {
    let account = ledger.get_account(address).await?;
    ensure_token_program_owner(address, &account)?;
    Ok(account)
}

fn ensure_token_program_owner(address: &Pubkey, account: &RawAccount) -> VerifyResult<()> {
    if account.owner != token_program_id() {
        return Err(VerifyError::WrongOwner {
            account: *address,
            owner: account.owner,
        });
    }
    Ok(())
}
