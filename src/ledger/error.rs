use solana_client::client_error::ClientError;
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("RPC 请求失败: {0}")]
    Rpc(#[from] ClientError),
    #[error("账户 {0} 不存在")]
    AccountNotFound(Pubkey),
    #[error("交易构建失败: {0}")]
    Transaction(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;
