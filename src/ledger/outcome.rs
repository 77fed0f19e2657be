use std::fmt;

use solana_client::client_error::{ClientError, ClientErrorKind};
use solana_client::rpc_request::{RpcError, RpcResponseErrorData};
use solana_sdk::signature::Signature;
use solana_sdk::transaction::TransactionError;

/// 一次交易提交的结果：要么落地，要么被网络拒绝。
#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    Accepted(Signature),
    Rejected(Rejection),
}

/// 网络拒绝交易时可获得的诊断信息。
#[derive(Debug, Clone, Default)]
pub struct Rejection {
    /// 结构化的交易错误（预检或执行阶段）。
    pub error: Option<TransactionError>,
    /// 预检模拟输出的程序日志。
    pub logs: Vec<String>,
    /// 客户端错误的完整文本。
    pub message: String,
}

impl Rejection {
    pub fn from_client_error(err: &ClientError) -> Self {
        let logs = match err.kind() {
            ClientErrorKind::RpcError(RpcError::RpcResponseError {
                data: RpcResponseErrorData::SendTransactionPreflightFailure(result),
                ..
            }) => result.logs.clone().unwrap_or_default(),
            _ => Vec::new(),
        };

        Self {
            error: err.get_transaction_error(),
            logs,
            message: err.to_string(),
        }
    }

    pub fn logs_contain(&self, needle: &str) -> bool {
        self.logs.iter().any(|line| line.contains(needle))
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error {
            Some(error) => write!(f, "{error}")?,
            None => write!(f, "{}", self.message)?,
        }
        if !self.logs.is_empty() {
            write!(f, "\n{}", self.logs.join("\n"))?;
        }
        Ok(())
    }
}
