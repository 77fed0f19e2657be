use solana_sdk::instruction::InstructionError;
use solana_sdk::transaction::TransactionError;
use spl_token_2022::error::TokenError;

use crate::ledger::{Rejection, SubmitOutcome};

/// Token-2022 在缺少 memo 时输出的日志文本，只在拿不到结构化错误时使用。
pub const NO_MEMO_LOG: &str = "No memo in previous instruction";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    MissingMemo,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expectation {
    Accept,
    Reject(RejectReason),
}

/// 转账提交结果的判定。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    ExpectedAccept,
    ExpectedReject,
    UnexpectedReject(RejectReason),
    UnexpectedAccept,
}

impl Verdict {
    pub fn passed(&self) -> bool {
        matches!(self, Self::ExpectedAccept | Self::ExpectedReject)
    }
}

pub fn reject_reason(rejection: &Rejection) -> RejectReason {
    match &rejection.error {
        Some(error) => reason_from_transaction_error(error),
        None if rejection.logs_contain(NO_MEMO_LOG) => RejectReason::MissingMemo,
        None => RejectReason::Other,
    }
}

fn reason_from_transaction_error(error: &TransactionError) -> RejectReason {
    match error {
        TransactionError::InstructionError(_, InstructionError::Custom(code))
            if *code == TokenError::NoMemo as u32 =>
        {
            RejectReason::MissingMemo
        }
        _ => RejectReason::Other,
    }
}

pub fn classify(outcome: &SubmitOutcome, expectation: Expectation) -> Verdict {
    match (outcome, expectation) {
        (SubmitOutcome::Accepted(_), Expectation::Accept) => Verdict::ExpectedAccept,
        (SubmitOutcome::Accepted(_), Expectation::Reject(_)) => Verdict::UnexpectedAccept,
        (SubmitOutcome::Rejected(rejection), Expectation::Accept) => {
            Verdict::UnexpectedReject(reject_reason(rejection))
        }
        (SubmitOutcome::Rejected(rejection), Expectation::Reject(expected)) => {
            let actual = reject_reason(rejection);
            if actual == expected {
                Verdict::ExpectedReject
            } else {
                Verdict::UnexpectedReject(actual)
            }
        }
    }
}
