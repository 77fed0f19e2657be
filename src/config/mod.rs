pub mod loader;
pub mod types;
pub mod wallet;

pub use loader::*;
pub use types::*;

use self::types as cfg;

/// 场景中预期成功落地的转账次数（带 memo 一次、关闭要求后一次）。
pub const ACCEPTED_TRANSFERS: u64 = 2;

const MAX_DECIMALS: u8 = 18;

pub(crate) fn default_true() -> bool {
    true
}

pub(crate) fn default_rpc_url() -> String {
    "http://127.0.0.1:8899".to_string()
}

pub(crate) fn default_logging_level() -> String {
    "info".to_string()
}

pub(crate) fn default_decimals() -> u8 {
    9
}

pub(crate) fn default_transfer_ui_amount() -> u64 {
    1_000
}

pub(crate) fn default_mint_multiplier() -> u64 {
    10
}

pub(crate) fn default_memo() -> String {
    "QuickNode demo.".to_string()
}

pub(crate) fn default_airdrop_lamports() -> u64 {
    2 * solana_sdk::native_token::LAMPORTS_PER_SOL
}

impl Default for cfg::GlobalConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            commitment: cfg::CommitmentLevel::default(),
            logging: cfg::LoggingConfig::default(),
        }
    }
}

impl Default for cfg::LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_logging_level(),
            json: false,
            profile: cfg::LoggingProfile::default(),
            timezone_offset_hours: 0,
        }
    }
}

impl Default for cfg::ScenarioConfig {
    fn default() -> Self {
        Self {
            decimals: default_decimals(),
            transfer_ui_amount: default_transfer_ui_amount(),
            mint_multiplier: default_mint_multiplier(),
            memo: default_memo(),
            airdrop_lamports: default_airdrop_lamports(),
            recheck_after_enable: true,
        }
    }
}

impl cfg::AppConfig {
    /// 校验场景参数，返回第一处非法配置。
    pub fn validate(&self) -> Result<(), ConfigError> {
        let scenario = &self.scenario;
        if scenario.decimals > MAX_DECIMALS {
            return Err(ConfigError::Invalid(format!(
                "scenario.decimals 不能超过 {MAX_DECIMALS}，当前 {}",
                scenario.decimals
            )));
        }
        if scenario.transfer_ui_amount == 0 {
            return Err(ConfigError::Invalid(
                "scenario.transfer_ui_amount 必须大于 0".into(),
            ));
        }
        if scenario.transfer_amount().is_none() {
            return Err(ConfigError::Invalid(format!(
                "scenario.transfer_ui_amount={} 按 {} 位精度换算后溢出 u64",
                scenario.transfer_ui_amount, scenario.decimals
            )));
        }
        if scenario.mint_multiplier < ACCEPTED_TRANSFERS {
            return Err(ConfigError::Invalid(format!(
                "scenario.mint_multiplier 至少为 {ACCEPTED_TRANSFERS}，当前 {}",
                scenario.mint_multiplier
            )));
        }
        if scenario.mint_amount().is_none() {
            return Err(ConfigError::Invalid(
                "scenario.mint_multiplier 导致铸造数量溢出 u64".into(),
            ));
        }
        if scenario.memo.trim().is_empty() {
            return Err(ConfigError::Invalid("scenario.memo 不能为空".into()));
        }
        if scenario.airdrop_lamports == 0 && self.wallet.private_key.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "scenario.airdrop_lamports=0 时必须配置 wallet.private_key，否则临时付款钱包没有余额".into(),
            ));
        }
        if self.global.rpc_url.trim().is_empty() {
            return Err(ConfigError::Invalid("global.rpc_url 不能为空".into()));
        }
        Ok(())
    }
}
