use serde::Deserialize;
use solana_commitment_config::CommitmentConfig;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub global: GlobalConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
    #[serde(default)]
    pub scenario: ScenarioConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GlobalConfig {
    #[serde(default = "super::default_rpc_url")]
    pub rpc_url: String,
    #[serde(default)]
    pub commitment: CommitmentLevel,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CommitmentLevel {
    Processed,
    #[default]
    Confirmed,
    Finalized,
}

impl CommitmentLevel {
    pub fn to_commitment_config(self) -> CommitmentConfig {
        match self {
            Self::Processed => CommitmentConfig::processed(),
            Self::Confirmed => CommitmentConfig::confirmed(),
            Self::Finalized => CommitmentConfig::finalized(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WalletConfig {
    /// 可选的付款钱包私钥；留空时每次运行生成新钱包。
    #[serde(default)]
    pub private_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioConfig {
    #[serde(default = "super::default_decimals")]
    pub decimals: u8,
    #[serde(default = "super::default_transfer_ui_amount")]
    pub transfer_ui_amount: u64,
    #[serde(default = "super::default_mint_multiplier")]
    pub mint_multiplier: u64,
    #[serde(default = "super::default_memo")]
    pub memo: String,
    #[serde(default = "super::default_airdrop_lamports")]
    pub airdrop_lamports: u64,
    #[serde(default = "super::default_true")]
    pub recheck_after_enable: bool,
}

impl ScenarioConfig {
    /// 单次转账的最小单位数量（ui 数量 × 10^decimals）。
    pub fn transfer_amount(&self) -> Option<u64> {
        10u64
            .checked_pow(u32::from(self.decimals))
            .and_then(|scale| self.transfer_ui_amount.checked_mul(scale))
    }

    /// 铸造到源账户的数量。
    pub fn mint_amount(&self) -> Option<u64> {
        self.transfer_amount()
            .and_then(|amount| amount.checked_mul(self.mint_multiplier))
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LoggingProfile {
    #[default]
    Lean,
    Verbose,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "super::default_logging_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
    #[serde(default)]
    pub profile: LoggingProfile,
    #[serde(default)]
    pub timezone_offset_hours: i8,
}
