use anyhow::{Result, bail};
use solana_sdk::signature::{Keypair, Signer};
use tracing::info;

use super::WalletConfig;

/// 解析私钥字符串：支持 JSON 数组、逗号分隔字节与 base58 三种格式。
pub fn parse_keypair_string(raw: &str) -> Result<Keypair> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        bail!("keypair string empty");
    }

    if trimmed.starts_with('[') {
        let bytes: Vec<u8> = serde_json::from_str(trimmed)?;
        Ok(Keypair::try_from(bytes.as_slice())?)
    } else if trimmed.contains(',') {
        let bytes = trimmed
            .split(',')
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .map(|part| part.parse::<u8>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Keypair::try_from(bytes.as_slice())?)
    } else {
        let data = bs58::decode(trimmed).into_vec()?;
        Ok(Keypair::try_from(data.as_slice())?)
    }
}

/// 返回付款钱包：配置了私钥则使用之，否则生成一次性钱包。
pub fn load_payer(wallet: &WalletConfig) -> Result<Keypair> {
    if wallet.private_key.trim().is_empty() {
        return Ok(Keypair::new());
    }
    let keypair = parse_keypair_string(&wallet.private_key)?;
    info!(target: "config", payer = %keypair.pubkey(), "使用配置中的付款钱包");
    Ok(keypair)
}
