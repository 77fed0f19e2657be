use anyhow::{Result, anyhow};
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey;
use solana_sdk::pubkey::Pubkey;
use solana_system_interface::instruction as system_instruction;
use spl_associated_token_account::get_associated_token_address_with_program_id;
use spl_associated_token_account::instruction::create_associated_token_account_idempotent;
use spl_token_2022::extension::ExtensionType;
use spl_token_2022::extension::memo_transfer::instruction::{
    disable_required_transfer_memos, enable_required_transfer_memos,
};
use spl_token_2022::state::{Account, Mint};

pub const MEMO_PROGRAM_ID: Pubkey = pubkey!("MemoSq4gqABAXKb96qnH8TysNcWxMyWCqXgDLGmfcHr");

pub fn token_program_id() -> Pubkey {
    spl_token_2022::id()
}

/// 不带扩展的 Mint 账户长度。
pub fn mint_len() -> Result<usize> {
    ExtensionType::try_calculate_account_len::<Mint>(&[])
        .map_err(|err| anyhow!("计算 Mint 账户长度失败: {err}"))
}

/// 基础账户布局 + MemoTransfer 扩展所需的账户长度。
pub fn memo_account_len() -> Result<usize> {
    ExtensionType::try_calculate_account_len::<Account>(&[ExtensionType::MemoTransfer])
        .map_err(|err| anyhow!("计算 MemoTransfer 账户长度失败: {err}"))
}

/// 创建并初始化 Token-2022 Mint，冻结权限与铸造权限相同。
pub fn create_mint(
    payer: &Pubkey,
    mint: &Pubkey,
    mint_authority: &Pubkey,
    decimals: u8,
    rent_lamports: u64,
    space: usize,
) -> Result<Vec<Instruction>> {
    let program_id = token_program_id();
    Ok(vec![
        system_instruction::create_account(
            payer,
            mint,
            rent_lamports,
            space as u64,
            &program_id,
        ),
        spl_token_2022::instruction::initialize_mint2(
            &program_id,
            mint,
            mint_authority,
            Some(mint_authority),
            decimals,
        )
        .map_err(|err| anyhow!("构造 initialize_mint2 失败: {err}"))?,
    ])
}

/// 分配 + 初始化 + 开启 memo 要求，三条指令必须放在同一笔交易里。
pub fn create_memo_required_account(
    payer: &Pubkey,
    account: &Pubkey,
    mint: &Pubkey,
    owner: &Pubkey,
    rent_lamports: u64,
    space: usize,
) -> Result<Vec<Instruction>> {
    let program_id = token_program_id();
    Ok(vec![
        system_instruction::create_account(
            payer,
            account,
            rent_lamports,
            space as u64,
            &program_id,
        ),
        spl_token_2022::instruction::initialize_account3(&program_id, account, mint, owner)
            .map_err(|err| anyhow!("构造 initialize_account3 失败: {err}"))?,
        enable_required_memo(account, owner)?,
    ])
}

/// 关联账户地址与幂等创建指令。
pub fn create_source_account(payer: &Pubkey, owner: &Pubkey, mint: &Pubkey) -> (Pubkey, Instruction) {
    let program_id = token_program_id();
    let address = get_associated_token_address_with_program_id(owner, mint, &program_id);
    let instruction = create_associated_token_account_idempotent(payer, owner, mint, &program_id);
    (address, instruction)
}

pub fn mint_to(
    mint: &Pubkey,
    destination: &Pubkey,
    mint_authority: &Pubkey,
    amount: u64,
) -> Result<Instruction> {
    spl_token_2022::instruction::mint_to(
        &token_program_id(),
        mint,
        destination,
        mint_authority,
        &[],
        amount,
    )
    .map_err(|err| anyhow!("构造 mint_to 失败: {err}"))
}

/// `transfer_checked`：decimals 与 Mint 不一致时会在校验阶段被拒绝。
pub fn transfer_checked(
    source: &Pubkey,
    mint: &Pubkey,
    destination: &Pubkey,
    authority: &Pubkey,
    amount: u64,
    decimals: u8,
) -> Result<Instruction> {
    spl_token_2022::instruction::transfer_checked(
        &token_program_id(),
        source,
        mint,
        destination,
        authority,
        &[],
        amount,
        decimals,
    )
    .map_err(|err| anyhow!("构造 transfer_checked 失败: {err}"))
}

/// 无签名者的 memo 指令。
pub fn memo(text: &str) -> Instruction {
    Instruction {
        program_id: MEMO_PROGRAM_ID,
        accounts: vec![],
        data: text.as_bytes().to_vec(),
    }
}

pub fn enable_required_memo(account: &Pubkey, owner: &Pubkey) -> Result<Instruction> {
    enable_required_transfer_memos(&token_program_id(), account, owner, &[])
        .map_err(|err| anyhow!("构造开启 memo 要求指令失败: {err}"))
}

pub fn disable_required_memo(account: &Pubkey, owner: &Pubkey) -> Result<Instruction> {
    disable_required_transfer_memos(&token_program_id(), account, owner, &[])
        .map_err(|err| anyhow!("构造关闭 memo 要求指令失败: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use spl_token_2022::instruction::TokenInstruction;

    #[test]
    fn memo_account_is_larger_than_base_account() {
        let base = ExtensionType::try_calculate_account_len::<Account>(&[]).expect("base len");
        let with_memo = memo_account_len().expect("memo len");
        assert!(with_memo > base);
    }

    #[test]
    fn memo_required_account_is_single_atomic_batch() {
        let payer = Pubkey::new_unique();
        let account = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let owner = Pubkey::new_unique();
        let space = memo_account_len().expect("len");

        let ixs = create_memo_required_account(&payer, &account, &mint, &owner, 1, space)
            .expect("instructions");
        assert_eq!(ixs.len(), 3);
        assert_eq!(ixs[0].program_id, solana_system_interface::program::ID);
        assert_eq!(ixs[1].program_id, token_program_id());
        assert_eq!(ixs[2].program_id, token_program_id());

        // enable 指令要求 owner 签名。
        let owner_meta = ixs[2]
            .accounts
            .iter()
            .find(|meta| meta.pubkey == owner)
            .expect("owner meta");
        assert!(owner_meta.is_signer);
    }

    #[test]
    fn transfer_checked_carries_amount_and_decimals() {
        let source = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let destination = Pubkey::new_unique();
        let authority = Pubkey::new_unique();

        let ix = transfer_checked(&source, &mint, &destination, &authority, 1_000, 9)
            .expect("instruction");
        let decoded = TokenInstruction::unpack(&ix.data).expect("unpack");
        assert_eq!(
            decoded,
            TokenInstruction::TransferChecked {
                amount: 1_000,
                decimals: 9
            }
        );
        assert_eq!(ix.accounts[0].pubkey, source);
        assert_eq!(ix.accounts[1].pubkey, mint);
        assert_eq!(ix.accounts[2].pubkey, destination);
    }

    #[test]
    fn enable_and_disable_differ_only_in_sub_instruction() {
        let account = Pubkey::new_unique();
        let owner = Pubkey::new_unique();
        let enable = enable_required_memo(&account, &owner).expect("enable");
        let disable = disable_required_memo(&account, &owner).expect("disable");
        assert_eq!(enable.accounts, disable.accounts);
        assert_eq!(enable.data[..enable.data.len() - 1], disable.data[..disable.data.len() - 1]);
        assert_ne!(enable.data.last(), disable.data.last());
    }

    #[test]
    fn memo_instruction_has_no_accounts() {
        let ix = memo("QuickNode demo.");
        assert_eq!(ix.program_id, MEMO_PROGRAM_ID);
        assert!(ix.accounts.is_empty());
        assert_eq!(ix.data, b"QuickNode demo.");
    }

    #[test]
    fn source_account_is_associated_address() {
        let payer = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let (address, ix) = create_source_account(&payer, &payer, &mint);
        assert_eq!(
            address,
            get_associated_token_address_with_program_id(&payer, &mint, &token_program_id())
        );
        assert!(ix.accounts.iter().any(|meta| meta.pubkey == address));
    }
}
