//! Token-2022 指令构造与账户状态解码。

pub mod instructions;
pub mod state;
