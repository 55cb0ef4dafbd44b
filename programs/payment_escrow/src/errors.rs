use anchor_lang::prelude::*;

#[error_code]
pub enum EscrowError {
    #[msg("Invalid amount: amount must be greater than zero")]
    InvalidAmount,
    #[msg("Already initialized: escrow record already holds an active escrow")]
    AlreadyInitialized,
    #[msg("Invalid vault owner: vault authority does not match the derived address")]
    InvalidVaultOwner,
    #[msg("Account mismatch: supplied account does not match the escrow record")]
    AccountMismatch,
    #[msg("Unauthorized signer: only the recorded merchant may do this")]
    UnauthorizedSigner,
    #[msg("Insufficient funds: buyer balance is below the escrowed amount")]
    InsufficientFunds,
    #[msg("Arithmetic overflow in amount computation")]
    ArithmeticOverflow,
}
