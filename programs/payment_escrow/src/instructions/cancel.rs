use anchor_lang::prelude::*;
use anchor_spl::token::{close_account, CloseAccount, Token, TokenAccount};

use crate::errors::EscrowError;
use crate::state::{
    verify_vault_authority, EscrowRecord, VAULT_ACCOUNT_SEED, VAULT_AUTHORITY_SEED,
};

#[derive(Accounts)]
pub struct Cancel<'info> {
    /// Only the merchant recorded at initialize may rescind
    #[account(mut)]
    pub merchant: Signer<'info>,

    /// Vault under program custody (closed on success)
    #[account(
        mut,
        seeds = [VAULT_ACCOUNT_SEED],
        bump,
        constraint = vault_account.owner == vault_authority.key() @ EscrowError::InvalidVaultOwner,
    )]
    pub vault_account: Account<'info, TokenAccount>,

    /// CHECK: re-derived from the stored bump and compared in the handler
    pub vault_authority: UncheckedAccount<'info>,

    /// Terms of the escrow being rescinded (closed on success)
    #[account(
        mut,
        close = merchant,
        constraint = escrow_record.merchant_key == merchant.key() @ EscrowError::UnauthorizedSigner,
    )]
    pub escrow_record: Account<'info, EscrowRecord>,

    pub token_program: Program<'info, Token>,
}

impl<'info> Cancel<'info> {
    /// Close the vault under the derived authority, rent back to the
    /// merchant. The vault is empty for the whole Active lifetime, so no
    /// tokens move here; the token program rejects closing a non-empty one.
    pub fn close_vault(&self) -> Result<()> {
        let signer_seeds: &[&[&[u8]]] =
            &[&[VAULT_AUTHORITY_SEED, &[self.escrow_record.vault_bump]]];

        let cpi_accounts = CloseAccount {
            account: self.vault_account.to_account_info(),
            destination: self.merchant.to_account_info(),
            authority: self.vault_authority.to_account_info(),
        };
        let cpi_program = self.token_program.to_account_info();
        let cpi_ctx = CpiContext::new_with_signer(cpi_program, cpi_accounts, signer_seeds);

        close_account(cpi_ctx)
    }
}

/// Handler for the cancel instruction
pub fn handler(ctx: Context<Cancel>) -> Result<()> {
    let record = &ctx.accounts.escrow_record;

    let vault_authority = verify_vault_authority(ctx.program_id, record.vault_bump)?;
    require_keys_eq!(
        ctx.accounts.vault_authority.key(),
        vault_authority,
        EscrowError::InvalidVaultOwner
    );

    ctx.accounts.close_vault()
}
