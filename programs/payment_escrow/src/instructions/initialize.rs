use anchor_lang::prelude::*;
use anchor_spl::token::{
    set_authority, spl_token::instruction::AuthorityType, Mint, SetAuthority, Token, TokenAccount,
};

use crate::errors::EscrowError;
use crate::state::{vault_authority_address, EscrowRecord, VAULT_ACCOUNT_SEED};

#[derive(Accounts)]
pub struct Initialize<'info> {
    /// The merchant who sets the payment terms and pays for the vault
    #[account(mut)]
    pub merchant: Signer<'info>,

    /// Mint of the token being escrowed
    pub mint: Account<'info, Mint>,

    /// Vault token account held under program custody until settlement.
    /// Created with the merchant as authority; the handler reassigns it to
    /// the derived vault authority before the instruction ends.
    #[account(
        init,
        payer = merchant,
        seeds = [VAULT_ACCOUNT_SEED],
        bump,
        token::mint = mint,
        token::authority = merchant,
    )]
    pub vault_account: Account<'info, TokenAccount>,

    /// Merchant's token account credited when the buyer settles
    #[account(
        constraint = merchant_receive_token_account.mint == mint.key() @ EscrowError::AccountMismatch,
    )]
    pub merchant_receive_token_account: Account<'info, TokenAccount>,

    /// Freshly allocated record storage; must not hold a previous escrow
    #[account(zero)]
    pub escrow_record: Account<'info, EscrowRecord>,

    pub system_program: Program<'info, System>,
    pub rent: Sysvar<'info, Rent>,
    pub token_program: Program<'info, Token>,
}

impl<'info> Initialize<'info> {
    /// Persist the payment terms into the escrow record
    pub fn populate_record(&mut self, buyer_amount: u64, vault_bump: u8) -> Result<()> {
        let record = &mut self.escrow_record;
        record.is_initialized = true;
        record.merchant_key = self.merchant.key();
        record.merchant_receive_token_account = self.merchant_receive_token_account.key();
        record.mint = self.mint.key();
        record.buyer_amount = buyer_amount;
        record.vault_bump = vault_bump;
        Ok(())
    }

    /// Hand the vault over to the derived authority; after this no private
    /// key can move its balance
    pub fn transfer_vault_to_program(&self, vault_authority: Pubkey) -> Result<()> {
        let cpi_accounts = SetAuthority {
            account_or_mint: self.vault_account.to_account_info(),
            current_authority: self.merchant.to_account_info(),
        };
        let cpi_program = self.token_program.to_account_info();
        let cpi_ctx = CpiContext::new(cpi_program, cpi_accounts);

        set_authority(cpi_ctx, AuthorityType::AccountOwner, Some(vault_authority))
    }
}

/// Handler for the initialize instruction. The vault is left empty here;
/// the buyer funds settlement at exchange.
pub fn handler(ctx: Context<Initialize>, vault_bump: u8, amount: u64) -> Result<()> {
    // Validate that the escrowed amount is greater than zero
    require_gt!(amount, 0, EscrowError::InvalidAmount);

    // The caller's bump must reproduce the canonical derivation exactly
    let (vault_authority, canonical_bump) = vault_authority_address(ctx.program_id);
    require_eq!(vault_bump, canonical_bump, EscrowError::InvalidVaultOwner);

    require!(
        !ctx.accounts.escrow_record.is_initialized,
        EscrowError::AlreadyInitialized
    );

    ctx.accounts.populate_record(amount, vault_bump)?;

    ctx.accounts.transfer_vault_to_program(vault_authority)
}
