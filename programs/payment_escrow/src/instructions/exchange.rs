use anchor_lang::prelude::*;
use anchor_spl::token::{close_account, transfer, CloseAccount, Token, TokenAccount, Transfer};

use crate::errors::EscrowError;
use crate::state::{
    verify_vault_authority, EscrowRecord, VAULT_ACCOUNT_SEED, VAULT_AUTHORITY_SEED,
};

#[derive(Accounts)]
pub struct Exchange<'info> {
    /// The buyer settling the escrow
    pub buyer: Signer<'info>,

    /// Buyer's token account debited by the settlement
    #[account(
        mut,
        constraint = buyer_deposit_token_account.mint == escrow_record.mint @ EscrowError::AccountMismatch,
    )]
    pub buyer_deposit_token_account: Box<Account<'info, TokenAccount>>,

    /// Must be the receive account recorded at initialize
    #[account(
        mut,
        address = escrow_record.merchant_receive_token_account @ EscrowError::AccountMismatch,
    )]
    pub merchant_receive_token_account: Box<Account<'info, TokenAccount>>,

    /// The recorded merchant; receives the reclaimed rent
    #[account(mut, address = escrow_record.merchant_key @ EscrowError::AccountMismatch)]
    pub merchant: SystemAccount<'info>,

    /// Terms of the escrow being settled (closed on success)
    #[account(mut, close = merchant)]
    pub escrow_record: Box<Account<'info, EscrowRecord>>,

    /// Vault under program custody (closed on success)
    #[account(
        mut,
        seeds = [VAULT_ACCOUNT_SEED],
        bump,
        constraint = vault_account.owner == vault_authority.key() @ EscrowError::InvalidVaultOwner,
    )]
    pub vault_account: Box<Account<'info, TokenAccount>>,

    /// CHECK: re-derived from the stored bump and compared in the handler
    pub vault_authority: UncheckedAccount<'info>,

    pub token_program: Program<'info, Token>,
}

impl<'info> Exchange<'info> {
    /// Transfer the agreed amount from the buyer to the merchant
    pub fn pay_merchant(&self) -> Result<()> {
        let cpi_accounts = Transfer {
            from: self.buyer_deposit_token_account.to_account_info(),
            to: self.merchant_receive_token_account.to_account_info(),
            authority: self.buyer.to_account_info(),
        };
        let cpi_program = self.token_program.to_account_info();
        let cpi_ctx = CpiContext::new(cpi_program, cpi_accounts);

        transfer(cpi_ctx, self.escrow_record.buyer_amount)
    }

    /// Release whatever the vault holds to the merchant under the derived
    /// authority, then close the vault and return its rent
    pub fn release_and_close_vault(&self) -> Result<()> {
        let signer_seeds: &[&[&[u8]]] =
            &[&[VAULT_AUTHORITY_SEED, &[self.escrow_record.vault_bump]]];

        let cpi_accounts = Transfer {
            from: self.vault_account.to_account_info(),
            to: self.merchant_receive_token_account.to_account_info(),
            authority: self.vault_authority.to_account_info(),
        };
        let cpi_program = self.token_program.to_account_info();
        let cpi_ctx = CpiContext::new_with_signer(cpi_program, cpi_accounts, signer_seeds);

        transfer(cpi_ctx, self.vault_account.amount)?;

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

/// Balance checklist run before any transfer. Returns the total that ends
/// up on the merchant's receive account.
fn settlement_preflight(buyer_balance: u64, receive_balance: u64, buyer_amount: u64) -> Result<u64> {
    require_gte!(buyer_balance, buyer_amount, EscrowError::InsufficientFunds);

    receive_balance
        .checked_add(buyer_amount)
        .ok_or_else(|| error!(EscrowError::ArithmeticOverflow))
}

/// Handler for the exchange instruction
pub fn handler(ctx: Context<Exchange>) -> Result<()> {
    let record = &ctx.accounts.escrow_record;

    // Re-derive the vault authority from the stored bump; the supplied
    // account must match bit-for-bit before anything is spent
    let vault_authority = verify_vault_authority(ctx.program_id, record.vault_bump)?;
    require_keys_eq!(
        ctx.accounts.vault_authority.key(),
        vault_authority,
        EscrowError::InvalidVaultOwner
    );

    settlement_preflight(
        ctx.accounts.buyer_deposit_token_account.amount,
        ctx.accounts.merchant_receive_token_account.amount,
        record.buyer_amount,
    )?;

    // Both transfers run inside this one instruction; a failure in either
    // rolls back the whole settlement
    ctx.accounts.pay_merchant()?;
    ctx.accounts.release_and_close_vault()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_buyer_balance_is_rejected() {
        let err = settlement_preflight(499, 0, 500).unwrap_err();
        assert_eq!(err, EscrowError::InsufficientFunds.into());
    }

    #[test]
    fn exact_balance_settles_in_full() {
        assert_eq!(settlement_preflight(500, 0, 500).unwrap(), 500);
    }

    #[test]
    fn credited_total_includes_the_existing_receive_balance() {
        assert_eq!(settlement_preflight(500, 250, 500).unwrap(), 750);
    }

    #[test]
    fn overflowing_receive_balance_is_rejected() {
        let err = settlement_preflight(500, u64::MAX, 500).unwrap_err();
        assert_eq!(err, EscrowError::ArithmeticOverflow.into());
    }
}
