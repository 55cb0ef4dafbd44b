use anchor_lang::prelude::*;

mod errors;
mod instructions;
mod state;

use instructions::*;

declare_id!("Fg6PaFpoGXkYsidMpWTK6W2BeZ7FEfcYkg476zPFsLnS");

#[program]
pub mod payment_escrow {
    use super::*;

    /// Create a new escrow: merchant records the payment terms and the
    /// vault is placed under program custody
    #[instruction(discriminator = 0)]
    pub fn initialize(ctx: Context<Initialize>, vault_bump: u8, amount: u64) -> Result<()> {
        instructions::initialize::handler(ctx, vault_bump, amount)
    }

    /// Settle the escrow: buyer pays the recorded amount, vault and record
    /// are closed
    #[instruction(discriminator = 1)]
    pub fn exchange(ctx: Context<Exchange>) -> Result<()> {
        instructions::exchange::handler(ctx)
    }

    /// Rescind the escrow: merchant aborts and reclaims the storage
    #[instruction(discriminator = 2)]
    pub fn cancel(ctx: Context<Cancel>) -> Result<()> {
        instructions::cancel::handler(ctx)
    }
}
