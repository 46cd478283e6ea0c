//! Flash Loans
//!
//! A flash loan lends pool reserves for the span of one borrower callback.
//!
//! ## Lifecycle
//!
//! 1. **Issue**: record the loan and transfer the principal to the borrower
//! 2. **Callback**: the borrower runs arbitrary engine operations and repays
//!    through [`Engine::repay_flash_loan`]
//! 3. **Verify**: re-read the loan and the pool; the repayment must cover
//!    principal plus fee
//!
//! All three steps are one transaction. A short repayment, or any error
//! raised by the callback, undoes the issue, the transfer and everything the
//! callback did.
//!
//! The callback may re-enter the engine, including against the same pool, so
//! verification reads live state rather than anything captured at issue.
//!
//! Lent principal stays in the pool's reserves and is tracked separately as
//! `lent_x`/`lent_y`. Swaps and deposits made by the callback are priced
//! against the whole pool; only payouts are bounded by what custody holds.
//!
//! ## Due Height
//!
//! `due_height` is one height after issue. The clock cannot move inside an
//! operation, so a loan issued and repaid by `flash_swap` is never late. An
//! `Issued` loan can only outlive its call when the store was written outside
//! the engine; repaying such a loan past its due height fails with `Expired`.

use ledgerswap_common::{
    constants::flash::{FIRST_LOAN_ID, LOAN_DURATION_HEIGHTS},
    errors::{AmmError, AmmResult},
    events::AmmEvent,
    math::{calculate_fee, fee_growth_delta},
    oracle::update_price_accumulators,
    store::{ScalarKey, StoreKey},
    token_ops::TokenLedger,
    types::{Address, FlashLoan, LoanId, LoanStatus, PoolId, PoolSide, TokenId},
};

use crate::Engine;

/// What the borrower is told about its loan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashLoanContext {
    pub loan_id: LoanId,
    pub pool_id: PoolId,
    pub token: TokenId,
    pub amount: u64,
    pub fee: u64,
}

impl FlashLoanContext {
    /// Principal plus fee
    pub fn amount_due(&self) -> u64 {
        self.amount.saturating_add(self.fee)
    }
}

/// Borrower logic run while a flash loan is outstanding
pub trait FlashBorrower<L: TokenLedger> {
    /// Use the loan and repay it before returning. Returning an error aborts
    /// the loan.
    fn on_flash_loan(
        &mut self,
        engine: &mut Engine<L>,
        borrower: &Address,
        loan: &FlashLoanContext,
    ) -> AmmResult<()>;
}

impl<L: TokenLedger> Engine<L> {
    /// Lend `amount` of one pool side to `caller` for the span of `borrower`
    pub fn flash_swap<B: FlashBorrower<L>>(
        &mut self,
        caller: &Address,
        pool_id: PoolId,
        side: PoolSide,
        amount: u64,
        borrower: &mut B,
    ) -> AmmResult<LoanId> {
        self.ensure_active()?;
        self.atomic(|engine| {
            let context = engine.issue_flash_loan(caller, pool_id, side, amount)?;
            borrower.on_flash_loan(engine, caller, &context)?;
            engine.verify_flash_loan(context.loan_id)?;
            Ok(context.loan_id)
        })
    }

    /// Pay `amount` towards an outstanding loan, returning the total repaid
    ///
    /// Only the borrower may repay, and only while the loan is open.
    pub fn repay_flash_loan(&mut self, caller: &Address, loan_id: LoanId, amount: u64) -> AmmResult<u64> {
        self.ensure_active()?;
        self.atomic(|engine| {
            // 1. Validate loan
            let mut loan = engine.flash_loan(loan_id)?;
            if !loan.is_active() {
                return Err(AmmError::LoanNotActive { loan_id });
            }
            if loan.borrower != *caller {
                return Err(AmmError::NotAuthorized {
                    expected: loan.borrower,
                    actual: *caller,
                });
            }
            if engine.height > loan.due_height {
                return Err(AmmError::Expired {
                    due_height: loan.due_height,
                    current_height: engine.height,
                });
            }
            if amount == 0 {
                return Err(AmmError::ZeroAmount);
            }

            // 2. Return tokens to the pool; principal first, the rest joins the reserve
            let mut pool = engine.pool(loan.pool_id)?;
            update_price_accumulators(&mut pool, engine.height);
            engine.transfer(&loan.token, amount, caller, &pool.custody())?;

            let principal = amount.min(loan.outstanding_principal());
            let lent = pool.lent_mut(loan.side);
            *lent = lent.checked_sub(principal).ok_or(AmmError::Underflow)?;
            let reserve = pool.reserve_mut(loan.side);
            *reserve = reserve.checked_add(amount - principal).ok_or(AmmError::Overflow)?;
            pool.last_update_height = engine.height;
            loan.repaid = loan.repaid.checked_add(amount).ok_or(AmmError::Overflow)?;

            engine.save_pool(&pool)?;
            engine.save_loan(&loan)?;

            engine.emit(AmmEvent::FlashLoanRepaid {
                loan_id,
                amount,
                total_repaid: loan.repaid,
            });

            Ok(loan.repaid)
        })
    }

    pub fn flash_loan(&self, loan_id: LoanId) -> AmmResult<FlashLoan> {
        self.store
            .get(&StoreKey::FlashLoan(loan_id))?
            .ok_or(AmmError::LoanNotFound { loan_id })
    }

    // ============ Internal ============

    fn issue_flash_loan(
        &mut self,
        caller: &Address,
        pool_id: PoolId,
        side: PoolSide,
        amount: u64,
    ) -> AmmResult<FlashLoanContext> {
        // 1. Validate amount against what custody holds
        if amount == 0 {
            return Err(AmmError::ZeroAmount);
        }
        let mut pool = self.pool(pool_id)?;
        let on_hand = pool.available(side);
        if amount >= on_hand {
            return Err(AmmError::InsufficientLiquidity {
                available: on_hand.saturating_sub(1),
                requested: amount,
            });
        }

        // 2. Record loan
        let fee_rate = self.protocol_fee_rate()?;
        let fee = calculate_fee(amount, fee_rate)?;
        let loan_id = self.next_id(ScalarKey::NextLoanId, FIRST_LOAN_ID)?;
        let token = pool.token(side);
        let due_height = self
            .height
            .checked_add(LOAN_DURATION_HEIGHTS)
            .ok_or(AmmError::Overflow)?;

        let loan = FlashLoan {
            id: loan_id,
            pool_id,
            borrower: *caller,
            token,
            side,
            amount,
            fee,
            repaid: 0,
            issued_height: self.height,
            due_height,
            status: LoanStatus::Issued,
        };
        self.save_loan(&loan)?;

        // 3. Lend out of custody; the reserve keeps pricing the full pool
        let lent = pool.lent_mut(side);
        *lent = lent.checked_add(amount).ok_or(AmmError::Overflow)?;
        self.save_pool(&pool)?;
        self.transfer(&token, amount, &pool.custody(), caller)?;

        self.emit(AmmEvent::FlashLoanIssued {
            loan_id,
            pool_id,
            borrower: *caller,
            token,
            amount,
            fee,
            due_height,
        });

        Ok(FlashLoanContext {
            loan_id,
            pool_id,
            token,
            amount,
            fee,
        })
    }

    fn verify_flash_loan(&mut self, loan_id: LoanId) -> AmmResult<()> {
        // 1. Fresh reads after the callback
        let mut loan = self.flash_loan(loan_id)?;
        let mut pool = self.pool(loan.pool_id)?;
        let required = loan.amount_due();

        if loan.repaid < required || pool.available(loan.side) < required {
            return Err(AmmError::FlashLoanFailed {
                required,
                repaid: loan.repaid,
            });
        }

        // 2. Close loan and account the fee to LPs and treasury
        loan.status = LoanStatus::Verified;
        self.save_loan(&loan)?;

        let growth = fee_growth_delta(loan.fee, pool.total_lp_supply);
        match loan.side {
            PoolSide::X => {
                pool.cumulative_fee_x = pool.cumulative_fee_x.saturating_add(loan.fee);
                pool.fee_growth_x = pool.fee_growth_x.saturating_add(growth);
            }
            PoolSide::Y => {
                pool.cumulative_fee_y = pool.cumulative_fee_y.saturating_add(loan.fee);
                pool.fee_growth_y = pool.fee_growth_y.saturating_add(growth);
            }
        }
        self.save_pool(&pool)?;
        self.credit_treasury(loan.fee)?;

        self.emit(AmmEvent::FlashLoanVerified {
            loan_id,
            pool_id: loan.pool_id,
            fee: loan.fee,
            block_height: self.height,
        });
        Ok(())
    }

    fn save_loan(&mut self, loan: &FlashLoan) -> AmmResult<()> {
        self.store.put(&StoreKey::FlashLoan(loan.id), loan)
    }
}
