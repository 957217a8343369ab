//! Loans, crop insurance and the per-season ledger.
//!
//! Financing sits beside the season aggregator rather than inside it:
//! loan installments, premiums and payouts move cash after income, cost and
//! score samples are final, so a run without loans or policies behaves
//! exactly as if this module did not exist.

use furrow_types::{
    Accounts, Finance, FinanceReport, FinancingFlows, InsurancePolicy, LedgerLine, Loan, LoanId,
    PolicyId, ShockKind,
};
use tracing::{debug, info};

use crate::error::CoreError;

/// Longest accepted loan term (25 years of seasons).
pub const MAX_LOAN_TERM: u32 = 100;

/// Outstanding principal below this is treated as repaid.
const REPAID_EPSILON: f64 = 1e-9;

/// Borrow `amount`, repaid in `term_seasons` equal installments.
///
/// The amount is credited to cash immediately.
///
/// # Errors
///
/// Returns [`CoreError::InvalidRequest`] for a non-positive or non-finite
/// amount, or a term outside `1..=MAX_LOAN_TERM`.
pub fn take_loan(
    accounts: &mut Accounts,
    finance: &mut Finance,
    amount: f64,
    term_seasons: u32,
) -> Result<Loan, CoreError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(CoreError::invalid(format!(
            "loan amount must be positive, got {amount}"
        )));
    }
    if term_seasons == 0 || term_seasons > MAX_LOAN_TERM {
        return Err(CoreError::invalid(format!(
            "loan term must be between 1 and {MAX_LOAN_TERM} seasons, got {term_seasons}"
        )));
    }

    let loan = Loan {
        id: LoanId::new(),
        principal: amount,
        term_seasons,
        remaining_seasons: term_seasons,
        outstanding: amount,
    };
    finance.cash += amount;
    accounts.loans.push(loan.clone());
    info!(loan_id = %loan.id, amount, term_seasons, "Loan taken");
    Ok(loan)
}

/// Buy a policy paying `sum_insured` whenever a `coverage` shock fires.
///
/// # Errors
///
/// Returns [`CoreError::InvalidRequest`] for a non-positive or non-finite
/// sum.
pub fn insure(
    accounts: &mut Accounts,
    coverage: ShockKind,
    sum_insured: f64,
    premium_rate: f64,
) -> Result<InsurancePolicy, CoreError> {
    if !sum_insured.is_finite() || sum_insured <= 0.0 {
        return Err(CoreError::invalid(format!(
            "sum insured must be positive, got {sum_insured}"
        )));
    }
    let policy = InsurancePolicy {
        id: PolicyId::new(),
        coverage,
        sum_insured,
        premium: premium_rate * sum_insured,
    };
    accounts.policies.push(policy.clone());
    info!(policy_id = %policy.id, ?coverage, sum_insured, "Policy bought");
    Ok(policy)
}

/// Settle one season of financing.
///
/// Every loan with installments left pays `principal / term` (the last
/// installment clears whatever is outstanding). Every policy charges its
/// premium and pays out if `fired` matches its coverage.
pub fn settle_season(accounts: &mut Accounts, fired: Option<ShockKind>) -> FinancingFlows {
    let mut flows = FinancingFlows::default();

    for loan in accounts.loans.iter_mut().filter(|l| l.remaining_seasons > 0) {
        let installment = if loan.remaining_seasons == 1 {
            loan.outstanding
        } else {
            (loan.principal / f64::from(loan.term_seasons)).min(loan.outstanding)
        };
        loan.outstanding -= installment;
        if loan.outstanding < REPAID_EPSILON {
            loan.outstanding = 0.0;
        }
        loan.remaining_seasons = loan.remaining_seasons.saturating_sub(1);
        flows.repayments += installment;
    }

    for policy in &accounts.policies {
        flows.premiums += policy.premium;
        if fired == Some(policy.coverage) {
            flows.payouts += policy.sum_insured;
            debug!(policy_id = %policy.id, payout = policy.sum_insured, "Policy paid out");
        }
    }

    flows
}

/// Append one ledger line.
pub fn record(accounts: &mut Accounts, line: LedgerLine) {
    accounts.ledger.push(line);
}

/// Summarize the ledger, optionally for a single year.
pub fn report(accounts: &Accounts, year: Option<i32>) -> FinanceReport {
    let lines: Vec<&LedgerLine> = accounts
        .ledger
        .iter()
        .filter(|line| year.is_none_or(|y| line.year == y))
        .collect();

    let active_loans: Vec<Loan> = accounts
        .loans
        .iter()
        .filter(|loan| loan.remaining_seasons > 0)
        .cloned()
        .collect();

    FinanceReport {
        year,
        seasons: lines.len(),
        revenue: lines.iter().map(|l| l.income).sum(),
        opex: lines.iter().map(|l| l.cost).sum(),
        premiums: lines.iter().map(|l| l.financing.premiums).sum(),
        payouts: lines.iter().map(|l| l.financing.payouts).sum(),
        repayments: lines.iter().map(|l| l.financing.repayments).sum(),
        outstanding_debt: active_loans.iter().map(|l| l.outstanding).sum(),
        active_loans,
        policies: accounts.policies.clone(),
    }
}
