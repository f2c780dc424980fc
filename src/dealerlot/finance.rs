//! Deal calculators used at the sales desk: loan payments for buyers and the
//! expected return on a vehicle bought at auction.

use crate::error::{DealerError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct LoanQuote {
    pub principal: f64,
    pub apr_percent: f64,
    pub months: u32,
    pub monthly_payment: f64,
    pub total_paid: f64,
    pub total_interest: f64,
}

/// Fixed monthly payment for a fully amortizing loan.
///
/// A zero APR divides the principal evenly. A zero term is an error.
pub fn monthly_payment(principal: f64, apr_percent: f64, months: u32) -> Result<f64> {
    if months == 0 {
        return Err(DealerError::Api("Loan term must be at least one month".into()));
    }
    if principal < 0.0 || apr_percent < 0.0 {
        return Err(DealerError::Api(
            "Principal and APR cannot be negative".into(),
        ));
    }

    let n = f64::from(months);
    let rate = apr_percent / 100.0 / 12.0;
    if rate == 0.0 {
        return Ok(principal / n);
    }
    let growth = (1.0 + rate).powf(n);
    Ok(principal * rate * growth / (growth - 1.0))
}

/// Quotes a loan on `price` after `down_payment`.
pub fn quote_loan(price: f64, down_payment: f64, apr_percent: f64, months: u32) -> Result<LoanQuote> {
    let principal = (price - down_payment).max(0.0);
    let payment = monthly_payment(principal, apr_percent, months)?;
    let total_paid = payment * f64::from(months);
    Ok(LoanQuote {
        principal,
        apr_percent,
        months,
        monthly_payment: payment,
        total_paid,
        total_interest: total_paid - principal,
    })
}

/// Costs of acquiring a vehicle at auction and the price it is expected to fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuctionCosts {
    pub hammer_price: f64,
    pub buyer_fee: f64,
    pub transport: f64,
    pub reconditioning: f64,
    pub expected_sale_price: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuctionRoi {
    pub total_cost: f64,
    pub expected_profit: f64,
    /// Profit as a percentage of total cost; `0.0` when there is no cost.
    pub roi_percent: f64,
}

pub fn auction_roi(costs: &AuctionCosts) -> AuctionRoi {
    let total_cost = costs.hammer_price + costs.buyer_fee + costs.transport + costs.reconditioning;
    let expected_profit = costs.expected_sale_price - total_cost;
    let roi_percent = if total_cost > 0.0 {
        expected_profit / total_cost * 100.0
    } else {
        0.0
    };
    AuctionRoi {
        total_cost,
        expected_profit,
        roi_percent,
    }
}
