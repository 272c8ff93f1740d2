use super::growth::btc_stack_at_activation;
use super::rates::{price_at, price_series_through};
use super::types::{AdditionalCollateral, Configuration, LIQUIDATION_THRESHOLD_PCT, LoanDetails};

pub fn annual_loan_payment(
    principal: f64,
    rate_pct: f64,
    term_years: u32,
    interest_only: bool,
) -> f64 {
    let r = rate_pct / 100.0;
    if interest_only {
        return principal * r;
    }
    let n = term_years as f64;
    if r == 0.0 {
        return principal / n;
    }
    let growth = (1.0 + r).powf(n);
    principal * r * growth / (growth - 1.0)
}

pub fn liquidation_price(btc_price: f64, ltv: f64) -> f64 {
    btc_price * (ltv / LIQUIDATION_THRESHOLD_PCT)
}

pub fn loan_details(config: &Configuration, activation_year: u32) -> Option<LoanDetails> {
    let loan = &config.loan;
    if !loan.is_active() || activation_year > config.time_horizon {
        return None;
    }

    let stack = btc_stack_at_activation(config, activation_year, config.btc_stack);
    let btc_price = price_at(config, activation_year);
    let collateral_btc = stack * config.allocation.savings / 100.0 * loan.collateral_pct / 100.0;
    let loan_principal = collateral_btc * loan.ltv / 100.0 * btc_price;
    let annual_payments = annual_loan_payment(
        loan_principal,
        loan.interest_rate,
        loan.term_years,
        loan.interest_only,
    );
    let scheduled_total = annual_payments * loan.term_years as f64;
    let total_interest = if loan.interest_only {
        scheduled_total
    } else {
        scheduled_total - loan_principal
    };

    Some(LoanDetails {
        loan_principal,
        liquidation_price: liquidation_price(btc_price, loan.ltv),
        annual_payments,
        collateral_btc,
        btc_stack_at_activation: stack,
        btc_price_at_activation: btc_price,
        term_years: loan.term_years,
        interest_only: loan.interest_only,
        total_interest,
    })
}

// Negative means the price path crossed the liquidation price inside the window.
pub fn liquidation_buffer(
    config: &Configuration,
    activation_year: u32,
    horizon_end_year: u32,
) -> Option<f64> {
    let details = loan_details(config, activation_year)?;
    if horizon_end_year < activation_year {
        return None;
    }
    let prices = price_series_through(config, horizon_end_year);
    let min_price = prices[activation_year as usize..]
        .iter()
        .copied()
        .fold(f64::INFINITY, f64::min);
    let liquidation = details.liquidation_price;
    Some((min_price - liquidation) / liquidation * 100.0)
}

pub fn additional_collateral_potential(
    config: &Configuration,
    activation_year: u32,
) -> Option<AdditionalCollateral> {
    if config.loan.collateral_pct >= 100.0 {
        return None;
    }
    let details = loan_details(config, activation_year)?;

    let savings_btc = details.btc_stack_at_activation * config.allocation.savings / 100.0;
    let additional_btc = (savings_btc - details.collateral_btc).max(0.0);
    if additional_btc <= 0.0 {
        return None;
    }
    let total_collateral_btc = details.collateral_btc + additional_btc;
    let threshold = LIQUIDATION_THRESHOLD_PCT / 100.0;
    let improved_liquidation_price = details.loan_principal / (total_collateral_btc * threshold);
    let effective_ltv =
        details.loan_principal / (total_collateral_btc * details.btc_price_at_activation) * 100.0;
    let current = details.liquidation_price;

    Some(AdditionalCollateral {
        additional_btc,
        total_collateral_btc,
        current_liquidation_price: current,
        improved_liquidation_price,
        effective_ltv,
        liquidation_price_reduction_pct: (current - improved_liquidation_price) / current * 100.0,
    })
}
