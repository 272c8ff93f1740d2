use super::growth::Buckets;
use super::rates::blended_yield;
use super::types::{Configuration, IncomeSeries, LoanDetails, YearlyRates};

// Zero income stays exactly zero instead of 0 / price.
pub fn to_btc(usd: f64, btc_price: f64) -> f64 {
    if usd == 0.0 { 0.0 } else { usd / btc_price }
}

pub fn project_expenses(starting_expenses: f64, inflation: &[f64]) -> Vec<f64> {
    let mut expenses = Vec::with_capacity(inflation.len());
    let mut current = starting_expenses;
    for rate in inflation {
        expenses.push(current);
        current *= 1.0 + rate / 100.0;
    }
    expenses
}

pub fn income_if_activated(
    config: &Configuration,
    rates: &YearlyRates,
    plain_buckets: &[Buckets],
    year: usize,
) -> f64 {
    let Some(buckets) = plain_buckets.get(year) else {
        return 0.0;
    };
    let yield_btc = buckets.investments * rates.investment_yield[year] / 100.0
        + buckets.speculation * rates.speculation_yield[year] / 100.0;
    yield_btc * config.income_allocation_pct / 100.0 * rates.btc_price[year]
}

// Frozen at the activation year: borrowed principal earns the blended yield,
// less the year's debt service.
pub fn leverage_income_adjustment(
    config: &Configuration,
    rates: &YearlyRates,
    loan: Option<&LoanDetails>,
) -> f64 {
    let Some(loan) = loan else {
        return 0.0;
    };
    let activation = config.activation_year as usize;
    loan.loan_principal * blended_yield(config, rates, activation) / 100.0 - loan.annual_payments
}

pub fn project_income(
    config: &Configuration,
    rates: &YearlyRates,
    plain_buckets: &[Buckets],
    loan: Option<&LoanDetails>,
) -> IncomeSeries {
    let year_count = config.year_count();
    let activation = config.activation_year as usize;

    let income_at_activation: Vec<f64> = (0..year_count)
        .map(|year| income_if_activated(config, rates, plain_buckets, year))
        .collect();
    let annual_expenses = project_expenses(config.annual_expenses, &rates.inflation);

    let mut usd_income = vec![0.0; year_count];
    if activation < year_count {
        usd_income[activation] = income_at_activation[activation];
        for year in activation + 1..year_count {
            usd_income[year] = usd_income[year - 1] * (1.0 + rates.income_growth[year - 1] / 100.0);
        }
    }

    let adjustment = leverage_income_adjustment(config, rates, loan);
    let usd_income_leveraged: Vec<f64> = usd_income
        .iter()
        .enumerate()
        .map(|(year, base)| {
            if year >= activation {
                base + adjustment
            } else {
                *base
            }
        })
        .collect();

    let price = &rates.btc_price;
    let btc_income = usd_income
        .iter()
        .zip(price)
        .map(|(usd, p)| to_btc(*usd, *p))
        .collect();
    let btc_income_leveraged = usd_income_leveraged
        .iter()
        .zip(price)
        .map(|(usd, p)| to_btc(*usd, *p))
        .collect();
    let btc_expenses = annual_expenses
        .iter()
        .zip(price)
        .map(|(usd, p)| to_btc(*usd, *p))
        .collect();

    IncomeSeries {
        usd_income,
        usd_income_leveraged,
        btc_income,
        btc_income_leveraged,
        expenses_at_activation: annual_expenses.clone(),
        annual_expenses,
        btc_expenses,
        income_at_activation,
    }
}
