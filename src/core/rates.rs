use super::types::{Configuration, RateCurve, YearlyRates};

impl RateCurve {
    // Linear curves divide by the horizon, so a zero horizon yields NaN at year 0.
    pub fn rate_at(&self, year: u32, horizon: u32) -> f64 {
        match self {
            RateCurve::Flat { rate } => *rate,
            RateCurve::Linear { start, end } => linear_rate(*start, *end, year, horizon),
            RateCurve::Preset { preset } => {
                let (start, end) = preset.linear_bounds();
                linear_rate(start, end, year, horizon)
            }
            RateCurve::Custom { rates } => rates.get(year as usize).copied().unwrap_or(0.0),
        }
    }

    pub fn resolve(&self, horizon: u32) -> Vec<f64> {
        (0..=horizon).map(|year| self.rate_at(year, horizon)).collect()
    }

    pub fn custom_len(&self) -> Option<usize> {
        match self {
            RateCurve::Custom { rates } => Some(rates.len()),
            _ => None,
        }
    }
}

// Past the horizon the curve holds at its end value.
fn linear_rate(start: f64, end: f64, year: u32, horizon: u32) -> f64 {
    if year > horizon {
        return end;
    }
    start - (start - end) * (year as f64 / horizon as f64)
}

pub fn price_series_through(config: &Configuration, last_year: u32) -> Vec<f64> {
    let mut prices = Vec::with_capacity(last_year as usize + 1);
    let mut price = config.exchange_rate;
    prices.push(price);
    for year in 1..=last_year {
        let growth = config
            .btc_price_growth
            .rate_at(year - 1, config.time_horizon);
        price *= 1.0 + growth / 100.0;
        prices.push(price);
    }
    prices
}

pub fn price_at(config: &Configuration, year: u32) -> f64 {
    (0..year).fold(config.exchange_rate, |price, step| {
        price * (1.0 + config.btc_price_growth.rate_at(step, config.time_horizon) / 100.0)
    })
}

pub fn resolve_yearly_rates(config: &Configuration) -> YearlyRates {
    let horizon = config.time_horizon;
    YearlyRates {
        investment_yield: config.investments_yield.resolve(horizon),
        speculation_yield: config.speculation_yield.resolve(horizon),
        btc_price_growth: config.btc_price_growth.resolve(horizon),
        inflation: config.inflation.resolve(horizon),
        income_growth: config.income_growth.resolve(horizon),
        btc_price: price_series_through(config, horizon),
    }
}

pub fn blended_yield(config: &Configuration, rates: &YearlyRates, year: usize) -> f64 {
    let allocation = config.allocation;
    let weight = allocation.yield_bearing();
    if weight <= 0.0 {
        return 0.0;
    }
    let investment = rates.investment_yield.get(year).copied().unwrap_or(0.0);
    let speculation = rates.speculation_yield.get(year).copied().unwrap_or(0.0);
    (allocation.investments * investment + allocation.speculation * speculation) / weight
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::RatePreset;
    use proptest::prelude::{prop_assert, proptest};

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn flat_curve_is_constant_across_years() {
        let curve = RateCurve::Flat { rate: 7.5 };
        for year in 0..=30 {
            assert_approx(curve.rate_at(year, 30), 7.5);
        }
    }

    #[test]
    fn linear_curve_interpolates_between_bounds() {
        let curve = RateCurve::Linear {
            start: 40.0,
            end: 20.0,
        };
        let resolved = curve.resolve(4);
        let expected = [40.0, 35.0, 30.0, 25.0, 20.0];
        assert_eq!(resolved.len(), expected.len());
        for (actual, expected) in resolved.iter().zip(expected) {
            assert_approx(*actual, expected);
        }
    }

    #[test]
    fn linear_curve_with_zero_horizon_is_nan() {
        let curve = RateCurve::Linear {
            start: 40.0,
            end: 20.0,
        };
        assert!(curve.rate_at(0, 0).is_nan());
        assert_eq!(curve.resolve(0).len(), 1);
    }

    #[test]
    fn preset_curve_uses_its_linear_bounds() {
        let curve = RateCurve::Preset {
            preset: RatePreset::Bull,
        };
        let (start, end) = RatePreset::Bull.linear_bounds();
        assert_approx(curve.rate_at(0, 10), start);
        assert_approx(curve.rate_at(10, 10), end);
        assert_approx(curve.rate_at(5, 10), (start + end) / 2.0);
    }

    #[test]
    fn linear_and_preset_curves_hold_end_value_past_horizon() {
        let curve = RateCurve::Linear {
            start: 40.0,
            end: 20.0,
        };
        assert_approx(curve.rate_at(4, 4), 20.0);
        assert_approx(curve.rate_at(5, 4), 20.0);
        assert_approx(curve.rate_at(1_000, 4), 20.0);

        let preset = RateCurve::Preset {
            preset: RatePreset::Base,
        };
        let (_, end) = RatePreset::Base.linear_bounds();
        assert_approx(preset.rate_at(10_000, 20), end);
    }

    #[test]
    fn price_stays_positive_far_past_horizon() {
        let mut config = Configuration::default();
        config.time_horizon = 20;
        config.exchange_rate = 100_000.0;
        config.btc_price_growth = RateCurve::Preset {
            preset: RatePreset::Base,
        };
        assert!(price_at(&config, 500) > 0.0);
    }

    #[test]
    fn price_at_matches_last_entry_of_price_series() {
        let mut config = Configuration::default();
        config.time_horizon = 6;
        config.btc_price_growth = RateCurve::Custom {
            rates: vec![10.0, -20.0, 35.0],
        };
        let prices = price_series_through(&config, 8);
        for year in 0..=8 {
            assert_approx(price_at(&config, year), prices[year as usize]);
        }
    }

    #[test]
    fn custom_curve_missing_years_resolve_to_zero() {
        let curve = RateCurve::Custom {
            rates: vec![10.0, 12.0],
        };
        assert_eq!(curve.resolve(4), vec![10.0, 12.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn price_at_year_zero_ignores_first_rate() {
        let mut config = Configuration::default();
        config.exchange_rate = 50_000.0;
        config.btc_price_growth = RateCurve::Custom {
            rates: vec![100.0, 0.0],
        };
        assert_approx(price_at(&config, 0), 50_000.0);
        assert_approx(price_at(&config, 1), 100_000.0);
        assert_approx(price_at(&config, 2), 100_000.0);
    }

    #[test]
    fn price_compounds_forward_from_exchange_rate() {
        let mut config = Configuration::default();
        config.exchange_rate = 50_000.0;
        config.time_horizon = 10;
        config.btc_price_growth = RateCurve::Flat { rate: 10.0 };
        let prices = price_series_through(&config, 3);
        assert_eq!(prices.len(), 4);
        assert!((prices[3] - 66_550.0).abs() < 1e-6);
    }

    #[test]
    fn price_series_can_extend_past_horizon() {
        let mut config = Configuration::default();
        config.time_horizon = 2;
        config.exchange_rate = 1_000.0;
        config.btc_price_growth = RateCurve::Flat { rate: 10.0 };
        let prices = price_series_through(&config, 5);
        assert_eq!(prices.len(), 6);
        assert!((prices[5] - 1_000.0 * 1.1_f64.powi(5)).abs() < 1e-6);
    }

    #[test]
    fn yearly_rates_cover_the_full_horizon() {
        let config = Configuration::default();
        let rates = resolve_yearly_rates(&config);
        let n = config.year_count();
        assert_eq!(rates.investment_yield.len(), n);
        assert_eq!(rates.speculation_yield.len(), n);
        assert_eq!(rates.btc_price_growth.len(), n);
        assert_eq!(rates.inflation.len(), n);
        assert_eq!(rates.income_growth.len(), n);
        assert_eq!(rates.btc_price.len(), n);
    }

    #[test]
    fn blended_yield_weights_by_allocation() {
        let mut config = Configuration::default();
        config.time_horizon = 4;
        config.allocation.savings = 50.0;
        config.allocation.investments = 30.0;
        config.allocation.speculation = 20.0;
        config.investments_yield = RateCurve::Flat { rate: 10.0 };
        config.speculation_yield = RateCurve::Flat { rate: 20.0 };
        let rates = resolve_yearly_rates(&config);
        assert_approx(blended_yield(&config, &rates, 0), 14.0);

        config.allocation.savings = 100.0;
        config.allocation.investments = 0.0;
        config.allocation.speculation = 0.0;
        assert_approx(blended_yield(&config, &rates, 0), 0.0);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_linear_curve_stays_between_bounds(
            start in 0u32..200,
            end in 0u32..200,
            horizon in 1u32..60,
            year_seed in 0u32..1000
        ) {
            let year = year_seed % (horizon + 1);
            let curve = RateCurve::Linear { start: start as f64, end: end as f64 };
            let rate = curve.rate_at(year, horizon);
            let lo = start.min(end) as f64;
            let hi = start.max(end) as f64;
            prop_assert!(rate >= lo - 1e-9 && rate <= hi + 1e-9);
        }
    }
}
