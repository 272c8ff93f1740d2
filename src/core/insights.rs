use super::loan::{additional_collateral_potential, liquidation_buffer};
use super::types::{
    Configuration, EscapeComparison, GrowthTier, InsightData, LiquidationRisk, Projection,
};

pub fn find_escape_velocity_year(income: &[f64], expenses: &[f64], enabled: bool) -> Option<u32> {
    if !enabled {
        return None;
    }
    income
        .iter()
        .zip(expenses)
        .position(|(income, expense)| income > expense)
        .map(|year| year as u32)
}

pub fn compare_escape_years(base: Option<u32>, leveraged: Option<u32>) -> EscapeComparison {
    match (base, leveraged) {
        (Some(base), Some(leveraged)) => {
            let diff = i64::from(base) - i64::from(leveraged);
            if diff > 0 {
                EscapeComparison::LeverageFaster {
                    years: diff as u32,
                }
            } else if diff < 0 {
                EscapeComparison::BaseFaster {
                    years: diff.unsigned_abs() as u32,
                }
            } else {
                EscapeComparison::Tie { year: base }
            }
        }
        (None, Some(year)) => EscapeComparison::LeverageOnly { year },
        (Some(year), None) => EscapeComparison::BaseOnly { year },
        (None, None) => EscapeComparison::Neither,
    }
}

fn plural(years: u32) -> &'static str {
    if years == 1 { "year" } else { "years" }
}

impl EscapeComparison {
    pub fn message(&self) -> String {
        match *self {
            EscapeComparison::LeverageFaster { years } => format!(
                "Leverage reaches escape velocity {years} {} sooner than the base strategy",
                plural(years)
            ),
            EscapeComparison::BaseFaster { years } => format!(
                "The base strategy reaches escape velocity {years} {} sooner; \
                 debt service outweighs the borrowed yield",
                plural(years)
            ),
            EscapeComparison::Tie { year } => format!(
                "Both strategies reach escape velocity in year {year}; \
                 leverage adds risk without saving time"
            ),
            EscapeComparison::LeverageOnly { year } => format!(
                "Only the leveraged strategy reaches escape velocity, in year {year}"
            ),
            EscapeComparison::BaseOnly { year } => {
                format!("Only the base strategy reaches escape velocity, in year {year}")
            }
            EscapeComparison::Neither => {
                "Income does not exceed expenses within the time horizon".to_string()
            }
        }
    }
}

pub fn growth_percent(initial: f64, final_value: f64) -> f64 {
    (final_value - initial) / initial * 100.0
}

pub fn classify_growth(percent: f64) -> GrowthTier {
    if percent.is_nan() || percent < 0.0 {
        GrowthTier::Decline
    } else if percent < 100.0 {
        GrowthTier::Modest
    } else if percent < 300.0 {
        GrowthTier::Solid
    } else if percent < 1_000.0 {
        GrowthTier::High
    } else {
        GrowthTier::Exponential
    }
}

pub fn classify_liquidation_risk(buffer_pct: f64) -> LiquidationRisk {
    if buffer_pct.is_nan() || buffer_pct < 25.0 {
        LiquidationRisk::AtRisk
    } else if buffer_pct < 50.0 {
        LiquidationRisk::Moderate
    } else if buffer_pct < 100.0 {
        LiquidationRisk::Safe
    } else {
        LiquidationRisk::VerySafe
    }
}

pub fn build_insights(config: &Configuration, projection: &Projection) -> InsightData {
    let activation_year = projection.activation_year;

    let escape_velocity_year = find_escape_velocity_year(
        &projection.usd_income,
        &projection.annual_expenses,
        true,
    );
    let leveraged_enabled = config.loan.collateral_pct > 0.0 && projection.loan.is_some();
    let leveraged_escape_velocity_year = find_escape_velocity_year(
        &projection.usd_income_leveraged,
        &projection.annual_expenses,
        leveraged_enabled,
    );
    let escape_comparison =
        compare_escape_years(escape_velocity_year, leveraged_escape_velocity_year);

    let initial = projection
        .btc_with_income
        .first()
        .copied()
        .unwrap_or(config.btc_stack);
    let final_with = projection.btc_with_income.last().copied().unwrap_or(initial);
    let final_without = projection
        .btc_without_income
        .last()
        .copied()
        .unwrap_or(initial);
    let growth = growth_percent(initial, final_with);

    let liquidation_buffer_pct = liquidation_buffer(config, activation_year, config.time_horizon);

    InsightData {
        activation_year,
        escape_velocity_year,
        leveraged_escape_velocity_year,
        escape_message: escape_comparison.message(),
        escape_comparison,
        growth_percent: growth,
        growth_tier: classify_growth(growth),
        income_cost_btc: final_without - final_with,
        liquidation_buffer_pct,
        liquidation_risk: liquidation_buffer_pct.map(classify_liquidation_risk),
        loan: projection.loan.clone(),
        additional_collateral: additional_collateral_potential(config, activation_year),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, proptest};

    #[test]
    fn escape_velocity_is_first_year_income_strictly_exceeds_expenses() {
        let income = [50_000.0, 50_000.0, 50_000.0, 120_000.0, 150_000.0];
        let expenses = [75_000.0; 5];
        assert_eq!(find_escape_velocity_year(&income, &expenses, true), Some(3));
    }

    #[test]
    fn equal_income_and_expenses_is_not_escape_velocity() {
        let income = [75_000.0, 75_000.0, 80_000.0];
        let expenses = [75_000.0; 3];
        assert_eq!(find_escape_velocity_year(&income, &expenses, true), Some(2));
    }

    #[test]
    fn escape_velocity_never_reached_or_disabled_is_none() {
        let income = [10.0, 20.0, 30.0];
        let expenses = [100.0; 3];
        assert_eq!(find_escape_velocity_year(&income, &expenses, true), None);

        let income = [200.0, 200.0, 200.0];
        assert_eq!(find_escape_velocity_year(&income, &expenses, false), None);
    }

    #[test]
    fn escape_velocity_scans_final_year_inclusive() {
        let income = [0.0, 0.0, 0.0, 101.0];
        let expenses = [100.0; 4];
        assert_eq!(find_escape_velocity_year(&income, &expenses, true), Some(3));
    }

    #[test]
    fn comparison_distinguishes_every_outcome() {
        let faster = compare_escape_years(Some(7), Some(4));
        let slower = compare_escape_years(Some(4), Some(7));
        let tie = compare_escape_years(Some(5), Some(5));
        assert_eq!(faster, EscapeComparison::LeverageFaster { years: 3 });
        assert_eq!(slower, EscapeComparison::BaseFaster { years: 3 });
        assert_eq!(tie, EscapeComparison::Tie { year: 5 });
        assert_eq!(
            compare_escape_years(None, Some(2)),
            EscapeComparison::LeverageOnly { year: 2 }
        );
        assert_eq!(
            compare_escape_years(Some(2), None),
            EscapeComparison::BaseOnly { year: 2 }
        );
        assert_eq!(compare_escape_years(None, None), EscapeComparison::Neither);

        let messages = [
            faster.message(),
            slower.message(),
            tie.message(),
            EscapeComparison::LeverageOnly { year: 2 }.message(),
            EscapeComparison::BaseOnly { year: 2 }.message(),
            EscapeComparison::Neither.message(),
        ];
        for (i, a) in messages.iter().enumerate() {
            for b in &messages[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert!(faster.message().contains("3 years"));
        assert!(
            EscapeComparison::LeverageFaster { years: 1 }
                .message()
                .contains("1 year ")
        );
    }

    #[test]
    fn growth_tiers_are_ordered_and_bounded() {
        assert!(GrowthTier::Decline < GrowthTier::Modest);
        assert!(GrowthTier::Modest < GrowthTier::Solid);
        assert!(GrowthTier::Solid < GrowthTier::High);
        assert!(GrowthTier::High < GrowthTier::Exponential);

        assert_eq!(classify_growth(-0.01), GrowthTier::Decline);
        assert_eq!(classify_growth(0.0), GrowthTier::Modest);
        assert_eq!(classify_growth(100.0), GrowthTier::Solid);
        assert_eq!(classify_growth(300.0), GrowthTier::High);
        assert_eq!(classify_growth(1_000.0), GrowthTier::Exponential);
        assert_eq!(classify_growth(f64::NAN), GrowthTier::Decline);
    }

    #[test]
    fn liquidation_risk_boundaries() {
        assert!(LiquidationRisk::AtRisk < LiquidationRisk::Moderate);
        assert!(LiquidationRisk::Moderate < LiquidationRisk::Safe);
        assert!(LiquidationRisk::Safe < LiquidationRisk::VerySafe);

        assert_eq!(classify_liquidation_risk(-40.0), LiquidationRisk::AtRisk);
        assert_eq!(classify_liquidation_risk(24.99), LiquidationRisk::AtRisk);
        assert_eq!(classify_liquidation_risk(25.0), LiquidationRisk::Moderate);
        assert_eq!(classify_liquidation_risk(50.0), LiquidationRisk::Safe);
        assert_eq!(classify_liquidation_risk(99.99), LiquidationRisk::Safe);
        assert_eq!(classify_liquidation_risk(100.0), LiquidationRisk::VerySafe);
    }

    #[test]
    fn growth_percent_from_initial_to_final() {
        assert!((growth_percent(2.0, 3.0) - 50.0).abs() < 1e-12);
        assert!((growth_percent(2.0, 1.0) + 50.0).abs() < 1e-12);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(128))]

        #[test]
        fn prop_growth_tier_is_monotonic(a in -100_000i32..200_000, b in -100_000i32..200_000) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let lo = lo as f64 / 100.0;
            let hi = hi as f64 / 100.0;
            prop_assert!(classify_growth(lo) <= classify_growth(hi));
        }

        #[test]
        fn prop_liquidation_risk_is_monotonic(a in -10_000i32..50_000, b in -10_000i32..50_000) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let lo = lo as f64 / 100.0;
            let hi = hi as f64 / 100.0;
            prop_assert!(classify_liquidation_risk(lo) <= classify_liquidation_risk(hi));
        }
    }
}
