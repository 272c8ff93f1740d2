mod allocation;
mod engine;
mod growth;
mod income;
mod insights;
mod loan;
mod rates;
mod types;

pub use allocation::{adjust_allocation, validate_allocation, validate_configuration};
pub use engine::{CacheStats, ProjectionCache, analyze, configuration_fingerprint, run_projection};
pub use growth::{Buckets, btc_stack_at_activation, simulate_buckets, totals};
pub use income::{project_expenses, project_income, to_btc};
pub use insights::{
    build_insights, classify_growth, classify_liquidation_risk, compare_escape_years,
    find_escape_velocity_year, growth_percent,
};
pub use loan::{
    additional_collateral_potential, annual_loan_payment, liquidation_buffer, liquidation_price,
    loan_details,
};
pub use rates::{price_at, price_series_through, resolve_yearly_rates};
pub use types::{
    AdditionalCollateral, Allocation, AllocationCheck, AllocationUpdate, Analysis, Configuration,
    EscapeComparison, GrowthTier, IncomeSeries, InsightData, LIQUIDATION_THRESHOLD_PCT,
    LiquidationRisk, LoanDetails, LoanSettings, MAX_TIME_HORIZON, Projection, RateCurve,
    RatePreset, ValidationReport, YearlyRates,
};
