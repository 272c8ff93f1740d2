use serde::{Deserialize, Serialize};

pub const LIQUIDATION_THRESHOLD_PCT: f64 = 80.0;
pub const MAX_TIME_HORIZON: u32 = 100;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RatePreset {
    Bear,
    Base,
    Bull,
}

impl RatePreset {
    pub fn linear_bounds(self) -> (f64, f64) {
        match self {
            RatePreset::Bear => (20.0, 5.0),
            RatePreset::Base => (40.0, 15.0),
            RatePreset::Bull => (60.0, 25.0),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum RateCurve {
    Flat { rate: f64 },
    Linear { start: f64, end: f64 },
    Preset { preset: RatePreset },
    Custom { rates: Vec<f64> },
}

impl Default for RateCurve {
    fn default() -> Self {
        RateCurve::Flat { rate: 0.0 }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Allocation {
    pub savings: f64,
    pub investments: f64,
    pub speculation: f64,
}

impl Allocation {
    pub fn new(savings: f64, investments: f64, speculation: f64) -> Self {
        Self {
            savings,
            investments,
            speculation,
        }
    }

    pub fn total(self) -> f64 {
        self.savings + self.investments + self.speculation
    }

    pub fn yield_bearing(self) -> f64 {
        self.investments + self.speculation
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AllocationUpdate {
    pub savings: Option<f64>,
    pub investments: Option<f64>,
    pub speculation: Option<f64>,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoanSettings {
    pub collateral_pct: f64,
    pub ltv: f64,
    pub interest_rate: f64,
    pub term_years: u32,
    pub interest_only: bool,
}

impl LoanSettings {
    pub fn is_active(&self) -> bool {
        self.collateral_pct != 0.0 && self.ltv != 0.0
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Configuration {
    pub time_horizon: u32,
    pub btc_stack: f64,
    pub exchange_rate: f64,
    pub allocation: Allocation,
    pub investments_yield: RateCurve,
    pub speculation_yield: RateCurve,
    pub activation_year: u32,
    pub annual_expenses: f64,
    pub btc_price_growth: RateCurve,
    pub inflation: RateCurve,
    pub income_growth: RateCurve,
    pub loan: LoanSettings,
    pub income_allocation_pct: f64,
    pub annual_reallocation: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            time_horizon: 20,
            btc_stack: 1.0,
            exchange_rate: 100_000.0,
            allocation: Allocation::new(65.0, 25.0, 10.0),
            investments_yield: RateCurve::Linear {
                start: 6.0,
                end: 4.0,
            },
            speculation_yield: RateCurve::Linear {
                start: 16.0,
                end: 10.0,
            },
            activation_year: 2,
            annual_expenses: 50_000.0,
            btc_price_growth: RateCurve::Preset {
                preset: RatePreset::Base,
            },
            inflation: RateCurve::Flat { rate: 3.0 },
            income_growth: RateCurve::Flat { rate: 0.0 },
            loan: LoanSettings {
                collateral_pct: 0.0,
                ltv: 40.0,
                interest_rate: 12.0,
                term_years: 5,
                interest_only: true,
            },
            income_allocation_pct: 50.0,
            annual_reallocation: false,
        }
    }
}

impl Configuration {
    pub fn with_activation_year(&self, activation_year: u32) -> Self {
        Self {
            activation_year,
            ..self.clone()
        }
    }

    pub fn with_allocation(&self, allocation: Allocation) -> Self {
        Self {
            allocation,
            ..self.clone()
        }
    }

    pub fn year_count(&self) -> usize {
        self.time_horizon as usize + 1
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationCheck {
    pub is_valid: bool,
    pub total: f64,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyRates {
    pub investment_yield: Vec<f64>,
    pub speculation_yield: Vec<f64>,
    pub btc_price_growth: Vec<f64>,
    pub inflation: Vec<f64>,
    pub income_growth: Vec<f64>,
    pub btc_price: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeSeries {
    pub usd_income: Vec<f64>,
    pub usd_income_leveraged: Vec<f64>,
    pub btc_income: Vec<f64>,
    pub btc_income_leveraged: Vec<f64>,
    pub annual_expenses: Vec<f64>,
    pub btc_expenses: Vec<f64>,
    pub income_at_activation: Vec<f64>,
    pub expenses_at_activation: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanDetails {
    pub loan_principal: f64,
    pub liquidation_price: f64,
    pub annual_payments: f64,
    pub collateral_btc: f64,
    pub btc_stack_at_activation: f64,
    pub btc_price_at_activation: f64,
    pub term_years: u32,
    pub interest_only: bool,
    pub total_interest: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalCollateral {
    pub additional_btc: f64,
    pub total_collateral_btc: f64,
    pub current_liquidation_price: f64,
    pub improved_liquidation_price: f64,
    pub effective_ltv: f64,
    pub liquidation_price_reduction_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Projection {
    pub time_horizon: u32,
    pub activation_year: u32,
    pub rates: YearlyRates,
    pub btc_with_income: Vec<f64>,
    pub btc_without_income: Vec<f64>,
    pub usd_income: Vec<f64>,
    pub usd_income_leveraged: Vec<f64>,
    pub btc_income: Vec<f64>,
    pub btc_income_leveraged: Vec<f64>,
    pub annual_expenses: Vec<f64>,
    pub btc_expenses: Vec<f64>,
    pub income_at_activation: Vec<f64>,
    pub expenses_at_activation: Vec<f64>,
    pub loan: Option<LoanDetails>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GrowthTier {
    Decline,
    Modest,
    Solid,
    High,
    Exponential,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LiquidationRisk {
    AtRisk,
    Moderate,
    Safe,
    VerySafe,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum EscapeComparison {
    LeverageFaster { years: u32 },
    BaseFaster { years: u32 },
    Tie { year: u32 },
    LeverageOnly { year: u32 },
    BaseOnly { year: u32 },
    Neither,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightData {
    pub activation_year: u32,
    pub escape_velocity_year: Option<u32>,
    pub leveraged_escape_velocity_year: Option<u32>,
    pub escape_comparison: EscapeComparison,
    pub escape_message: String,
    pub growth_percent: f64,
    pub growth_tier: GrowthTier,
    pub income_cost_btc: f64,
    pub liquidation_buffer_pct: Option<f64>,
    pub liquidation_risk: Option<LiquidationRisk>,
    pub loan: Option<LoanDetails>,
    pub additional_collateral: Option<AdditionalCollateral>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub projection: Projection,
    pub insights: InsightData,
}
