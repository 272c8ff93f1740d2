use std::collections::{HashMap, VecDeque};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use super::growth::{simulate_buckets, totals};
use super::income::project_income;
use super::insights::build_insights;
use super::loan::loan_details;
use super::rates::resolve_yearly_rates;
use super::types::{Analysis, Configuration, Projection, RateCurve};

pub fn run_projection(config: &Configuration) -> Projection {
    let rates = resolve_yearly_rates(config);
    let plain_buckets = simulate_buckets(config, &rates, None);
    let loan = loan_details(config, config.activation_year);
    let income = project_income(config, &rates, &plain_buckets, loan.as_ref());
    let with_income = simulate_buckets(config, &rates, Some(&income.btc_income));

    Projection {
        time_horizon: config.time_horizon,
        activation_year: config.activation_year,
        btc_with_income: totals(&with_income),
        btc_without_income: totals(&plain_buckets),
        usd_income: income.usd_income,
        usd_income_leveraged: income.usd_income_leveraged,
        btc_income: income.btc_income,
        btc_income_leveraged: income.btc_income_leveraged,
        annual_expenses: income.annual_expenses,
        btc_expenses: income.btc_expenses,
        income_at_activation: income.income_at_activation,
        expenses_at_activation: income.expenses_at_activation,
        loan,
        rates,
    }
}

pub fn analyze(config: &Configuration, activation_year: u32) -> Analysis {
    let config = config.with_activation_year(activation_year);
    let projection = run_projection(&config);
    let insights = build_insights(&config, &projection);
    Analysis {
        projection,
        insights,
    }
}

fn hash_curve<H: Hasher>(curve: &RateCurve, state: &mut H) {
    match curve {
        RateCurve::Flat { rate } => {
            0_u8.hash(state);
            rate.to_bits().hash(state);
        }
        RateCurve::Linear { start, end } => {
            1_u8.hash(state);
            start.to_bits().hash(state);
            end.to_bits().hash(state);
        }
        RateCurve::Preset { preset } => {
            2_u8.hash(state);
            preset.hash(state);
        }
        RateCurve::Custom { rates } => {
            3_u8.hash(state);
            rates.len().hash(state);
            for rate in rates {
                rate.to_bits().hash(state);
            }
        }
    }
}

pub fn configuration_fingerprint(config: &Configuration) -> u64 {
    let mut state = DefaultHasher::new();
    config.time_horizon.hash(&mut state);
    config.btc_stack.to_bits().hash(&mut state);
    config.exchange_rate.to_bits().hash(&mut state);
    config.allocation.savings.to_bits().hash(&mut state);
    config.allocation.investments.to_bits().hash(&mut state);
    config.allocation.speculation.to_bits().hash(&mut state);
    hash_curve(&config.investments_yield, &mut state);
    hash_curve(&config.speculation_yield, &mut state);
    config.activation_year.hash(&mut state);
    config.annual_expenses.to_bits().hash(&mut state);
    hash_curve(&config.btc_price_growth, &mut state);
    hash_curve(&config.inflation, &mut state);
    hash_curve(&config.income_growth, &mut state);
    config.loan.collateral_pct.to_bits().hash(&mut state);
    config.loan.ltv.to_bits().hash(&mut state);
    config.loan.interest_rate.to_bits().hash(&mut state);
    config.loan.term_years.hash(&mut state);
    config.loan.interest_only.hash(&mut state);
    config.income_allocation_pct.to_bits().hash(&mut state);
    config.annual_reallocation.hash(&mut state);
    state.finish()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

#[derive(Debug)]
pub struct ProjectionCache {
    capacity: usize,
    entries: HashMap<u64, (Configuration, Arc<Projection>)>,
    insertion_order: VecDeque<u64>,
    hits: u64,
    misses: u64,
}

impl ProjectionCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            insertion_order: VecDeque::new(),
            hits: 0,
            misses: 0,
        }
    }

    pub fn projection(&mut self, config: &Configuration) -> Arc<Projection> {
        let key = configuration_fingerprint(config);
        if let Some((cached_config, projection)) = self.entries.get(&key) {
            if cached_config == config {
                self.hits += 1;
                return Arc::clone(projection);
            }
        }

        self.misses += 1;
        let projection = Arc::new(run_projection(config));
        // A fingerprint collision replaces the slot in place.
        if self.entries.contains_key(&key) {
            self.entries.insert(key, (config.clone(), Arc::clone(&projection)));
            return projection;
        }
        while self.entries.len() >= self.capacity {
            let Some(oldest) = self.insertion_order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
        }
        self.entries.insert(key, (config.clone(), Arc::clone(&projection)));
        self.insertion_order.push_back(key);
        projection
    }

    pub fn analyze(&mut self, config: &Configuration, activation_year: u32) -> Analysis {
        let config = config.with_activation_year(activation_year);
        let projection = self.projection(&config);
        let insights = build_insights(&config, &projection);
        Analysis {
            projection: (*projection).clone(),
            insights,
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.entries.len(),
        }
    }
}

impl Default for ProjectionCache {
    fn default() -> Self {
        Self::new(64)
    }
}
