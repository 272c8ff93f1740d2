use super::types::{
    Allocation, AllocationCheck, AllocationUpdate, Configuration, LIQUIDATION_THRESHOLD_PCT,
    MAX_TIME_HORIZON, ValidationReport,
};

// Exact comparison; callers round before validating.
pub fn validate_allocation(savings: f64, investments: f64, speculation: f64) -> AllocationCheck {
    let total = savings + investments + speculation;
    if total == 100.0 {
        AllocationCheck {
            is_valid: true,
            total,
            error: None,
        }
    } else {
        AllocationCheck {
            is_valid: false,
            total,
            error: Some(format!("Allocation must total 100% (currently {total}%)")),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Bucket {
    Savings,
    Investments,
    Speculation,
}

fn get(allocation: &Allocation, bucket: Bucket) -> f64 {
    match bucket {
        Bucket::Savings => allocation.savings,
        Bucket::Investments => allocation.investments,
        Bucket::Speculation => allocation.speculation,
    }
}

fn set(allocation: &mut Allocation, bucket: Bucket, value: f64) {
    match bucket {
        Bucket::Savings => allocation.savings = value,
        Bucket::Investments => allocation.investments = value,
        Bucket::Speculation => allocation.speculation = value,
    }
}

pub fn adjust_allocation(
    current: Allocation,
    update: AllocationUpdate,
    min_threshold: f64,
) -> Allocation {
    let updates = [
        (Bucket::Savings, update.savings),
        (Bucket::Investments, update.investments),
        (Bucket::Speculation, update.speculation),
    ];

    let mut next = current;
    let mut changed = Vec::with_capacity(3);
    for (bucket, value) in updates {
        if let Some(value) = value {
            set(&mut next, bucket, value);
            changed.push(bucket);
        }
    }

    for bucket in [Bucket::Savings, Bucket::Investments, Bucket::Speculation] {
        let value = get(&next, bucket).max(min_threshold);
        set(&mut next, bucket, value);
    }

    if let [edited] = changed.as_slice() {
        let others: Vec<Bucket> = [Bucket::Savings, Bucket::Investments, Bucket::Speculation]
            .into_iter()
            .filter(|bucket| bucket != edited)
            .collect();
        let prior_total: f64 = others.iter().map(|bucket| get(&current, *bucket)).sum();
        if prior_total > 0.0 {
            let remaining = 100.0 - get(&next, *edited);
            for bucket in others {
                let share = get(&current, bucket) / prior_total;
                set(&mut next, bucket, (remaining * share).max(min_threshold));
            }
        }
    }

    next
}

fn check_percent(errors: &mut Vec<String>, name: &str, value: f64) {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        errors.push(format!("{name} must be between 0 and 100"));
    }
}

fn check_curve_length(
    warnings: &mut Vec<String>,
    name: &str,
    len: Option<usize>,
    year_count: usize,
) {
    if let Some(len) = len {
        if len < year_count {
            warnings.push(format!(
                "{name} has {len} entries for {year_count} years; missing years use 0%"
            ));
        }
    }
}

pub fn validate_configuration(config: &Configuration) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let allocation = config.allocation;

    check_percent(&mut errors, "savings allocation", allocation.savings);
    check_percent(&mut errors, "investments allocation", allocation.investments);
    check_percent(&mut errors, "speculation allocation", allocation.speculation);
    let check = validate_allocation(
        allocation.savings,
        allocation.investments,
        allocation.speculation,
    );
    if let Some(error) = check.error {
        errors.push(error);
    }

    if config.time_horizon == 0 {
        errors.push("time horizon must be > 0".to_string());
    }
    if config.time_horizon > MAX_TIME_HORIZON {
        errors.push(format!(
            "time horizon must be at most {MAX_TIME_HORIZON} years (got {})",
            config.time_horizon
        ));
    }

    if config.activation_year > config.time_horizon {
        warnings.push(format!(
            "activation year {} is beyond the {}-year horizon; income never starts",
            config.activation_year, config.time_horizon
        ));
    }

    if !config.btc_stack.is_finite() || config.btc_stack <= 0.0 {
        errors.push("BTC stack must be > 0".to_string());
    }

    if !config.exchange_rate.is_finite() || config.exchange_rate <= 0.0 {
        errors.push("exchange rate must be > 0".to_string());
    }

    if !config.annual_expenses.is_finite() || config.annual_expenses < 0.0 {
        errors.push("annual expenses must be >= 0".to_string());
    }

    check_percent(&mut errors, "income allocation", config.income_allocation_pct);

    let loan = &config.loan;
    check_percent(&mut errors, "collateral", loan.collateral_pct);
    check_percent(&mut errors, "loan-to-value", loan.ltv);
    check_percent(&mut errors, "loan interest rate", loan.interest_rate);
    if loan.is_active() {
        if loan.term_years == 0 {
            errors.push("loan term must be > 0 years".to_string());
        }
        if loan.ltv >= LIQUIDATION_THRESHOLD_PCT {
            warnings.push(format!(
                "loan-to-value {}% starts at or beyond the {}% liquidation threshold",
                loan.ltv, LIQUIDATION_THRESHOLD_PCT
            ));
        }
        if allocation.savings == 0.0 {
            warnings.push("loan collateral comes from savings, which is 0%".to_string());
        }
    }

    let year_count = config.year_count();
    for (name, curve) in [
        ("investments yield curve", &config.investments_yield),
        ("speculation yield curve", &config.speculation_yield),
        ("BTC price growth curve", &config.btc_price_growth),
        ("inflation curve", &config.inflation),
        ("income growth curve", &config.income_growth),
    ] {
        check_curve_length(&mut warnings, name, curve.custom_len(), year_count);
    }

    ValidationReport {
        is_valid: errors.is_empty(),
        errors,
        warnings,
    }
}
