use super::types::{
    InvalidParameters, MonthRow, MonthlyRecord, MovementKind, ScenarioParams, TargetSearchResult,
    Trajectory,
};

/// Iteration cap for the target search; a 0% rate with a target that is never
/// met would otherwise loop forever.
pub const TARGET_SEARCH_CEILING_MONTHS: u32 = 10_000;

/// Balance at the end of the horizon, iterating the monthly recurrence without
/// materializing the series. The no-movement case deliberately runs the same
/// loop rather than the closed form so every path shares one rounding
/// behavior.
pub fn project_final_balance(params: &ScenarioParams) -> Result<f64, InvalidParameters> {
    validate(params)?;
    let rate = params.monthly_rate_percent / 100.0;
    let mut balance = params.initial_capital;
    for month in 1..=params.horizon_months {
        let interest = balance * rate;
        balance += interest;
        balance += movement_for_month(params, month);
    }
    Ok(balance)
}

/// Full month-by-month series, `horizon_months + 1` records with index 0 the
/// starting state. The last record's balance is exactly equal to
/// `project_final_balance` for the same params.
pub fn project_trajectory(params: &ScenarioParams) -> Result<Trajectory, InvalidParameters> {
    validate(params)?;
    let rate = params.monthly_rate_percent / 100.0;
    let mut records = Vec::with_capacity(params.horizon_months as usize + 1);
    records.push(MonthlyRecord {
        month: 0,
        interest_accrued: 0.0,
        movement_applied: 0.0,
        balance_after: params.initial_capital,
    });

    let mut balance = params.initial_capital;
    for month in 1..=params.horizon_months {
        let interest = balance * rate;
        balance += interest;
        let movement = movement_for_month(params, month);
        balance += movement;
        records.push(MonthlyRecord {
            month,
            interest_accrued: interest,
            movement_applied: movement,
            balance_after: balance,
        });
    }
    Ok(records)
}

/// Smallest month index at which the balance reaches `target_balance`, or
/// `Unreachable`. Searches forward month by month; movements and sign changes
/// leave no general inverse formula. Not bounded by `horizon_months`, only by
/// `TARGET_SEARCH_CEILING_MONTHS`, and a target met exactly at the ceiling
/// month still counts as reached.
pub fn find_target_month(
    params: &ScenarioParams,
    target_balance: f64,
) -> Result<TargetSearchResult, InvalidParameters> {
    validate(params)?;
    if !target_balance.is_finite() {
        return Err(InvalidParameters::TargetBalance);
    }
    if params.initial_capital >= target_balance {
        return Ok(TargetSearchResult::ReachedAt(0));
    }

    let rate = params.monthly_rate_percent / 100.0;
    let mut balance = params.initial_capital;
    let mut month = 0;
    while month < TARGET_SEARCH_CEILING_MONTHS {
        month += 1;
        let interest = balance * rate;
        balance += interest;
        balance += movement_for_month(params, month);
        if balance >= target_balance {
            return Ok(TargetSearchResult::ReachedAt(month));
        }
        // A non-positive balance never recovers under this recurrence.
        if balance <= 0.0 {
            return Ok(TargetSearchResult::Unreachable);
        }
    }
    Ok(TargetSearchResult::Unreachable)
}

/// Trajectory reframed for tabular display. Same values and invariants as
/// `project_trajectory`; currency formatting stays with the presentation
/// layer.
pub fn describe_months(params: &ScenarioParams) -> Result<Vec<MonthRow>, InvalidParameters> {
    Ok(project_trajectory(params)?
        .into_iter()
        .map(MonthRow::from)
        .collect())
}

fn movement_for_month(params: &ScenarioParams, month: u32) -> f64 {
    // Inclusive window: the movement applies for months 1..=movement_months.
    // Months past the horizon are cut off by the caller's loop bound.
    if month > params.movement_months {
        return 0.0;
    }
    match params.movement_kind {
        MovementKind::None => 0.0,
        MovementKind::Contribution => params.movement_amount,
        MovementKind::Withdrawal => -params.movement_amount,
    }
}

fn validate(params: &ScenarioParams) -> Result<(), InvalidParameters> {
    if !params.initial_capital.is_finite() || params.initial_capital < 0.0 {
        return Err(InvalidParameters::InitialCapital);
    }
    if !params.monthly_rate_percent.is_finite() {
        return Err(InvalidParameters::MonthlyRate);
    }
    if params.horizon_months == 0 {
        return Err(InvalidParameters::Horizon);
    }
    if !params.movement_amount.is_finite() || params.movement_amount < 0.0 {
        return Err(InvalidParameters::MovementAmount);
    }
    Ok(())
}
