use serde::Serialize;
use thiserror::Error;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MovementKind {
    None,
    Contribution,
    Withdrawal,
}

#[derive(Debug, Clone)]
pub struct ScenarioParams {
    pub initial_capital: f64,
    pub monthly_rate_percent: f64,
    pub horizon_months: u32,
    pub movement_kind: MovementKind,
    pub movement_amount: f64,
    pub movement_months: u32,
}

/// One step of the projected balance series. Index 0 is the starting state
/// before any accrual; all values are raw currency amounts, never formatted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthlyRecord {
    pub month: u32,
    pub interest_accrued: f64,
    pub movement_applied: f64,
    pub balance_after: f64,
}

pub type Trajectory = Vec<MonthlyRecord>;

/// Reporting view of a `MonthlyRecord` for the table/chart consumers.
/// Same raw numbers; serialization lives here so the engine stays numeric-only.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthRow {
    pub month: u32,
    pub interest_accrued: f64,
    pub movement_applied: f64,
    pub balance_after: f64,
}

impl From<MonthlyRecord> for MonthRow {
    fn from(record: MonthlyRecord) -> Self {
        Self {
            month: record.month,
            interest_accrued: record.interest_accrued,
            movement_applied: record.movement_applied,
            balance_after: record.balance_after,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TargetSearchResult {
    ReachedAt(u32),
    Unreachable,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Error)]
pub enum InvalidParameters {
    #[error("initial capital must be finite and >= 0")]
    InitialCapital,
    #[error("monthly rate must be finite")]
    MonthlyRate,
    #[error("horizon must be at least one month")]
    Horizon,
    #[error("movement amount must be finite and >= 0")]
    MovementAmount,
    #[error("target balance must be finite")]
    TargetBalance,
}
