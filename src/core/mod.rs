mod engine;
mod types;

pub use engine::{
    TARGET_SEARCH_CEILING_MONTHS, describe_months, find_target_month, project_final_balance,
    project_trajectory,
};
pub use types::{
    InvalidParameters, MonthRow, MonthlyRecord, MovementKind, ScenarioParams, TargetSearchResult,
    Trajectory,
};
