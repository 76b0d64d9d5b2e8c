pub mod plan_service;
pub mod savings_service;

pub use plan_service::{PlanRow, PlanService, SavingsPlan, DEFAULT_HORIZON_DAYS, MAX_HORIZON_DAYS};
pub use savings_service::{DailyRecommendation, MonthlyReport, SavingsService, SavingsStatus};
