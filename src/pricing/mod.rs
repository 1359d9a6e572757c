//! 요금제 카탈로그와 구독 비용 계산 모듈 모음.

pub mod catalog;
pub mod cost;
pub mod plan;

pub use catalog::{CatalogError, PlanCatalog, PlanField, FALLBACK_PLAN_ID};
pub use cost::{
    compute_cost, CostResult, OptionFlags, Overage, UsageInput, NOMINAL_HORIZON_MONTHS,
    TRIAL_HORIZON_MONTHS,
};
pub use plan::{ModuleRate, ModuleRule, PlanTier, SetupFee};
