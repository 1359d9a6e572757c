//! 절감액/ROI 계산 모듈 모음.

pub mod comparison;
pub mod savings;

pub use comparison::{best_by_roi, compare_plans, ComparisonError, PlanQuote};
pub use savings::{
    bar_split, compute_roi, RoiResult, SalesInput, StockInput, DEFAULT_EXCESS_RATE,
    DEFAULT_RUPTURE_RATE, DEFAULT_RUPTURE_RECOVERY_RATE,
};
