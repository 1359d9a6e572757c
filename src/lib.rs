//! Kenit 요금제/ROI 계산 로직을 라이브러리로 분리하여 CLI 외의 화면에서도 재사용한다.

pub mod app;
pub mod config;
pub mod i18n;
pub mod input;
pub mod pricing;
pub mod report;
pub mod roi;
pub mod session;

pub use input::FormState;
pub use pricing::{compute_cost, CostResult, PlanCatalog, PlanTier, UsageInput};
pub use roi::{compute_roi, RoiResult, SalesInput, StockInput};
pub use session::{CalculatorSession, Quote};
