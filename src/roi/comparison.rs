use rust_decimal::Decimal;
use thiserror::Error;

use crate::pricing::{compute_cost, CostResult, PlanCatalog, UsageInput};
use crate::roi::savings::{compute_roi, RoiResult, SalesInput, StockInput};

/// 플랜 비교를 거부하는 경우.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ComparisonError {
    /// 월 구매액(월 매출)이 0 이하
    #[error("월 구매액은 0보다 커야 함: {0}")]
    MonthlyPurchaseRequired(Decimal),
}

/// 플랜 하나에 대한 견적.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanQuote {
    pub plan_id: String,
    pub plan_name: String,
    pub cost: CostResult,
    pub roi: RoiResult,
}

/// 카탈로그의 모든 플랜을 같은 재고/매출 입력으로 견적낸다.
///
/// 월 구매액은 플랜과 무관하게 하나의 값을 공유하고 비용만 플랜별로 달라진다.
pub fn compare_plans(
    catalog: &PlanCatalog,
    usage: &UsageInput,
    stock: &StockInput,
    sales: &SalesInput,
    horizon_months: u32,
) -> Result<Vec<PlanQuote>, ComparisonError> {
    if sales.monthly_sales <= Decimal::ZERO {
        return Err(ComparisonError::MonthlyPurchaseRequired(sales.monthly_sales));
    }
    let quotes = catalog
        .tiers()
        .map(|tier| {
            let cost = compute_cost(tier, usage, horizon_months);
            let roi = compute_roi(stock, sales, &cost);
            PlanQuote {
                plan_id: tier.id.clone(),
                plan_name: tier.name.clone(),
                cost,
                roi,
            }
        })
        .collect();
    Ok(quotes)
}

/// ROI가 가장 높은 견적. 동률이면 카탈로그 앞쪽 플랜.
pub fn best_by_roi(quotes: &[PlanQuote]) -> Option<&PlanQuote> {
    quotes.iter().fold(None, |best, quote| match best {
        Some(b) if b.roi.roi_percent >= quote.roi.roi_percent => Some(b),
        _ => Some(quote),
    })
}
