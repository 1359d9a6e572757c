use tracing::{debug, info, warn};

use crate::input::FormState;
use crate::pricing::{compute_cost, CatalogError, CostResult, PlanCatalog, NOMINAL_HORIZON_MONTHS};
use crate::roi::{compare_plans, compute_roi, ComparisonError, PlanQuote, RoiResult};

/// 한 번의 재계산 결과.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub plan_id: String,
    pub cost: CostResult,
    pub roi: RoiResult,
}

/// 계산기 세션. 카탈로그(덮어쓰기 포함)와 선택된 플랜을 소유한다.
///
/// 입력이 바뀔 때마다 호출자가 `recompute`를 불러 새 견적을 받는다.
#[derive(Debug, Clone)]
pub struct CalculatorSession {
    catalog: PlanCatalog,
    selected_plan: String,
    horizon_months: u32,
}

impl CalculatorSession {
    /// 저장된 선택이 카탈로그에 없으면 기본 플랜으로 시작한다.
    pub fn new(catalog: PlanCatalog, preferred_plan: Option<&str>, horizon_months: u32) -> Self {
        let selected_plan = match preferred_plan {
            Some(id) if catalog.contains(id) => id.to_string(),
            Some(id) => {
                warn!(
                    plan = id,
                    fallback = catalog.fallback_id(),
                    "unknown saved plan, using fallback"
                );
                catalog.fallback_id().to_string()
            }
            None => catalog.fallback_id().to_string(),
        };
        Self {
            catalog,
            selected_plan,
            horizon_months: horizon_months.max(1),
        }
    }

    pub fn catalog(&self) -> &PlanCatalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut PlanCatalog {
        &mut self.catalog
    }

    pub fn selected_plan(&self) -> &str {
        &self.selected_plan
    }

    pub fn horizon_months(&self) -> u32 {
        self.horizon_months
    }

    pub fn select_plan(&mut self, plan_id: &str) -> Result<(), CatalogError> {
        if !self.catalog.contains(plan_id) {
            return Err(CatalogError::UnknownPlan(plan_id.to_string()));
        }
        info!(plan = plan_id, "plan selected");
        self.selected_plan = plan_id.to_string();
        Ok(())
    }

    /// 현재 폼 상태로 비용과 ROI를 다시 계산한다.
    pub fn recompute(&self, form: &FormState) -> Quote {
        let tier = self.catalog.tier_or_fallback(&self.selected_plan);
        let cost = compute_cost(tier, &form.usage(), self.horizon_months);
        let roi = compute_roi(&form.stock(), &form.sales(), &cost);
        debug!(
            plan = %tier.id,
            monthly = %cost.monthly_cost,
            total = %cost.annual_or_period_cost,
            roi = %roi.roi_percent,
            "recomputed quote"
        );
        Quote {
            plan_id: tier.id.clone(),
            cost,
            roi,
        }
    }

    /// 모든 플랜을 현재 폼 상태로 비교한다.
    pub fn compare(&self, form: &FormState) -> Result<Vec<PlanQuote>, ComparisonError> {
        compare_plans(
            &self.catalog,
            &form.usage(),
            &form.stock(),
            &form.sales(),
            self.horizon_months,
        )
    }
}

impl Default for CalculatorSession {
    fn default() -> Self {
        Self::new(PlanCatalog::built_in(), None, NOMINAL_HORIZON_MONTHS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::FormField;
    use crate::pricing::PlanField;
    use rust_decimal_macros::dec;

    #[test]
    fn unknown_saved_plan_falls_back() {
        let session = CalculatorSession::new(PlanCatalog::built_in(), Some("premium"), 12);
        assert_eq!(session.selected_plan(), "profissional");
    }

    #[test]
    fn overrides_apply_to_later_recomputes() {
        let mut session = CalculatorSession::default();
        let mut form = FormState::default();
        form.set(FormField::Users, "3");
        assert_eq!(session.recompute(&form).cost.monthly_cost, dec!(1350));

        session
            .catalog_mut()
            .set_override("profissional", PlanField::UserRate, dec!(80))
            .unwrap();
        assert_eq!(session.recompute(&form).cost.monthly_cost, dec!(1380));
    }

    #[test]
    fn select_plan_validates() {
        let mut session = CalculatorSession::default();
        assert!(session.select_plan("corporativo").is_ok());
        assert!(session.select_plan("nada").is_err());
        assert_eq!(session.selected_plan(), "corporativo");
    }
}
