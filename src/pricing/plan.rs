use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::pricing::catalog::{CatalogError, PlanField};

/// SKU 초과 요금을 묶어서 부과하는 기본 블록 크기.
pub const DEFAULT_SKU_BLOCK_SIZE: u64 = 10_000;

fn default_sku_block_size() -> u64 {
    DEFAULT_SKU_BLOCK_SIZE
}

/// 모듈 요금이 부과되는 조건.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleRule {
    /// 선택했을 때만 부과
    #[default]
    Optional,
    /// 선택했고 CNPJ가 2개 이상일 때만 부과 (재고 보충 모듈)
    MultiCnpjOnly,
    /// 항상 선택된 상태. 선택 해제가 불가능하다.
    Mandatory,
}

/// 플랜에 붙는 부가 모듈과 월 정액 요금.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleRate {
    pub name: String,
    /// 월 정액 [R$/월]
    pub monthly_fee: Decimal,
    #[serde(default)]
    pub rule: ModuleRule,
}

impl ModuleRate {
    /// 선택 여부와 CNPJ 수로 이번 계산에 요금이 붙는지 판단한다.
    pub fn applies(&self, selected: bool, cnpj_count: u64) -> bool {
        match self.rule {
            ModuleRule::Optional => selected,
            ModuleRule::MultiCnpjOnly => selected && cnpj_count > 1,
            ModuleRule::Mandatory => true,
        }
    }
}

/// 일회성 도입 비용. 온보딩과 구축(implementation)으로 나뉜다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SetupFee {
    pub onboarding: Decimal,
    pub implementation: Decimal,
}

impl SetupFee {
    pub fn total(&self) -> Decimal {
        self.onboarding.saturating_add(self.implementation)
    }
}

/// 요금제 한 단계의 단가표.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanTier {
    pub id: String,
    pub name: String,
    /// 기본 월 요금 [R$/월]
    pub base_monthly_fee: Decimal,
    pub included_cnpj: u64,
    pub included_sku: u64,
    /// 포함 사용자 수. `None`이면 무제한이며 초과 요금이 없다.
    #[serde(default)]
    pub included_users: Option<u64>,
    /// 추가 CNPJ 1개당 [R$/월]
    pub cnpj_rate: Decimal,
    /// 추가 SKU 블록 1개당 [R$/월]
    pub sku_block_rate: Decimal,
    #[serde(default = "default_sku_block_size")]
    pub sku_block_size: u64,
    /// 추가 사용자 1명당 [R$/월]
    pub user_rate: Decimal,
    pub setup: SetupFee,
    #[serde(default)]
    pub modules: Vec<ModuleRate>,
    /// 통합(integração) 옵션 선택 시 한 번 부과되는 금액
    #[serde(default)]
    pub integration_addon_fee: Option<Decimal>,
    /// 체험 모드 월 요금 할증률 (0.30 -> x1.30)
    #[serde(default)]
    pub trial_multiplier: Option<Decimal>,
    /// 선불 결제 시 기간 요금 할인율 (0.20 -> 20% 할인)
    #[serde(default)]
    pub prepayment_discount_rate: Option<Decimal>,
}

impl PlanTier {
    pub fn has_unlimited_users(&self) -> bool {
        self.included_users.is_none()
    }

    pub fn module(&self, name: &str) -> Option<&ModuleRate> {
        self.modules.iter().find(|m| m.name == name)
    }

    /// 모든 요금이 음수가 아니고 블록 크기가 0보다 큰지 검사한다.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut amounts = vec![
            (PlanField::BaseMonthlyFee, self.base_monthly_fee),
            (PlanField::CnpjRate, self.cnpj_rate),
            (PlanField::SkuBlockRate, self.sku_block_rate),
            (PlanField::UserRate, self.user_rate),
            (PlanField::OnboardingFee, self.setup.onboarding),
            (PlanField::ImplementationFee, self.setup.implementation),
        ];
        if let Some(v) = self.integration_addon_fee {
            amounts.push((PlanField::IntegrationAddonFee, v));
        }
        if let Some(v) = self.trial_multiplier {
            amounts.push((PlanField::TrialMultiplier, v));
        }
        if let Some(v) = self.prepayment_discount_rate {
            amounts.push((PlanField::PrepaymentDiscountRate, v));
        }
        for module in &self.modules {
            amounts.push((PlanField::ModuleFee(module.name.clone()), module.monthly_fee));
        }

        for (field, value) in amounts {
            if value < Decimal::ZERO {
                return Err(self.invalid(field, value));
            }
        }
        if self.sku_block_size == 0 {
            return Err(self.invalid(PlanField::SkuBlockSize, Decimal::ZERO));
        }
        // 할인율이 1을 넘으면 기간 요금이 음수가 된다.
        if let Some(rate) = self.prepayment_discount_rate {
            if rate > Decimal::ONE {
                return Err(self.invalid(PlanField::PrepaymentDiscountRate, rate));
            }
        }
        Ok(())
    }

    fn invalid(&self, field: PlanField, value: Decimal) -> CatalogError {
        CatalogError::InvalidValue {
            plan: self.id.clone(),
            field: field.to_string(),
            value,
        }
    }
}
