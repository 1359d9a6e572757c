use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::pricing::plan::{ModuleRate, ModuleRule, PlanTier, SetupFee};

/// 저장된 선택이 없거나 알 수 없을 때 사용하는 플랜.
pub const FALLBACK_PLAN_ID: &str = "profissional";

/// 카탈로그 로드/편집 시 발생 가능한 오류.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("알 수 없는 플랜: {0}")]
    UnknownPlan(String),
    #[error("플랜 {plan}에 없는 모듈: {module}")]
    UnknownModule { plan: String, module: String },
    #[error("알 수 없는 항목: {0}")]
    UnknownField(String),
    #[error("{plan}.{field} 값이 올바르지 않음: {value}")]
    InvalidValue {
        plan: String,
        field: String,
        value: Decimal,
    },
    #[error("중복된 플랜 ID: {0}")]
    DuplicatePlan(String),
    #[error("카탈로그에 플랜이 없음")]
    Empty,
    #[error("파일 입출력 오류: {0}")]
    Io(#[from] std::io::Error),
    #[error("카탈로그 파싱 오류: {0}")]
    Parse(#[from] toml::de::Error),
}

/// 런타임에 덮어쓸 수 있는 카탈로그 항목.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PlanField {
    BaseMonthlyFee,
    IncludedCnpj,
    IncludedSku,
    IncludedUsers,
    CnpjRate,
    SkuBlockRate,
    SkuBlockSize,
    UserRate,
    OnboardingFee,
    ImplementationFee,
    IntegrationAddonFee,
    TrialMultiplier,
    PrepaymentDiscountRate,
    /// `module.<이름>` 형태로 지정하는 모듈 월 요금
    ModuleFee(String),
}

impl fmt::Display for PlanField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlanField::BaseMonthlyFee => "base_monthly_fee",
            PlanField::IncludedCnpj => "included_cnpj",
            PlanField::IncludedSku => "included_sku",
            PlanField::IncludedUsers => "included_users",
            PlanField::CnpjRate => "cnpj_rate",
            PlanField::SkuBlockRate => "sku_block_rate",
            PlanField::SkuBlockSize => "sku_block_size",
            PlanField::UserRate => "user_rate",
            PlanField::OnboardingFee => "onboarding_fee",
            PlanField::ImplementationFee => "implementation_fee",
            PlanField::IntegrationAddonFee => "integration_addon_fee",
            PlanField::TrialMultiplier => "trial_multiplier",
            PlanField::PrepaymentDiscountRate => "prepayment_discount_rate",
            PlanField::ModuleFee(name) => return write!(f, "module.{name}"),
        };
        f.write_str(name)
    }
}

impl FromStr for PlanField {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        if let Some(name) = key.strip_prefix("module.") {
            if !name.is_empty() {
                return Ok(PlanField::ModuleFee(name.to_string()));
            }
        }
        let field = match key.as_str() {
            "base_monthly_fee" => PlanField::BaseMonthlyFee,
            "included_cnpj" => PlanField::IncludedCnpj,
            "included_sku" => PlanField::IncludedSku,
            "included_users" => PlanField::IncludedUsers,
            "cnpj_rate" => PlanField::CnpjRate,
            "sku_block_rate" => PlanField::SkuBlockRate,
            "sku_block_size" => PlanField::SkuBlockSize,
            "user_rate" => PlanField::UserRate,
            "onboarding_fee" => PlanField::OnboardingFee,
            "implementation_fee" => PlanField::ImplementationFee,
            "integration_addon_fee" => PlanField::IntegrationAddonFee,
            "trial_multiplier" => PlanField::TrialMultiplier,
            "prepayment_discount_rate" => PlanField::PrepaymentDiscountRate,
            _ => return Err(CatalogError::UnknownField(s.to_string())),
        };
        Ok(field)
    }
}

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(rename = "plan")]
    plans: Vec<PlanTier>,
}

/// 세션 범위의 플랜 카탈로그.
///
/// 기본 단가표는 `Arc`로 공유하고, 사용자가 값을 덮어쓴 플랜만 복사본을 만든다.
/// 덮어쓰기는 `(plan_id, field)` 키로 기록되며 `reset_overrides`로 기본값에 복귀한다.
#[derive(Debug, Clone)]
pub struct PlanCatalog {
    base: Arc<Vec<PlanTier>>,
    edits: BTreeMap<(String, PlanField), Decimal>,
    patched: HashMap<String, PlanTier>,
}

impl Default for PlanCatalog {
    fn default() -> Self {
        Self::built_in()
    }
}

impl PlanCatalog {
    /// 내장 단가표(essencial / profissional / corporativo)로 카탈로그를 만든다.
    pub fn built_in() -> Self {
        Self {
            base: Arc::new(built_in_tiers()),
            edits: BTreeMap::new(),
            patched: HashMap::new(),
        }
    }

    /// 플랜 목록을 검증한 뒤 카탈로그를 만든다.
    pub fn from_tiers(tiers: Vec<PlanTier>) -> Result<Self, CatalogError> {
        if tiers.is_empty() {
            return Err(CatalogError::Empty);
        }
        for (idx, tier) in tiers.iter().enumerate() {
            if tiers[..idx].iter().any(|t| t.id == tier.id) {
                return Err(CatalogError::DuplicatePlan(tier.id.clone()));
            }
            tier.validate()?;
        }
        Ok(Self {
            base: Arc::new(tiers),
            edits: BTreeMap::new(),
            patched: HashMap::new(),
        })
    }

    /// `[[plan]]` 배열을 담은 TOML 문서에서 카탈로그를 읽는다.
    pub fn from_toml_str(content: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(content)?;
        Self::from_tiers(file.plans)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn contains(&self, plan_id: &str) -> bool {
        self.base.iter().any(|t| t.id == plan_id)
    }

    pub fn plan_ids(&self) -> impl Iterator<Item = &str> {
        self.base.iter().map(|t| t.id.as_str())
    }

    /// 덮어쓰기가 반영된 플랜을 반환한다.
    pub fn tier(&self, plan_id: &str) -> Option<&PlanTier> {
        self.patched
            .get(plan_id)
            .or_else(|| self.base.iter().find(|t| t.id == plan_id))
    }

    /// 카탈로그 순서대로 덮어쓰기가 반영된 플랜을 순회한다.
    pub fn tiers(&self) -> impl Iterator<Item = &PlanTier> {
        self.base
            .iter()
            .map(move |t| self.patched.get(&t.id).unwrap_or(t))
    }

    pub fn fallback_id(&self) -> &str {
        if self.contains(FALLBACK_PLAN_ID) {
            FALLBACK_PLAN_ID
        } else {
            // 생성 시 비어 있지 않음을 검증한다.
            &self.base[0].id
        }
    }

    /// 요청한 플랜이 없으면 기본 플랜을 반환한다.
    pub fn tier_or_fallback(&self, plan_id: &str) -> &PlanTier {
        match self.tier(plan_id) {
            Some(tier) => tier,
            None => self.tier(self.fallback_id()).unwrap_or(&self.base[0]),
        }
    }

    /// `(plan_id, field)` 값을 덮어쓴다. 불변식을 깨는 값은 거부하고 상태를 유지한다.
    pub fn set_override(
        &mut self,
        plan_id: &str,
        field: PlanField,
        value: Decimal,
    ) -> Result<(), CatalogError> {
        if !self.contains(plan_id) {
            return Err(CatalogError::UnknownPlan(plan_id.to_string()));
        }
        let key = (plan_id.to_string(), field);
        let previous = self.edits.insert(key.clone(), value);
        if let Err(err) = self.rebuild(plan_id) {
            match previous {
                Some(v) => self.edits.insert(key, v),
                None => self.edits.remove(&key),
            };
            self.rebuild(plan_id)?;
            return Err(err);
        }
        debug!(plan = plan_id, field = %key.1, %value, "catalog override applied");
        Ok(())
    }

    /// 덮어쓰기 하나를 제거하고 이전 값을 반환한다.
    pub fn clear_override(
        &mut self,
        plan_id: &str,
        field: &PlanField,
    ) -> Result<Option<Decimal>, CatalogError> {
        let removed = self.edits.remove(&(plan_id.to_string(), field.clone()));
        if removed.is_some() {
            self.rebuild(plan_id)?;
        }
        Ok(removed)
    }

    pub fn reset_overrides(&mut self) {
        debug!(count = self.edits.len(), "catalog overrides cleared");
        self.edits.clear();
        self.patched.clear();
    }

    pub fn overrides(&self) -> impl Iterator<Item = (&str, &PlanField, Decimal)> {
        self.edits
            .iter()
            .map(|((plan, field), value)| (plan.as_str(), field, *value))
    }

    pub fn has_overrides(&self) -> bool {
        !self.edits.is_empty()
    }

    fn rebuild(&mut self, plan_id: &str) -> Result<(), CatalogError> {
        let mut tier = self
            .base
            .iter()
            .find(|t| t.id == plan_id)
            .cloned()
            .ok_or_else(|| CatalogError::UnknownPlan(plan_id.to_string()))?;
        let mut edited = false;
        for ((plan, field), value) in &self.edits {
            if plan == plan_id {
                apply_field(&mut tier, field, *value)?;
                edited = true;
            }
        }
        if !edited {
            self.patched.remove(plan_id);
            return Ok(());
        }
        tier.validate()?;
        self.patched.insert(plan_id.to_string(), tier);
        Ok(())
    }
}

fn apply_field(tier: &mut PlanTier, field: &PlanField, value: Decimal) -> Result<(), CatalogError> {
    match field {
        PlanField::BaseMonthlyFee => tier.base_monthly_fee = value,
        PlanField::IncludedCnpj => tier.included_cnpj = to_count(&tier.id, field, value)?,
        PlanField::IncludedSku => tier.included_sku = to_count(&tier.id, field, value)?,
        PlanField::IncludedUsers => tier.included_users = Some(to_count(&tier.id, field, value)?),
        PlanField::CnpjRate => tier.cnpj_rate = value,
        PlanField::SkuBlockRate => tier.sku_block_rate = value,
        PlanField::SkuBlockSize => tier.sku_block_size = to_count(&tier.id, field, value)?,
        PlanField::UserRate => tier.user_rate = value,
        PlanField::OnboardingFee => tier.setup.onboarding = value,
        PlanField::ImplementationFee => tier.setup.implementation = value,
        PlanField::IntegrationAddonFee => tier.integration_addon_fee = Some(value),
        PlanField::TrialMultiplier => tier.trial_multiplier = Some(value),
        PlanField::PrepaymentDiscountRate => tier.prepayment_discount_rate = Some(value),
        PlanField::ModuleFee(name) => {
            let plan = tier.id.clone();
            let module = tier
                .modules
                .iter_mut()
                .find(|m| &m.name == name)
                .ok_or_else(|| CatalogError::UnknownModule {
                    plan,
                    module: name.clone(),
                })?;
            module.monthly_fee = value;
        }
    }
    Ok(())
}

fn to_count(plan: &str, field: &PlanField, value: Decimal) -> Result<u64, CatalogError> {
    let invalid = || CatalogError::InvalidValue {
        plan: plan.to_string(),
        field: field.to_string(),
        value,
    };
    // 수량은 0 이상의 정수만 받는다.
    if value < Decimal::ZERO || !value.fract().is_zero() {
        return Err(invalid());
    }
    value.to_u64().ok_or_else(invalid)
}

fn built_in_tiers() -> Vec<PlanTier> {
    vec![
        PlanTier {
            id: "essencial".into(),
            name: "Essencial".into(),
            base_monthly_fee: dec!(790),
            included_cnpj: 1,
            included_sku: 5_000,
            included_users: Some(1),
            cnpj_rate: dec!(120),
            sku_block_rate: dec!(300),
            sku_block_size: 5_000,
            user_rate: dec!(60),
            setup: SetupFee {
                onboarding: dec!(3000),
                implementation: dec!(5000),
            },
            modules: vec![ModuleRate {
                name: "bi".into(),
                monthly_fee: dec!(150),
                rule: ModuleRule::Optional,
            }],
            integration_addon_fee: None,
            trial_multiplier: Some(dec!(0.30)),
            prepayment_discount_rate: Some(dec!(0.10)),
        },
        PlanTier {
            id: FALLBACK_PLAN_ID.into(),
            name: "Profissional".into(),
            base_monthly_fee: dec!(1300),
            included_cnpj: 1,
            included_sku: 10_000,
            included_users: Some(2),
            cnpj_rate: dec!(100),
            sku_block_rate: dec!(250),
            sku_block_size: 10_000,
            user_rate: dec!(50),
            setup: SetupFee {
                onboarding: dec!(5600),
                implementation: dec!(10000),
            },
            modules: vec![
                ModuleRate {
                    name: "reposicao".into(),
                    monthly_fee: dec!(300),
                    rule: ModuleRule::MultiCnpjOnly,
                },
                ModuleRate {
                    name: "bi".into(),
                    monthly_fee: dec!(200),
                    rule: ModuleRule::Optional,
                },
            ],
            integration_addon_fee: Some(dec!(3500)),
            trial_multiplier: Some(dec!(0.30)),
            prepayment_discount_rate: Some(dec!(0.20)),
        },
        PlanTier {
            id: "corporativo".into(),
            name: "Corporativo".into(),
            base_monthly_fee: dec!(3900),
            included_cnpj: 5,
            included_sku: 50_000,
            included_users: None,
            cnpj_rate: dec!(80),
            sku_block_rate: dec!(200),
            sku_block_size: 10_000,
            user_rate: dec!(0),
            setup: SetupFee {
                onboarding: dec!(12000),
                implementation: dec!(20000),
            },
            modules: vec![
                ModuleRate {
                    name: "gestao_estoque".into(),
                    monthly_fee: dec!(500),
                    rule: ModuleRule::Mandatory,
                },
                ModuleRate {
                    name: "reposicao".into(),
                    monthly_fee: dec!(250),
                    rule: ModuleRule::MultiCnpjOnly,
                },
                ModuleRate {
                    name: "bi".into(),
                    monthly_fee: dec!(150),
                    rule: ModuleRule::Optional,
                },
            ],
            integration_addon_fee: Some(dec!(5000)),
            trial_multiplier: None,
            prepayment_discount_rate: Some(dec!(0.20)),
        },
    ]
}
