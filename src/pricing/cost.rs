use std::collections::BTreeSet;

use rust_decimal::Decimal;

use crate::pricing::plan::PlanTier;

/// 일반 계약의 기간(개월).
pub const NOMINAL_HORIZON_MONTHS: u32 = 12;
/// 체험 모드에서는 기간이 3개월로 줄어든다.
pub const TRIAL_HORIZON_MONTHS: u32 = 3;

/// 계산 옵션 플래그.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptionFlags {
    pub use_integration_addon: bool,
    pub trial_mode: bool,
    pub prepay: bool,
}

/// 한 번의 계산에 쓰이는 사용량 입력.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageInput {
    pub cnpj_count: u64,
    pub sku_count: u64,
    pub user_count: u64,
    pub selected_modules: BTreeSet<String>,
    pub options: OptionFlags,
}

/// 항목별 월 초과 요금.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Overage {
    pub cnpj: Decimal,
    pub sku: Decimal,
    pub users: Decimal,
}

impl Overage {
    pub fn total(&self) -> Decimal {
        self.cnpj.saturating_add(self.sku).saturating_add(self.users)
    }
}

/// 구독 비용 계산 결과.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostResult {
    /// 초과 요금, 모듈, 체험 할증이 반영된 월 요금
    pub monthly_cost: Decimal,
    /// 일회성 도입 비용
    pub setup_cost: Decimal,
    /// 도입 비용 + 기간 요금(할인 후) + 통합 옵션. ROI 계산의 기준 비용.
    pub annual_or_period_cost: Decimal,
    pub overage: Overage,
    pub module_fees: Decimal,
    /// 할인 후 기간 요금
    pub period_subscription: Decimal,
    pub prepayment_discount: Decimal,
    pub integration_fee: Decimal,
    /// 실제로 적용된 기간(개월)
    pub horizon_months: u32,
}

/// 포함 수량을 넘는 단위 수 x 단가.
pub fn unit_overage(count: u64, included: u64, rate: Decimal) -> Decimal {
    if count > included {
        Decimal::from(count - included).saturating_mul(rate)
    } else {
        Decimal::ZERO
    }
}

/// 포함 수량을 넘는 블록 수. 블록 경계를 1개라도 넘으면 한 블록 전체를 센다.
pub fn sku_blocks(count: u64, included: u64, block_size: u64) -> u64 {
    if count > included {
        (count - included).div_ceil(block_size.max(1))
    } else {
        0
    }
}

/// 플랜과 사용량으로 월 요금, 도입 비용, 기간 총비용을 계산한다.
///
/// 체험 모드가 켜져 있으면 `horizon_months`와 무관하게 3개월로 계산하고
/// 선불 할인은 적용하지 않는다. 금액이 `Decimal` 범위를 넘으면 최댓값으로 포화한다.
pub fn compute_cost(tier: &PlanTier, usage: &UsageInput, horizon_months: u32) -> CostResult {
    let options = usage.options;

    let overage = Overage {
        cnpj: unit_overage(usage.cnpj_count, tier.included_cnpj, tier.cnpj_rate),
        sku: Decimal::from(sku_blocks(
            usage.sku_count,
            tier.included_sku,
            tier.sku_block_size,
        ))
        .saturating_mul(tier.sku_block_rate),
        users: match tier.included_users {
            Some(included) => unit_overage(usage.user_count, included, tier.user_rate),
            None => Decimal::ZERO,
        },
    };

    let module_fees: Decimal = tier
        .modules
        .iter()
        .filter(|m| m.applies(usage.selected_modules.contains(&m.name), usage.cnpj_count))
        .fold(Decimal::ZERO, |acc, m| acc.saturating_add(m.monthly_fee));

    let mut monthly_cost = tier
        .base_monthly_fee
        .saturating_add(overage.total())
        .saturating_add(module_fees);
    if options.trial_mode {
        let surcharge = Decimal::ONE.saturating_add(tier.trial_multiplier.unwrap_or_default());
        monthly_cost = monthly_cost.saturating_mul(surcharge);
    }

    let horizon_months = if options.trial_mode {
        TRIAL_HORIZON_MONTHS
    } else {
        horizon_months
    };
    let period_cost = monthly_cost.saturating_mul(Decimal::from(horizon_months));

    let prepayment_discount = if options.prepay && !options.trial_mode {
        period_cost.saturating_mul(tier.prepayment_discount_rate.unwrap_or_default())
    } else {
        Decimal::ZERO
    };
    let period_subscription = period_cost.saturating_sub(prepayment_discount);

    let integration_fee = if options.use_integration_addon {
        tier.integration_addon_fee.unwrap_or_default()
    } else {
        Decimal::ZERO
    };

    let setup_cost = tier.setup.total();
    CostResult {
        monthly_cost,
        setup_cost,
        annual_or_period_cost: setup_cost
            .saturating_add(period_subscription)
            .saturating_add(integration_fee),
        overage,
        module_fees,
        period_subscription,
        prepayment_discount,
        integration_fee,
        horizon_months,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::catalog::PlanCatalog;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn profissional() -> PlanTier {
        PlanCatalog::built_in()
            .tier("profissional")
            .cloned()
            .expect("fallback tier")
    }

    #[test]
    fn overage_boundaries() {
        assert_eq!(unit_overage(1, 1, dec!(100)), dec!(0));
        assert_eq!(unit_overage(2, 1, dec!(100)), dec!(100));
        assert_eq!(unit_overage(0, 1, dec!(100)), dec!(0));
        assert_eq!(sku_blocks(10_000, 10_000, 10_000), 0);
        assert_eq!(sku_blocks(10_001, 10_000, 10_000), 1);
        assert_eq!(sku_blocks(20_000, 10_000, 10_000), 1);
        assert_eq!(sku_blocks(20_001, 10_000, 10_000), 2);
    }

    #[test]
    fn blank_usage_costs_base_plan() {
        let cost = compute_cost(&profissional(), &UsageInput::default(), NOMINAL_HORIZON_MONTHS);
        assert_eq!(cost.monthly_cost, dec!(1300));
        assert_eq!(cost.setup_cost, dec!(15600));
        assert_eq!(cost.annual_or_period_cost, dec!(31200));
    }

    #[test]
    fn modules_follow_their_rules() {
        let tier = profissional();
        let mut usage = UsageInput {
            cnpj_count: 1,
            selected_modules: ["reposicao".to_string(), "bi".to_string()].into(),
            ..Default::default()
        };
        // reposição exige mais de um CNPJ
        let cost = compute_cost(&tier, &usage, 12);
        assert_eq!(cost.module_fees, dec!(200));

        usage.cnpj_count = 2;
        let cost = compute_cost(&tier, &usage, 12);
        assert_eq!(cost.module_fees, dec!(500));
        assert_eq!(cost.monthly_cost, dec!(1300) + dec!(100) + dec!(500));
    }

    #[test]
    fn mandatory_module_is_always_charged() {
        let catalog = PlanCatalog::built_in();
        let tier = catalog.tier("corporativo").unwrap();
        let cost = compute_cost(tier, &UsageInput::default(), 12);
        assert_eq!(cost.module_fees, dec!(500));
    }

    #[test]
    fn unlimited_users_never_overage() {
        let catalog = PlanCatalog::built_in();
        let tier = catalog.tier("corporativo").unwrap();
        let usage = UsageInput {
            user_count: 10_000,
            ..Default::default()
        };
        assert_eq!(compute_cost(tier, &usage, 12).overage.users, dec!(0));
    }

    #[test]
    fn trial_inflates_and_shortens() {
        let usage = UsageInput {
            options: OptionFlags {
                trial_mode: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let cost = compute_cost(&profissional(), &usage, 12);
        assert_eq!(cost.monthly_cost, dec!(1690));
        assert_eq!(cost.horizon_months, TRIAL_HORIZON_MONTHS);
        assert_eq!(cost.annual_or_period_cost, dec!(15600) + dec!(1690) * dec!(3));
    }

    #[test]
    fn prepayment_discounts_period_only() {
        let usage = UsageInput {
            options: OptionFlags {
                prepay: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let cost = compute_cost(&profissional(), &usage, 12);
        assert_eq!(cost.prepayment_discount, dec!(3120));
        assert_eq!(cost.period_subscription, dec!(12480));
        assert_eq!(cost.annual_or_period_cost, dec!(15600) + dec!(12480));
    }

    #[test]
    fn trial_wins_over_prepayment() {
        let tier = profissional();
        let both = UsageInput {
            options: OptionFlags {
                trial_mode: true,
                prepay: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let trial_only = UsageInput {
            options: OptionFlags {
                trial_mode: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let cost = compute_cost(&tier, &both, 12);
        assert_eq!(cost, compute_cost(&tier, &trial_only, 12));
        assert_eq!(cost.prepayment_discount, dec!(0));
    }

    #[test]
    fn integration_addon_is_added_once() {
        let usage = UsageInput {
            options: OptionFlags {
                use_integration_addon: true,
                prepay: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let cost = compute_cost(&profissional(), &usage, 12);
        assert_eq!(cost.integration_fee, dec!(3500));
        assert_eq!(cost.annual_or_period_cost, dec!(15600) + dec!(12480) + dec!(3500));
    }

    #[test]
    fn trial_without_multiplier_keeps_fee_but_shortens() {
        let catalog = PlanCatalog::built_in();
        let tier = catalog.tier("corporativo").unwrap();
        assert_eq!(tier.trial_multiplier, None);
        let usage = UsageInput {
            options: OptionFlags {
                trial_mode: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let nominal = compute_cost(tier, &UsageInput::default(), 12);
        let trial = compute_cost(tier, &usage, 12);
        assert_eq!(trial.monthly_cost, nominal.monthly_cost);
        assert_eq!(trial.horizon_months, TRIAL_HORIZON_MONTHS);
        assert_eq!(trial.period_subscription, nominal.monthly_cost * dec!(3));
    }

    #[test]
    fn integration_without_fee_adds_nothing() {
        let catalog = PlanCatalog::built_in();
        let tier = catalog.tier("essencial").unwrap();
        assert_eq!(tier.integration_addon_fee, None);
        let usage = UsageInput {
            options: OptionFlags {
                use_integration_addon: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let with_addon = compute_cost(tier, &usage, 12);
        let without = compute_cost(tier, &UsageInput::default(), 12);
        assert_eq!(with_addon.integration_fee, dec!(0));
        assert_eq!(with_addon.annual_or_period_cost, without.annual_or_period_cost);
    }

    #[test]
    fn prepay_without_discount_rate_is_full_price() {
        let catalog = PlanCatalog::from_toml_str(
            r#"
            [[plan]]
            id = "basico"
            name = "Básico"
            base_monthly_fee = 500
            included_cnpj = 1
            included_sku = 1000
            included_users = 1
            cnpj_rate = 50
            sku_block_rate = 100
            user_rate = 30
            setup = { onboarding = 1000, implementation = 0 }
            "#,
        )
        .expect("catalog");
        let tier = catalog.tier("basico").unwrap();
        let usage = UsageInput {
            options: OptionFlags {
                prepay: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let cost = compute_cost(tier, &usage, 12);
        assert_eq!(cost.prepayment_discount, dec!(0));
        assert_eq!(cost.period_subscription, dec!(6000));
        assert_eq!(cost.annual_or_period_cost, dec!(7000));
    }

    #[test]
    fn oversized_usage_saturates() {
        let usage = UsageInput {
            cnpj_count: u64::MAX,
            sku_count: u64::MAX,
            user_count: u64::MAX,
            ..Default::default()
        };
        let cost = compute_cost(&profissional(), &usage, u32::MAX);
        assert_eq!(cost.period_subscription, Decimal::MAX);
        assert_eq!(cost.annual_or_period_cost, Decimal::MAX);
    }

    proptest! {
        #[test]
        fn sku_blocks_are_monotonic(
            a in 0u64..1_000_000,
            b in 0u64..1_000_000,
            block in 1u64..50_000,
        ) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(sku_blocks(lo, 10_000, block) <= sku_blocks(hi, 10_000, block));
        }

        #[test]
        fn usage_at_or_below_included_is_free(
            cnpj in 0u64..=1,
            sku in 0u64..=10_000,
            users in 0u64..=2,
        ) {
            let usage = UsageInput {
                cnpj_count: cnpj,
                sku_count: sku,
                user_count: users,
                ..Default::default()
            };
            let cost = compute_cost(&profissional(), &usage, 12);
            prop_assert_eq!(cost.overage.total(), Decimal::ZERO);
        }
    }
}
