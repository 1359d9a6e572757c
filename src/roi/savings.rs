use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::pricing::CostResult;

/// 총 재고 중 과잉 재고로 보는 기본 비율.
pub const DEFAULT_EXCESS_RATE: Decimal = dec!(0.60);
/// 월 매출 중 품절로 잃는 기본 비율.
pub const DEFAULT_RUPTURE_RATE: Decimal = dec!(0.10);
/// 품절 손실 중 회복 가능한 기본 비율.
pub const DEFAULT_RUPTURE_RECOVERY_RATE: Decimal = dec!(0.50);

const LOW_EXCESS_REDUCTION: Decimal = dec!(0.20);
const HIGH_EXCESS_REDUCTION: Decimal = dec!(0.30);
const AVERAGE_EXCESS_REDUCTION: Decimal = dec!(0.25);
const MONTHS_PER_YEAR: Decimal = dec!(12);
const HUNDRED: Decimal = dec!(100);
/// 막대 비율의 소수 자릿수. 이 자릿수로 고정해야 `100 - 비율`이 정확히 떨어진다.
const SHARE_SCALE: u32 = 12;

/// 재고 입력.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockInput {
    pub stock_value: Decimal,
    /// true면 `stock_value`는 총 재고이며 `excess_rate`를 곱해 과잉분을 구한다.
    pub value_is_total_stock: bool,
    pub excess_rate: Decimal,
}

impl Default for StockInput {
    fn default() -> Self {
        Self {
            stock_value: Decimal::ZERO,
            value_is_total_stock: false,
            excess_rate: DEFAULT_EXCESS_RATE,
        }
    }
}

/// 매출 입력.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesInput {
    pub monthly_sales: Decimal,
    pub rupture_rate: Decimal,
    pub rupture_recovery_rate: Decimal,
}

impl Default for SalesInput {
    fn default() -> Self {
        Self {
            monthly_sales: Decimal::ZERO,
            rupture_rate: DEFAULT_RUPTURE_RATE,
            rupture_recovery_rate: DEFAULT_RUPTURE_RECOVERY_RATE,
        }
    }
}

/// ROI 계산 결과. 금액은 모두 연간 기준.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoiResult {
    pub excess_stock_value: Decimal,
    pub reduction20: Decimal,
    pub reduction30: Decimal,
    pub average_excess_reduction: Decimal,
    pub rupture_annual_loss: Decimal,
    pub rupture_recovery: Decimal,
    pub total_savings: Decimal,
    pub net_savings: Decimal,
    pub roi_percent: Decimal,
    pub savings_share_percent: Decimal,
    pub cost_share_percent: Decimal,
}

impl RoiResult {
    pub fn is_positive(&self) -> bool {
        self.net_savings >= Decimal::ZERO
    }
}

/// 절감액과 비용을 막대 그래프 비율(합 100)로 나눈다. 둘 다 0이면 (0, 0).
pub fn bar_split(savings: Decimal, cost: Decimal) -> (Decimal, Decimal) {
    let base = savings.saturating_add(cost);
    if base <= Decimal::ZERO {
        return (Decimal::ZERO, Decimal::ZERO);
    }
    let savings_share = savings
        .checked_div(base)
        .map(|ratio| (ratio * HUNDRED).round_dp(SHARE_SCALE))
        .unwrap_or(Decimal::ZERO);
    (savings_share, HUNDRED - savings_share)
}

/// `numerator / denominator * 100`. 범위를 넘으면 부호에 맞춰 최댓값/최솟값으로 포화한다.
fn percent_of(numerator: Decimal, denominator: Decimal) -> Decimal {
    match numerator.checked_div(denominator) {
        Some(ratio) => ratio.saturating_mul(HUNDRED),
        None if numerator < Decimal::ZERO => Decimal::MIN,
        None => Decimal::MAX,
    }
}

/// 재고/매출 입력과 구독 비용으로 예상 절감액과 ROI를 계산한다.
///
/// 입력이 아무리 커도 패닉하지 않는다. `Decimal` 범위를 넘는 금액은 최댓값으로 포화한다.
pub fn compute_roi(stock: &StockInput, sales: &SalesInput, cost: &CostResult) -> RoiResult {
    let excess_stock_value = if stock.stock_value <= Decimal::ZERO {
        Decimal::ZERO
    } else if stock.value_is_total_stock {
        stock.stock_value.saturating_mul(stock.excess_rate)
    } else {
        stock.stock_value
    };

    let reduction20 = excess_stock_value.saturating_mul(LOW_EXCESS_REDUCTION);
    let reduction30 = excess_stock_value.saturating_mul(HIGH_EXCESS_REDUCTION);
    let average_excess_reduction = excess_stock_value.saturating_mul(AVERAGE_EXCESS_REDUCTION);

    let (rupture_annual_loss, rupture_recovery) = if sales.monthly_sales > Decimal::ZERO {
        let annual_loss = sales
            .monthly_sales
            .saturating_mul(sales.rupture_rate)
            .saturating_mul(MONTHS_PER_YEAR);
        (
            annual_loss,
            annual_loss.saturating_mul(sales.rupture_recovery_rate),
        )
    } else {
        (Decimal::ZERO, Decimal::ZERO)
    };

    let annual_cost = cost.annual_or_period_cost;
    let total_savings = average_excess_reduction.saturating_add(rupture_recovery);
    let net_savings = total_savings.saturating_sub(annual_cost);
    let roi_percent = if annual_cost > Decimal::ZERO {
        percent_of(net_savings, annual_cost)
    } else {
        Decimal::ZERO
    };
    let (savings_share_percent, cost_share_percent) = bar_split(total_savings, annual_cost);

    RoiResult {
        excess_stock_value,
        reduction20,
        reduction30,
        average_excess_reduction,
        rupture_annual_loss,
        rupture_recovery,
        total_savings,
        net_savings,
        roi_percent,
        savings_share_percent,
        cost_share_percent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::{compute_cost, PlanCatalog, UsageInput};
    use proptest::prelude::*;

    fn cost_of(total: Decimal) -> CostResult {
        let catalog = PlanCatalog::built_in();
        let mut cost = compute_cost(
            catalog.tier("profissional").unwrap(),
            &UsageInput::default(),
            12,
        );
        cost.annual_or_period_cost = total;
        cost
    }

    #[test]
    fn excess_value_modes() {
        let cost = cost_of(dec!(1000));
        let direct = StockInput {
            stock_value: dec!(100000),
            ..Default::default()
        };
        let roi = compute_roi(&direct, &SalesInput::default(), &cost);
        assert_eq!(roi.excess_stock_value, dec!(100000));

        let total = StockInput {
            value_is_total_stock: true,
            ..direct.clone()
        };
        let roi = compute_roi(&total, &SalesInput::default(), &cost);
        assert_eq!(roi.excess_stock_value, dec!(60000));
        assert_eq!(roi.reduction20, dec!(12000));
        assert_eq!(roi.reduction30, dec!(18000));
        assert_eq!(roi.average_excess_reduction, dec!(15000));

        let negative = StockInput {
            stock_value: dec!(-5),
            ..Default::default()
        };
        let roi = compute_roi(&negative, &SalesInput::default(), &cost);
        assert_eq!(roi.excess_stock_value, dec!(0));
    }

    #[test]
    fn zero_sales_has_no_rupture() {
        let roi = compute_roi(
            &StockInput::default(),
            &SalesInput::default(),
            &cost_of(dec!(1000)),
        );
        assert_eq!(roi.rupture_annual_loss, dec!(0));
        assert_eq!(roi.rupture_recovery, dec!(0));
        assert_eq!(roi.total_savings, dec!(0));
        assert_eq!(roi.roi_percent, dec!(-100));
        assert_eq!(roi.savings_share_percent, dec!(0));
        assert_eq!(roi.cost_share_percent, dec!(100));
    }

    #[test]
    fn zero_cost_reports_zero_roi() {
        let stock = StockInput {
            stock_value: dec!(40000),
            ..Default::default()
        };
        let roi = compute_roi(&stock, &SalesInput::default(), &cost_of(dec!(0)));
        assert_eq!(roi.roi_percent, dec!(0));
        assert_eq!(roi.savings_share_percent, dec!(100));
        assert_eq!(roi.cost_share_percent, dec!(0));
    }

    #[test]
    fn oversized_amounts_saturate() {
        let stock = StockInput {
            stock_value: Decimal::MAX,
            value_is_total_stock: true,
            ..Default::default()
        };
        let sales = SalesInput {
            monthly_sales: dec!(70000000000000000000000000000),
            ..Default::default()
        };
        let roi = compute_roi(&stock, &sales, &cost_of(dec!(1000)));
        assert_eq!(roi.rupture_annual_loss, Decimal::MAX);
        assert!(roi.is_positive());
        assert_eq!(roi.savings_share_percent + roi.cost_share_percent, dec!(100));

        let tiny_cost = cost_of(dec!(0.0000000000000000000000000001));
        let roi = compute_roi(&stock, &sales, &tiny_cost);
        assert_eq!(roi.roi_percent, Decimal::MAX);
    }

    #[test]
    fn everything_zero_splits_to_zero() {
        assert_eq!(bar_split(dec!(0), dec!(0)), (dec!(0), dec!(0)));
    }

    proptest! {
        #[test]
        fn shares_sum_to_hundred(savings in 0u64..10_000_000, cost in 0u64..10_000_000) {
            prop_assume!(savings + cost > 0);
            let (s, c) = bar_split(Decimal::from(savings), Decimal::from(cost));
            prop_assert_eq!(s + c, dec!(100));
            prop_assert!(s >= Decimal::ZERO && c >= Decimal::ZERO);
        }
    }
}
