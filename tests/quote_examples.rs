//! 단일 플랜 위젯의 기준 예시로 비용/ROI 계산을 검증한다.
use kenit_calculator::input::FormField;
use kenit_calculator::pricing::{compute_cost, PlanCatalog, UsageInput};
use kenit_calculator::roi::{compute_roi, SalesInput, StockInput};
use kenit_calculator::{CalculatorSession, FormState};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn reference_usage() -> UsageInput {
    UsageInput {
        cnpj_count: 3,
        sku_count: 25_000,
        user_count: 5,
        ..Default::default()
    }
}

#[test]
fn reference_plan_cost() {
    let catalog = PlanCatalog::built_in();
    let tier = catalog.tier("profissional").expect("tier");
    let cost = compute_cost(tier, &reference_usage(), 12);

    assert_eq!(cost.overage.cnpj, dec!(200));
    assert_eq!(cost.overage.sku, dec!(500));
    assert_eq!(cost.overage.users, dec!(150));
    assert_eq!(cost.monthly_cost, dec!(2150));
    assert_eq!(cost.setup_cost, dec!(15600));
    assert_eq!(cost.annual_or_period_cost, dec!(41400));
}

#[test]
fn reference_roi() {
    let catalog = PlanCatalog::built_in();
    let cost = compute_cost(
        catalog.tier("profissional").expect("tier"),
        &reference_usage(),
        12,
    );
    let stock = StockInput {
        stock_value: dec!(100000),
        ..Default::default()
    };
    let sales = SalesInput {
        monthly_sales: dec!(50000),
        ..Default::default()
    };
    let roi = compute_roi(&stock, &sales, &cost);

    assert_eq!(roi.excess_stock_value, dec!(100000));
    assert_eq!(roi.average_excess_reduction, dec!(25000));
    assert_eq!(roi.rupture_annual_loss, dec!(60000));
    assert_eq!(roi.rupture_recovery, dec!(30000));
    assert_eq!(roi.total_savings, dec!(55000));
    assert_eq!(roi.net_savings, dec!(13600));
    assert_eq!(roi.roi_percent.round_dp(2), dec!(32.85));
    assert_eq!(
        roi.savings_share_percent + roi.cost_share_percent,
        dec!(100)
    );
    assert!(roi.is_positive());
}

#[test]
fn session_recompute_from_raw_form() {
    let session = CalculatorSession::default();
    let mut form = FormState::default();
    for (field, value) in [
        (FormField::Cnpj, "3"),
        (FormField::Sku, "25000"),
        (FormField::Users, "5"),
        (FormField::StockValue, "100000"),
        (FormField::MonthlySales, "50000"),
    ] {
        form.set(field, value);
    }
    let quote = session.recompute(&form);
    assert_eq!(quote.plan_id, "profissional");
    assert_eq!(quote.cost.annual_or_period_cost, dec!(41400));
    assert_eq!(quote.roi.net_savings, dec!(13600));

    // 총 재고 모드: 60% 과잉 가정
    form.set(FormField::StockIsTotal, "sim");
    let quote = session.recompute(&form);
    assert_eq!(quote.roi.excess_stock_value, dec!(60000));
    assert_eq!(quote.roi.total_savings, dec!(15000) + dec!(30000));
}

#[test]
fn invalid_counts_match_zero() {
    let session = CalculatorSession::default();
    let mut garbage = FormState::default();
    garbage.set(FormField::Cnpj, "abc");
    garbage.set(FormField::Sku, "");
    garbage.set(FormField::Users, "--");
    let mut zeros = FormState::default();
    zeros.set(FormField::Cnpj, "0");
    zeros.set(FormField::Sku, "0");
    zeros.set(FormField::Users, "0");
    assert_eq!(session.recompute(&garbage), session.recompute(&zeros));
}

#[test]
fn zero_cost_tier_reports_zero_roi() {
    let catalog = PlanCatalog::from_toml_str(
        r#"
        [[plan]]
        id = "gratis"
        name = "Grátis"
        base_monthly_fee = 0
        included_cnpj = 1
        included_sku = 1000
        cnpj_rate = 0
        sku_block_rate = 0
        user_rate = 0
        setup = { onboarding = 0, implementation = 0 }
        "#,
    )
    .expect("catalog");
    let tier = catalog.tier("gratis").expect("tier");
    assert!(tier.has_unlimited_users());
    let cost = compute_cost(tier, &reference_usage(), 12);
    assert_eq!(cost.annual_or_period_cost, Decimal::ZERO);

    let sales = SalesInput {
        monthly_sales: dec!(50000),
        ..Default::default()
    };
    let roi = compute_roi(&StockInput::default(), &sales, &cost);
    assert_eq!(roi.roi_percent, Decimal::ZERO);
    assert_eq!(roi.savings_share_percent, dec!(100));
    assert_eq!(roi.cost_share_percent, dec!(0));
}

#[test]
fn oversized_form_values_do_not_abort() {
    let session = CalculatorSession::default();
    let mut form = FormState::default();
    form.set(FormField::MonthlySales, "70000000000000000000000000000");
    form.set(FormField::StockValue, "9e40");
    form.set(FormField::Cnpj, "99999999999999999999999");

    let quote = session.recompute(&form);
    assert_eq!(quote.roi.rupture_annual_loss, Decimal::MAX);
    assert_eq!(quote.roi.excess_stock_value, Decimal::MAX);
    assert_eq!(
        quote.roi.savings_share_percent + quote.roi.cost_share_percent,
        dec!(100)
    );
}
