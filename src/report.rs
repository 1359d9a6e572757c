//! 견적 결과를 사람이 읽는 텍스트로 만든다.

use std::fmt::Write as _;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::i18n::{keys, Language, Translator};
use crate::pricing::{PlanCatalog, PlanTier};
use crate::roi::{best_by_roi, PlanQuote};
use crate::session::Quote;

/// 막대 라벨을 표시하는 최소 비율(%). 그보다 좁은 구간은 라벨을 숨긴다.
pub const LABEL_MIN_SHARE: Decimal = dec!(10);
const BAR_WIDTH: u32 = 40;

fn group_thousands(digits: &str, sep: char) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, c) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(sep);
        }
        out.push(c);
    }
    out
}

fn format_fixed(value: Decimal, lang: Language) -> String {
    let mut rounded = value
        .abs()
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    let text = rounded.to_string();
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));
    let (thousands, decimal) = match lang {
        Language::Pt => ('.', ','),
        Language::En => (',', '.'),
    };
    let sign = if value < Decimal::ZERO && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}{}{decimal}{frac_part}", group_thousands(int_part, thousands))
}

/// 금액을 레알(BRL) 표기로 만든다. pt: `R$ 1.300,00`, en: `R$1,300.00`.
pub fn format_currency(value: Decimal, lang: Language) -> String {
    let fixed = format_fixed(value, lang);
    let (sign, body) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    match lang {
        Language::Pt => format!("{sign}R$ {body}"),
        Language::En => format!("{sign}R${body}"),
    }
}

/// 소수 둘째 자리까지의 퍼센트 표기.
pub fn format_percent(value: Decimal, lang: Language) -> String {
    format!("{}%", format_fixed(value, lang))
}

pub fn label_visible(share: Decimal) -> bool {
    share >= LABEL_MIN_SHARE
}

/// 절감액/비용 비율을 `[####....]` 막대와 라벨로 그린다.
pub fn render_bar(quote: &Quote, tr: &Translator) -> String {
    let lang = tr.language();
    let roi = &quote.roi;
    let filled = (roi.savings_share_percent * Decimal::from(BAR_WIDTH) / dec!(100))
        .round()
        .to_u32()
        .unwrap_or(0)
        .min(BAR_WIDTH);
    let mut out = format!(
        "[{}{}]",
        "#".repeat(filled as usize),
        ".".repeat((BAR_WIDTH - filled) as usize)
    );
    if label_visible(roi.savings_share_percent) {
        let _ = write!(
            out,
            " {}: {}",
            tr.t(keys::BAR_SAVINGS),
            format_currency(roi.total_savings, lang)
        );
    }
    if label_visible(roi.cost_share_percent) {
        let _ = write!(
            out,
            " {}: {}",
            tr.t(keys::BAR_COST),
            format_currency(quote.cost.annual_or_period_cost, lang)
        );
    }
    out
}

/// 한 플랜의 비용/ROI 상세 내역.
pub fn render_quote(quote: &Quote, tier: &PlanTier, tr: &Translator) -> String {
    let lang = tr.language();
    let money = |v: Decimal| format_currency(v, lang);
    let cost = &quote.cost;
    let roi = &quote.roi;
    let mut out = String::new();

    let _ = writeln!(out, "{} {} ===", tr.t(keys::QUOTE_HEADING), tier.name);
    let _ = writeln!(out, "{} {}", tr.t(keys::COST_MONTHLY), money(cost.monthly_cost));
    let _ = writeln!(
        out,
        "{} {} / {} / {}",
        tr.t(keys::COST_OVERAGE),
        money(cost.overage.cnpj),
        money(cost.overage.sku),
        money(cost.overage.users)
    );
    if !cost.module_fees.is_zero() {
        let _ = writeln!(out, "{} {}", tr.t(keys::COST_MODULES), money(cost.module_fees));
    }
    let _ = writeln!(out, "{} {}", tr.t(keys::COST_SETUP), money(cost.setup_cost));
    let _ = writeln!(out, "{} {}", tr.t(keys::COST_HORIZON), cost.horizon_months);
    if !cost.prepayment_discount.is_zero() {
        let _ = writeln!(
            out,
            "{} -{}",
            tr.t(keys::COST_DISCOUNT),
            money(cost.prepayment_discount)
        );
    }
    if !cost.integration_fee.is_zero() {
        let _ = writeln!(out, "{} {}", tr.t(keys::COST_INTEGRATION), money(cost.integration_fee));
    }
    let _ = writeln!(out, "{} {}", tr.t(keys::COST_TOTAL), money(cost.annual_or_period_cost));
    out.push('\n');

    let rows = [
        (keys::ROI_EXCESS_STOCK, roi.excess_stock_value),
        (keys::ROI_REDUCTION_20, roi.reduction20),
        (keys::ROI_REDUCTION_30, roi.reduction30),
        (keys::ROI_RUPTURE_LOSS, roi.rupture_annual_loss),
        (keys::ROI_RUPTURE_RECOVERY, roi.rupture_recovery),
        (keys::ROI_EXCESS_SAVINGS, roi.average_excess_reduction),
        (keys::ROI_TOTAL_SAVINGS, roi.total_savings),
        (keys::ROI_NET_SAVINGS, roi.net_savings),
    ];
    for (key, value) in rows {
        let _ = writeln!(out, "{} {}", tr.t(key), money(value));
    }
    let _ = writeln!(out, "{} {}", tr.t(keys::ROI_FINAL), format_percent(roi.roi_percent, lang));
    let _ = writeln!(out, "{}", render_bar(quote, tr));
    out
}

/// 플랜 비교 표.
pub fn render_comparison(quotes: &[PlanQuote], tr: &Translator) -> String {
    let lang = tr.language();
    let mut out = String::new();
    let _ = writeln!(out, "{}", tr.t(keys::COMPARE_HEADING));
    for q in quotes {
        let _ = writeln!(
            out,
            "{:<14} {:>16} {:>18} {:>10}",
            q.plan_name,
            format_currency(q.cost.monthly_cost, lang),
            format_currency(q.cost.annual_or_period_cost, lang),
            format_percent(q.roi.roi_percent, lang)
        );
    }
    if let Some(best) = best_by_roi(quotes) {
        let _ = writeln!(out, "{} {}", tr.t(keys::COMPARE_BEST), best.plan_name);
    }
    out
}

/// 카탈로그 목록과 현재 덮어쓰기 값.
pub fn render_catalog(catalog: &PlanCatalog, selected: &str, tr: &Translator) -> String {
    let lang = tr.language();
    let mut out = String::new();
    let _ = writeln!(out, "{}", tr.t(keys::PLANS_HEADING));
    for tier in catalog.tiers() {
        let marker = if tier.id == selected {
            tr.t(keys::PLANS_SELECTED)
        } else {
            ""
        };
        let _ = writeln!(out, "{} [{}] {}", tier.name, tier.id, marker);
        let _ = writeln!(
            out,
            "  {} {}",
            tr.t(keys::PLANS_BASE_FEE),
            format_currency(tier.base_monthly_fee, lang)
        );
        let users = match tier.included_users {
            Some(n) => n.to_string(),
            None => tr.t(keys::PLANS_UNLIMITED_USERS).to_string(),
        };
        let _ = writeln!(
            out,
            "  {} CNPJ {} / SKU {} / {}",
            tr.t(keys::PLANS_INCLUDED),
            tier.included_cnpj,
            tier.included_sku,
            users
        );
        if !tier.modules.is_empty() {
            let names: Vec<&str> = tier.modules.iter().map(|m| m.name.as_str()).collect();
            let _ = writeln!(out, "  {} {}", tr.t(keys::PLANS_MODULES), names.join(", "));
        }
    }
    if catalog.has_overrides() {
        let _ = writeln!(out, "{}", tr.t(keys::OVERRIDES_HEADING));
        for (plan, field, value) in catalog.overrides() {
            let _ = writeln!(out, "  {plan}.{field} = {value}");
        }
    }
    out
}
