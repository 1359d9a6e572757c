//! 입력 폼 상태와 숫자 변환 규칙.
//!
//! 값은 화면에서 받은 문자열 그대로 보관하고 계산할 때마다 변환한다.
//! 비었거나 해석할 수 없는 숫자는 0, 비율은 기본값으로 취급한다.

use std::collections::BTreeSet;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use thiserror::Error;

use crate::pricing::{OptionFlags, UsageInput};
use crate::roi::{
    SalesInput, StockInput, DEFAULT_EXCESS_RATE, DEFAULT_RUPTURE_RATE,
    DEFAULT_RUPTURE_RECOVERY_RATE,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("알 수 없는 입력 항목: {0}")]
    UnknownField(String),
}

/// 폼에서 편집 가능한 항목.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Cnpj,
    Sku,
    Users,
    Module,
    Integration,
    Trial,
    Prepay,
    StockValue,
    StockIsTotal,
    ExcessPercent,
    MonthlySales,
    RupturePercent,
    RecoveryPercent,
}

impl FromStr for FormField {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let field = match s.trim().to_lowercase().as_str() {
            "cnpj" | "cnpjs" => FormField::Cnpj,
            "sku" | "skus" => FormField::Sku,
            "usuarios" | "users" => FormField::Users,
            "modulo" | "module" => FormField::Module,
            "integracao" | "integration" => FormField::Integration,
            "teste" | "trial" => FormField::Trial,
            "prepago" | "prepay" => FormField::Prepay,
            "estoque" | "stock" => FormField::StockValue,
            "estoque_total" | "total_stock" => FormField::StockIsTotal,
            "excesso" | "excess" => FormField::ExcessPercent,
            "vendas" | "sales" => FormField::MonthlySales,
            "ruptura" | "rupture" => FormField::RupturePercent,
            "recuperacao" | "recovery" => FormField::RecoveryPercent,
            other => return Err(InputError::UnknownField(other.to_string())),
        };
        Ok(field)
    }
}

/// 현재 폼 상태. 계산마다 `usage`/`stock`/`sales`로 새 입력을 만든다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub cnpj: String,
    pub sku: String,
    pub users: String,
    pub modules: BTreeSet<String>,
    pub integration: bool,
    pub trial: bool,
    pub prepay: bool,
    pub stock_value: String,
    pub stock_is_total: bool,
    pub excess_percent: String,
    pub monthly_sales: String,
    pub rupture_percent: String,
    pub recovery_percent: String,
}

impl FormState {
    /// 항목 하나를 갱신한다. 모듈은 `-이름`으로 선택을 해제한다.
    pub fn set(&mut self, field: FormField, value: &str) {
        let value = value.trim();
        match field {
            FormField::Cnpj => self.cnpj = value.to_string(),
            FormField::Sku => self.sku = value.to_string(),
            FormField::Users => self.users = value.to_string(),
            FormField::Module => match value.strip_prefix('-') {
                Some(name) => {
                    self.modules.remove(name);
                }
                None if !value.is_empty() => {
                    self.modules.insert(value.to_string());
                }
                None => {}
            },
            FormField::Integration => self.integration = parse_flag(value),
            FormField::Trial => self.trial = parse_flag(value),
            FormField::Prepay => self.prepay = parse_flag(value),
            FormField::StockValue => self.stock_value = value.to_string(),
            FormField::StockIsTotal => self.stock_is_total = parse_flag(value),
            FormField::ExcessPercent => self.excess_percent = value.to_string(),
            FormField::MonthlySales => self.monthly_sales = value.to_string(),
            FormField::RupturePercent => self.rupture_percent = value.to_string(),
            FormField::RecoveryPercent => self.recovery_percent = value.to_string(),
        }
    }

    /// 항목 이름으로 갱신한다.
    pub fn set_named(&mut self, name: &str, value: &str) -> Result<FormField, InputError> {
        let field: FormField = name.parse()?;
        self.set(field, value);
        Ok(field)
    }

    pub fn usage(&self) -> UsageInput {
        UsageInput {
            cnpj_count: parse_count(&self.cnpj),
            sku_count: parse_count(&self.sku),
            user_count: parse_count(&self.users),
            selected_modules: self.modules.clone(),
            options: OptionFlags {
                use_integration_addon: self.integration,
                trial_mode: self.trial,
                prepay: self.prepay,
            },
        }
    }

    pub fn stock(&self) -> StockInput {
        StockInput {
            stock_value: parse_amount(&self.stock_value),
            value_is_total_stock: self.stock_is_total,
            excess_rate: parse_rate(&self.excess_percent, DEFAULT_EXCESS_RATE),
        }
    }

    pub fn sales(&self) -> SalesInput {
        SalesInput {
            monthly_sales: parse_amount(&self.monthly_sales),
            rupture_rate: parse_rate(&self.rupture_percent, DEFAULT_RUPTURE_RATE),
            rupture_recovery_rate: parse_rate(
                &self.recovery_percent,
                DEFAULT_RUPTURE_RECOVERY_RATE,
            ),
        }
    }
}

/// 앞쪽 정수 부분만 읽는다. 숫자가 없거나 음수면 0.
pub fn parse_count(raw: &str) -> u64 {
    let s = raw.trim();
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let digits = &digits[..end];
    if negative || digits.is_empty() {
        return 0;
    }
    digits.parse::<u64>().unwrap_or(u64::MAX)
}

/// 앞쪽 십진수 부분을 금액으로 읽는다. `1e5` 같은 지수 표기도 받는다.
///
/// 해석할 수 없으면 0, `Decimal` 범위를 넘으면 부호에 맞춰 최댓값/최솟값으로 포화한다.
pub fn parse_amount(raw: &str) -> Decimal {
    let s = raw.trim();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    for (idx, c) in s.char_indices() {
        match c {
            '+' | '-' if idx == 0 => {}
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = idx + c.len_utf8();
    }
    if !seen_digit {
        return Decimal::ZERO;
    }
    let mantissa = s[..end].trim_end_matches('.');
    let negative = mantissa.starts_with('-');
    let Ok(value) = Decimal::from_str(mantissa) else {
        let integer_digits = mantissa
            .trim_start_matches(|c: char| c == '+' || c == '-' || c == '0')
            .split('.')
            .next()
            .map_or(0, str::len);
        return match integer_digits {
            0..=28 => Decimal::ZERO,
            _ if negative => Decimal::MIN,
            _ => Decimal::MAX,
        };
    };
    match exponent_suffix(&s[end..]) {
        Some(exp) => scale_by_exponent(value, exp),
        None => value,
    }
}

/// 지수만큼 10을 곱하거나 나눈다. 이 횟수를 넘으면 결과는 포화값이거나 0이다.
const MAX_EXPONENT_STEPS: u32 = 60;

fn scale_by_exponent(value: Decimal, exp: &str) -> Decimal {
    let shrink = exp.starts_with('-');
    let steps = exp
        .trim_start_matches(|c: char| c == '+' || c == '-')
        .parse::<u32>()
        .unwrap_or(u32::MAX)
        .min(MAX_EXPONENT_STEPS);
    let mut scaled = value;
    for _ in 0..steps {
        let next = if shrink {
            scaled.checked_div(Decimal::TEN)
        } else {
            scaled.checked_mul(Decimal::TEN)
        };
        match next {
            Some(v) => scaled = v,
            None if value < Decimal::ZERO => return Decimal::MIN,
            None => return Decimal::MAX,
        }
    }
    scaled
}

/// 가수 뒤의 `e5`, `E-3` 같은 지수 부분. 숫자가 없으면 `None`.
fn exponent_suffix(rest: &str) -> Option<&str> {
    let body = rest.strip_prefix(|c: char| c == 'e' || c == 'E')?;
    let sign_len = usize::from(body.starts_with(|c: char| c == '+' || c == '-'));
    let digits = body[sign_len..]
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(body.len() - sign_len);
    (digits > 0).then(|| &body[..sign_len + digits])
}

/// 퍼센트 문자열을 0~1 비율로 읽는다.
///
/// 비었거나 0 이하이면 `default`, 100%를 넘으면 1로 제한한다.
pub fn parse_rate(raw: &str, default: Decimal) -> Decimal {
    let rate = parse_amount(raw) / dec!(100);
    if rate <= Decimal::ZERO {
        default
    } else {
        rate.min(Decimal::ONE)
    }
}

/// 체크박스 값. 알 수 없는 값은 꺼진 것으로 본다.
pub fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_lowercase().as_str(),
        "1" | "true" | "on" | "x" | "s" | "sim" | "y" | "yes"
    )
}
