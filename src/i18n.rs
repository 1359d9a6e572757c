use sys_locale::get_locale;

/// 문자열 키를 모아두는 네임스페이스.
pub mod keys {
    pub const ERROR_PREFIX: &str = "general.error_prefix";
    pub const APP_EXIT: &str = "general.app_exit";

    pub const PLANS_HEADING: &str = "plans.heading";
    pub const PLANS_BASE_FEE: &str = "plans.base_fee";
    pub const PLANS_INCLUDED: &str = "plans.included";
    pub const PLANS_UNLIMITED_USERS: &str = "plans.unlimited_users";
    pub const PLANS_MODULES: &str = "plans.modules";
    pub const PLANS_SELECTED: &str = "plans.selected";
    pub const PLAN_SAVED: &str = "plans.saved";

    pub const QUOTE_HEADING: &str = "quote.heading";
    pub const COST_MONTHLY: &str = "cost.monthly";
    pub const COST_SETUP: &str = "cost.setup";
    pub const COST_TOTAL: &str = "cost.total";
    pub const COST_HORIZON: &str = "cost.horizon";
    pub const COST_OVERAGE: &str = "cost.overage";
    pub const COST_MODULES: &str = "cost.modules";
    pub const COST_DISCOUNT: &str = "cost.discount";
    pub const COST_INTEGRATION: &str = "cost.integration";

    pub const ROI_EXCESS_STOCK: &str = "roi.excess_stock";
    pub const ROI_REDUCTION_20: &str = "roi.reduction_20";
    pub const ROI_REDUCTION_30: &str = "roi.reduction_30";
    pub const ROI_RUPTURE_LOSS: &str = "roi.rupture_loss";
    pub const ROI_RUPTURE_RECOVERY: &str = "roi.rupture_recovery";
    pub const ROI_EXCESS_SAVINGS: &str = "roi.excess_savings";
    pub const ROI_TOTAL_SAVINGS: &str = "roi.total_savings";
    pub const ROI_NET_SAVINGS: &str = "roi.net_savings";
    pub const ROI_FINAL: &str = "roi.final";
    pub const BAR_SAVINGS: &str = "bar.savings";
    pub const BAR_COST: &str = "bar.cost";

    pub const COMPARE_HEADING: &str = "compare.heading";
    pub const COMPARE_BEST: &str = "compare.best";
    pub const COMPARE_PURCHASE_REQUIRED: &str = "compare.purchase_required";

    pub const OVERRIDES_HEADING: &str = "overrides.heading";
    pub const OVERRIDES_CLEARED: &str = "overrides.cleared";
    pub const OVERRIDE_REMOVED: &str = "overrides.removed";

    pub const INTERACTIVE_HEADING: &str = "interactive.heading";
    pub const INTERACTIVE_HELP: &str = "interactive.help";
    pub const PROMPT_COMMAND: &str = "prompt.command";
    pub const ERROR_UNKNOWN_COMMAND: &str = "error.unknown_command";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Pt,
    En,
}

impl Language {
    fn from_code(code: &str) -> Option<Self> {
        let c = code.trim().to_lowercase();
        if c.starts_with("pt") {
            Some(Language::Pt)
        } else if c.starts_with("en") {
            Some(Language::En)
        } else {
            None
        }
    }
}

/// 런타임 언어 번들을 제공한다.
#[derive(Debug, Clone, Copy)]
pub struct Translator {
    lang: Language,
}

impl Translator {
    pub fn new(lang: Language) -> Self {
        Self { lang }
    }

    pub fn language(&self) -> Language {
        self.lang
    }

    /// 번역을 가져온다. 영어 번역이 없으면 포르투갈어 문자열을 폴백한다.
    pub fn t(&self, key: &str) -> &'static str {
        match self.lang {
            Language::En => en(key).unwrap_or_else(|| pt(key)),
            Language::Pt => pt(key),
        }
    }
}

/// CLI 플래그/설정/시스템 순으로 언어를 결정한다. 모두 없으면 포르투갈어.
pub fn resolve_language(cli_arg: Option<&str>, config_lang: Option<&str>) -> Language {
    cli_arg
        .and_then(Language::from_code)
        .or_else(|| config_lang.and_then(Language::from_code))
        .or_else(|| get_locale().as_deref().and_then(Language::from_code))
        .unwrap_or(Language::Pt)
}

fn pt(key: &str) -> &'static str {
    use keys::*;
    match key {
        ERROR_PREFIX => "Erro:",
        APP_EXIT => "Até logo.",
        PLANS_HEADING => "\n=== Planos Kenit ===",
        PLANS_BASE_FEE => "Mensalidade base:",
        PLANS_INCLUDED => "Incluso:",
        PLANS_UNLIMITED_USERS => "usuários ilimitados",
        PLANS_MODULES => "Módulos:",
        PLANS_SELECTED => "(selecionado)",
        PLAN_SAVED => "Plano salvo:",
        QUOTE_HEADING => "\n=== Simulação - plano",
        COST_MONTHLY => "Custo mensal:",
        COST_SETUP => "Implantação (setup):",
        COST_TOTAL => "Custo total no período:",
        COST_HORIZON => "Período (meses):",
        COST_OVERAGE => "Adicionais (CNPJ / SKU / usuários):",
        COST_MODULES => "Módulos:",
        COST_DISCOUNT => "Desconto pré-pago:",
        COST_INTEGRATION => "Integração:",
        ROI_EXCESS_STOCK => "Excesso de estoque:",
        ROI_REDUCTION_20 => "Redução de 20%:",
        ROI_REDUCTION_30 => "Redução de 30%:",
        ROI_RUPTURE_LOSS => "Perda anual por ruptura:",
        ROI_RUPTURE_RECOVERY => "Recuperação de ruptura:",
        ROI_EXCESS_SAVINGS => "Economia com excesso (25%):",
        ROI_TOTAL_SAVINGS => "Economia total:",
        ROI_NET_SAVINGS => "Economia líquida:",
        ROI_FINAL => "ROI:",
        BAR_SAVINGS => "Economia",
        BAR_COST => "Custo Kenit",
        COMPARE_HEADING => "\n=== Comparação de planos ===",
        COMPARE_BEST => "Melhor ROI:",
        COMPARE_PURCHASE_REQUIRED => "Informe o volume mensal de compras/vendas (maior que zero).",
        OVERRIDES_HEADING => "Valores ajustados:",
        OVERRIDES_CLEARED => "Ajustes removidos.",
        OVERRIDE_REMOVED => "Ajuste removido.",
        INTERACTIVE_HEADING => "\n=== Calculadora Kenit ===",
        INTERACTIVE_HELP => "Comandos: <campo> <valor> | plano <id> | ajustar <plano.campo=valor> | limpar [plano.campo] | comparar | planos | sair\nCampos: cnpj sku usuarios modulo integracao teste prepago estoque estoque_total excesso vendas ruptura recuperacao",
        PROMPT_COMMAND => "> ",
        ERROR_UNKNOWN_COMMAND => "Comando desconhecido. Digite 'ajuda'.",
        _ => "",
    }
}

fn en(key: &str) -> Option<&'static str> {
    use keys::*;
    Some(match key {
        ERROR_PREFIX => "Error:",
        APP_EXIT => "Bye.",
        PLANS_HEADING => "\n=== Kenit plans ===",
        PLANS_BASE_FEE => "Base monthly fee:",
        PLANS_INCLUDED => "Included:",
        PLANS_UNLIMITED_USERS => "unlimited users",
        PLANS_MODULES => "Modules:",
        PLANS_SELECTED => "(selected)",
        PLAN_SAVED => "Plan saved:",
        QUOTE_HEADING => "\n=== Quote - plan",
        COST_MONTHLY => "Monthly cost:",
        COST_SETUP => "Setup:",
        COST_TOTAL => "Total cost for the period:",
        COST_HORIZON => "Period (months):",
        COST_OVERAGE => "Overage (CNPJ / SKU / users):",
        COST_MODULES => "Modules:",
        COST_DISCOUNT => "Prepayment discount:",
        COST_INTEGRATION => "Integration:",
        ROI_EXCESS_STOCK => "Excess stock:",
        ROI_REDUCTION_20 => "20% reduction:",
        ROI_REDUCTION_30 => "30% reduction:",
        ROI_RUPTURE_LOSS => "Annual stockout loss:",
        ROI_RUPTURE_RECOVERY => "Stockout recovery:",
        ROI_EXCESS_SAVINGS => "Excess savings (25%):",
        ROI_TOTAL_SAVINGS => "Total savings:",
        ROI_NET_SAVINGS => "Net savings:",
        ROI_FINAL => "ROI:",
        BAR_SAVINGS => "Savings",
        BAR_COST => "Kenit cost",
        COMPARE_HEADING => "\n=== Plan comparison ===",
        COMPARE_BEST => "Best ROI:",
        COMPARE_PURCHASE_REQUIRED => "Enter the monthly purchase/sales volume (greater than zero).",
        OVERRIDES_HEADING => "Adjusted values:",
        OVERRIDES_CLEARED => "Adjustments cleared.",
        OVERRIDE_REMOVED => "Adjustment removed.",
        INTERACTIVE_HEADING => "\n=== Kenit calculator ===",
        INTERACTIVE_HELP => "Commands: <field> <value> | plan <id> | set <plan.field=value> | reset [plan.field] | compare | plans | quit\nFields: cnpj sku users module integration trial prepay stock total_stock excess sales rupture recovery",
        PROMPT_COMMAND => "> ",
        ERROR_UNKNOWN_COMMAND => "Unknown command. Type 'help'.",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_codes_win() {
        assert_eq!(resolve_language(Some("en-US"), Some("pt-BR")), Language::En);
        assert_eq!(resolve_language(Some("auto"), Some("pt-BR")), Language::Pt);
        assert_eq!(resolve_language(None, Some("en")), Language::En);
    }

    #[test]
    fn every_portuguese_key_has_english() {
        let keys = [
            keys::COST_MONTHLY,
            keys::ROI_FINAL,
            keys::BAR_COST,
            keys::COMPARE_PURCHASE_REQUIRED,
            keys::INTERACTIVE_HELP,
            keys::OVERRIDE_REMOVED,
        ];
        for key in keys {
            assert!(!pt(key).is_empty(), "{key}");
            assert!(en(key).is_some(), "{key}");
        }
    }
}
