use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::str::FromStr;

use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::debug;

use crate::config::{self, Config, ConfigError, DEFAULT_CONFIG_PATH};
use crate::i18n::{self, keys, Translator};
use crate::input::{FormField, FormState, InputError};
use crate::pricing::{CatalogError, PlanCatalog, PlanField};
use crate::report;
use crate::roi::ComparisonError;
use crate::session::CalculatorSession;

/// 애플리케이션 실행 중 발생 가능한 오류를 표현한다.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("입출력 오류: {0}")]
    Io(#[from] io::Error),
    #[error("설정 오류: {0}")]
    Config(#[from] ConfigError),
    #[error("카탈로그 오류: {0}")]
    Catalog(#[from] CatalogError),
    #[error("입력 오류: {0}")]
    Input(#[from] InputError),
    #[error("비교 불가: {0}")]
    Comparison(#[from] ComparisonError),
    /// `plano.campo=valor` 형식이 아닌 덮어쓰기 지정
    #[error("잘못된 덮어쓰기 지정: {0}")]
    InvalidOverride(String),
}

#[derive(Debug, Parser)]
#[command(name = "kenit_calculator", version, about = "Kenit pricing & ROI calculator")]
pub struct Cli {
    /// 플랜 선택을 저장하는 설정 파일
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,
    /// 내장 단가표 대신 사용할 카탈로그 TOML
    #[arg(long)]
    pub catalog: Option<PathBuf>,
    /// UI 언어 (pt-br, en, auto)
    #[arg(long)]
    pub lang: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// 플랜 목록
    Plans,
    /// 플랜을 선택하고 저장
    Select { plan: String },
    /// 선택된 플랜으로 비용과 ROI 계산
    Quote(FormArgs),
    /// 모든 플랜을 같은 입력으로 비교
    Compare(FormArgs),
    /// 입력할 때마다 다시 계산하는 대화형 모드
    Interactive,
}

/// 계산 입력 플래그. 숫자는 문자열로 받아 입력 규칙(빈 값/오류 = 0)을 그대로 따른다.
#[derive(Debug, Clone, Default, Args)]
pub struct FormArgs {
    /// 저장된 선택 대신 사용할 플랜
    #[arg(long)]
    pub plan: Option<String>,
    #[arg(long)]
    pub cnpj: Option<String>,
    #[arg(long)]
    pub sku: Option<String>,
    #[arg(long)]
    pub users: Option<String>,
    #[arg(long = "module")]
    pub modules: Vec<String>,
    #[arg(long)]
    pub integration: bool,
    #[arg(long)]
    pub trial: bool,
    #[arg(long)]
    pub prepay: bool,
    /// 재고 금액 [R$]
    #[arg(long)]
    pub stock: Option<String>,
    /// 재고 금액이 총 재고인 경우 (과잉 비율 적용)
    #[arg(long)]
    pub total_stock: bool,
    /// 과잉 재고 비율 [%]
    #[arg(long)]
    pub excess: Option<String>,
    /// 월 매출(구매) [R$]
    #[arg(long)]
    pub sales: Option<String>,
    /// 품절 비율 [%]
    #[arg(long)]
    pub rupture: Option<String>,
    /// 품절 회복 비율 [%]
    #[arg(long)]
    pub recovery: Option<String>,
    /// 카탈로그 값 덮어쓰기 (plano.campo=valor)
    #[arg(long = "set")]
    pub overrides: Vec<String>,
}

impl FormArgs {
    pub fn apply(&self, form: &mut FormState) {
        let text = [
            (FormField::Cnpj, &self.cnpj),
            (FormField::Sku, &self.sku),
            (FormField::Users, &self.users),
            (FormField::StockValue, &self.stock),
            (FormField::ExcessPercent, &self.excess),
            (FormField::MonthlySales, &self.sales),
            (FormField::RupturePercent, &self.rupture),
            (FormField::RecoveryPercent, &self.recovery),
        ];
        for (field, value) in text {
            if let Some(v) = value {
                form.set(field, v);
            }
        }
        for module in &self.modules {
            form.set(FormField::Module, module);
        }
        form.integration |= self.integration;
        form.trial |= self.trial;
        form.prepay |= self.prepay;
        form.stock_is_total |= self.total_stock;
    }
}

/// `plano.campo=valor`를 해석한다. 모듈 요금은 `plano.module.nome=valor`.
pub fn parse_override(raw: &str) -> Result<(String, PlanField, Decimal), AppError> {
    let invalid = || AppError::InvalidOverride(raw.to_string());
    let (target, value) = raw.split_once('=').ok_or_else(invalid)?;
    let (plan, field) = parse_override_target(target).ok_or_else(invalid)??;
    let value = Decimal::from_str(value.trim()).map_err(|_| invalid())?;
    Ok((plan, field, value))
}

/// `plano.campo` 부분. 형식이 틀리면 `None`.
fn parse_override_target(target: &str) -> Option<Result<(String, PlanField), AppError>> {
    let (plan, field) = target.trim().split_once('.')?;
    if plan.is_empty() {
        return None;
    }
    Some(
        PlanField::from_str(field)
            .map(|field| (plan.to_string(), field))
            .map_err(AppError::from),
    )
}

/// 대화형 루프의 다음 동작.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// 세션, 폼, 설정을 묶은 실행 상태.
#[derive(Debug)]
pub struct App {
    pub session: CalculatorSession,
    pub form: FormState,
    pub config: Config,
    pub config_path: PathBuf,
    pub tr: Translator,
}

impl App {
    /// 설정과 카탈로그를 읽어 세션을 만든다. 설정 파일 문제는 기본값으로 대체된다.
    pub fn load(
        config_path: PathBuf,
        catalog_path: Option<&std::path::Path>,
        lang: Option<&str>,
    ) -> Result<Self, AppError> {
        let config = config::load_or_default(&config_path);
        let catalog = match catalog_path {
            Some(path) => PlanCatalog::load(path)?,
            None => PlanCatalog::built_in(),
        };
        let preferred = config.resolve_plan(&catalog).to_string();
        let session = CalculatorSession::new(catalog, Some(&preferred), config.horizon_months);
        let tr = Translator::new(i18n::resolve_language(lang, config.language.as_deref()));
        debug!(language = ?tr.language(), plan = session.selected_plan(), "app loaded");
        Ok(Self {
            session,
            form: FormState::default(),
            config,
            config_path,
            tr,
        })
    }

    /// 선택을 설정 파일에 먼저 저장한 뒤 세션에 반영한다. 저장에 실패하면 둘 다 그대로다.
    pub fn select_plan(&mut self, plan_id: &str) -> Result<(), AppError> {
        if !self.session.catalog().contains(plan_id) {
            return Err(CatalogError::UnknownPlan(plan_id.to_string()).into());
        }
        let previous = self.config.selected_plan.replace(plan_id.to_string());
        if let Err(err) = self.config.save(&self.config_path) {
            self.config.selected_plan = previous;
            return Err(err.into());
        }
        self.session.select_plan(plan_id)?;
        Ok(())
    }

    pub fn apply_override(&mut self, raw: &str) -> Result<(), AppError> {
        let (plan, field, value) = parse_override(raw)?;
        self.session.catalog_mut().set_override(&plan, field, value)?;
        Ok(())
    }

    /// 인자가 없으면 모든 덮어쓰기를, `plano.campo`가 있으면 그 하나만 지운다.
    pub fn clear_overrides(&mut self, target: &str, out: &mut impl Write) -> Result<(), AppError> {
        if target.is_empty() {
            self.session.catalog_mut().reset_overrides();
            writeln!(out, "{}", self.tr.t(keys::OVERRIDES_CLEARED))?;
            return Ok(());
        }
        let (plan, field) = parse_override_target(target)
            .ok_or_else(|| AppError::InvalidOverride(target.to_string()))??;
        if self.session.catalog_mut().clear_override(&plan, &field)?.is_some() {
            writeln!(out, "{}", self.tr.t(keys::OVERRIDE_REMOVED))?;
        }
        Ok(())
    }

    pub fn write_quote(&self, out: &mut impl Write) -> Result<(), AppError> {
        let quote = self.session.recompute(&self.form);
        let tier = self.session.catalog().tier_or_fallback(&quote.plan_id);
        write!(out, "{}", report::render_quote(&quote, tier, &self.tr))?;
        Ok(())
    }

    pub fn write_comparison(&self, out: &mut impl Write) -> Result<(), AppError> {
        match self.session.compare(&self.form) {
            Ok(quotes) => write!(out, "{}", report::render_comparison(&quotes, &self.tr))?,
            Err(ComparisonError::MonthlyPurchaseRequired(_)) => {
                writeln!(out, "{}", self.tr.t(keys::COMPARE_PURCHASE_REQUIRED))?
            }
        }
        Ok(())
    }

    pub fn write_catalog(&self, out: &mut impl Write) -> Result<(), AppError> {
        write!(
            out,
            "{}",
            report::render_catalog(self.session.catalog(), self.session.selected_plan(), &self.tr)
        )?;
        Ok(())
    }

    /// 대화형 입력 한 줄을 처리한다. 편집 명령 뒤에는 즉시 다시 계산해 출력한다.
    pub fn handle_line(&mut self, line: &str, out: &mut impl Write) -> Result<Flow, AppError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Flow::Continue);
        }
        let (cmd, arg) = match line.split_once(char::is_whitespace) {
            Some((cmd, arg)) => (cmd, arg.trim()),
            None => (line, ""),
        };
        debug!(command = cmd, argument = arg, "interactive input");

        let outcome = match cmd.to_lowercase().as_str() {
            "sair" | "quit" | "exit" => {
                writeln!(out, "{}", self.tr.t(keys::APP_EXIT))?;
                return Ok(Flow::Exit);
            }
            "ajuda" | "help" => {
                writeln!(out, "{}", self.tr.t(keys::INTERACTIVE_HELP))?;
                return Ok(Flow::Continue);
            }
            "planos" | "plans" => {
                self.write_catalog(out)?;
                return Ok(Flow::Continue);
            }
            "comparar" | "compare" => {
                self.write_comparison(out)?;
                return Ok(Flow::Continue);
            }
            "plano" | "plan" => self.select_plan(arg),
            "ajustar" | "set" => self.apply_override(arg),
            "limpar" | "reset" => self.clear_overrides(arg, out),
            other => match other.parse::<FormField>() {
                Ok(field) => {
                    self.form.set(field, arg);
                    Ok(())
                }
                Err(_) => {
                    writeln!(out, "{}", self.tr.t(keys::ERROR_UNKNOWN_COMMAND))?;
                    return Ok(Flow::Continue);
                }
            },
        };

        match outcome {
            Ok(()) => self.write_quote(out)?,
            // 사용자 입력 오류는 세션을 끝내지 않는다.
            Err(AppError::Io(err)) => return Err(AppError::Io(err)),
            Err(err) => writeln!(out, "{} {err}", self.tr.t(keys::ERROR_PREFIX))?,
        }
        Ok(Flow::Continue)
    }

    /// 입력이 끝나거나 종료 명령이 올 때까지 한 줄씩 처리한다.
    pub fn run_interactive(
        &mut self,
        input: impl BufRead,
        mut out: impl Write,
    ) -> Result<(), AppError> {
        writeln!(out, "{}", self.tr.t(keys::INTERACTIVE_HEADING))?;
        writeln!(out, "{}", self.tr.t(keys::INTERACTIVE_HELP))?;
        self.write_quote(&mut out)?;
        for line in input.lines() {
            let line = line?;
            if self.handle_line(&line, &mut out)? == Flow::Exit {
                break;
            }
            write!(out, "{}", self.tr.t(keys::PROMPT_COMMAND))?;
            out.flush()?;
        }
        Ok(())
    }
}

/// 명령줄 인자에 따라 한 번 실행한다.
pub fn run(cli: Cli) -> Result<(), AppError> {
    let mut app = App::load(cli.config, cli.catalog.as_deref(), cli.lang.as_deref())?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Plans => app.write_catalog(&mut out)?,
        Command::Select { plan } => {
            app.select_plan(&plan)?;
            writeln!(out, "{} {plan}", app.tr.t(keys::PLAN_SAVED))?;
        }
        Command::Quote(args) => {
            prepare(&mut app, &args)?;
            app.write_quote(&mut out)?;
        }
        Command::Compare(args) => {
            prepare(&mut app, &args)?;
            app.write_comparison(&mut out)?;
        }
        Command::Interactive => {
            let stdin = io::stdin();
            app.run_interactive(stdin.lock(), out)?;
        }
    }
    Ok(())
}

/// 단발성 명령의 플래그를 세션에 반영한다. `--plan`은 저장하지 않는다.
fn prepare(app: &mut App, args: &FormArgs) -> Result<(), AppError> {
    if let Some(plan) = &args.plan {
        app.session.select_plan(plan)?;
    }
    for raw in &args.overrides {
        app.apply_override(raw)?;
    }
    args.apply(&mut app.form);
    Ok(())
}
