use std::process::ExitCode;

use clap::Parser;
use kenit_calculator::app::{self, Cli};
use kenit_calculator::i18n::{keys, resolve_language, Translator};
use tracing_subscriber::EnvFilter;

/// 프로그램의 엔트리 포인트. 로깅을 설정한 뒤 CLI 명령을 실행한다.
fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,kenit_calculator=info")),
        )
        .init();

    let cli = Cli::parse();
    let tr = Translator::new(resolve_language(cli.lang.as_deref(), None));
    match app::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err}", tr.t(keys::ERROR_PREFIX));
            ExitCode::FAILURE
        }
    }
}
