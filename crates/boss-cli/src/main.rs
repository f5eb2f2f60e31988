use std::env;
use std::process::ExitCode;

use boss_bootstrap::{BootstrapConfig, BootstrapEngine};

mod parser;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("BOSS_LOG"))
        .init();

    let args: Vec<String> = env::args().collect();
    let (engine_path, expression_text) = match parse_args(&args[1..]) {
        Ok(parsed) => parsed,
        Err(message) => {
            eprintln!("error: {message}");
            eprintln!("usage: boss [--engine <path>] <expression>");
            return ExitCode::FAILURE;
        }
    };

    let expression = match parser::parse(&expression_text) {
        Ok(expr) => expr,
        Err(message) => {
            eprintln!("error parsing expression: {message}");
            return ExitCode::FAILURE;
        }
    };

    let config = BootstrapConfig {
        default_engine: engine_path,
    };
    let mut engine = BootstrapEngine::new(config);
    match engine.evaluate(expression) {
        Ok(result) => {
            println!("{result}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn parse_args(args: &[String]) -> Result<(Option<String>, String), String> {
    if args.first().map(String::as_str) == Some("--engine") {
        let path = args.get(1).ok_or("--engine requires a path argument")?.clone();
        let expression = args.get(2).ok_or("missing expression argument")?.clone();
        Ok((Some(path), expression))
    } else {
        let expression = args.first().ok_or("missing expression argument")?.clone();
        Ok((None, expression))
    }
}
