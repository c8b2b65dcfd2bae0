use clap::Parser;
use wsrun_cli::commands::{cli, exec, exit_code_for_error, plan, prepare};
use wsrun_cli::logging::init_tracing;
use wsrun_core::api::CliError;

#[tokio::main]
async fn main() {
    let exit = match real_main().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("wsrun: {e}");
            exit_code_for_error(&e)
        }
    };

    std::process::exit(exit);
}

async fn real_main() -> Result<i32, CliError> {
    let args = cli::Args::parse();

    let (root, cfg) = prepare(&args)?;
    init_tracing(&cfg.logging, &root).map_err(CliError::Command)?;
    tracing::debug!(root = %root.display(), "workspace root");

    match args.command {
        cli::Commands::Exec(exec_args) => {
            exec::run_exec(&root, &cfg, args.output_format, args.ascii, exec_args).await
        }
        cli::Commands::Plan(plan_args) => plan::run_plan(&root, &cfg, args.output_format, plan_args),
    }
}
