// src/main.rs

use runwatch::{cli, logging, print_config, run};

#[tokio::main]
async fn main() {
    match run_main().await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            eprintln!("runwatch error: {err:?}");
            std::process::exit(1);
        }
    }
}

/// Returns whether the wrapped command succeeded.
async fn run_main() -> anyhow::Result<bool> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;

    if args.print_config {
        print_config(&args)?;
        return Ok(true);
    }

    let result = run(args).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(result.is_success())
}
