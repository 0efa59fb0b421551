use clap::Parser;
use flowsmith::prelude::*;
use std::path::PathBuf;
use std::time::Instant;

/// Translates a data-prep flow into SQL models with YAML metadata
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the flow definition, or a directory containing a `flow` file
    #[arg(short, long)]
    flow_file: PathBuf,

    /// SQL dialect of the generated models: duckdb, postgre or snowflake
    #[arg(short, long, default_value = "duckdb")]
    dialect: String,

    /// Name of the source the input tables belong to
    #[arg(short, long, default_value = "SOURCE")]
    source_name: String,

    /// Comma-separated tags added to every model
    #[arg(short, long, default_value = "")]
    tags: String,

    /// Prefix prepended to every model name
    #[arg(short, long, default_value = "")]
    prefix: String,

    /// Directory the models are written to
    #[arg(short, long, default_value = "outputs")]
    out_dir: PathBuf,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = build_config(&cli)
        .unwrap_or_else(|e| exit_with_error(&format!("Invalid configuration: {}", e)));

    let start = Instant::now();
    let compilation = run(&config, &cli.out_dir)
        .unwrap_or_else(|e| exit_with_error(&format!("Conversion failed: {}", e)));
    let duration = start.elapsed();

    println!("\n--- Conversion Report ---");
    println!("{}", compilation.report);
    println!("-----------------------------");
    println!("Models written:       {}", compilation.models.len());
    println!("Output directory:     {}", cli.out_dir.display());
    println!("Total Execution:      {:?}", duration);
}

fn build_config(cli: &Cli) -> std::result::Result<RunConfig, ConfigError> {
    RunConfig::new(cli.flow_file.clone())
        .with_dialect(&cli.dialect)?
        .with_source_name(&cli.source_name)?
        .with_tags(&cli.tags)?
        .with_prefix(&cli.prefix)
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
