use anyhow::Result;
use clap::Parser;
use importvet::cli::{Cli, Commands};
use importvet::config::{self, ValidationConfig, CONFIG_FILE_NAME};
use importvet::errors::reporting::{ConsoleSink, ErrorSink};
use importvet::io::output::{self, OutputFormat};
use importvet::validator::ImportValidator;
use std::path::PathBuf;

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            path,
            format,
            output,
            config: config_path,
            ignore,
            valid_packages,
            jobs,
            no_parallel,
            fail_on_cycles,
            verbosity,
        } => {
            init_logging(verbosity);
            handle_analyze(AnalyzeOptions {
                path,
                format: format.into(),
                output,
                config_path,
                ignore,
                valid_packages,
                jobs,
                no_parallel,
                fail_on_cycles,
            })
        }
        Commands::Init { force } => {
            init_logging(0);
            init_config(force)
        }
    }
}

fn init_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

struct AnalyzeOptions {
    path: PathBuf,
    format: OutputFormat,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
    ignore: Option<Vec<String>>,
    valid_packages: Option<Vec<String>>,
    jobs: Option<usize>,
    no_parallel: bool,
    fail_on_cycles: bool,
}

fn handle_analyze(options: AnalyzeOptions) -> Result<()> {
    let config = build_config(&options)?;

    let jobs = if options.no_parallel {
        1
    } else {
        options.jobs.unwrap_or_else(num_cpus::get)
    };
    // A progress bar would interleave with piped or file output.
    let show_progress = options.format == OutputFormat::Terminal && options.output.is_none();

    let validator = ImportValidator::new(&options.path, config)
        .with_jobs(jobs)
        .with_progress(show_progress);
    let results = validator.validate_all()?;

    match &options.output {
        Some(path) => {
            let content = output::format_results_to_string(&results, options.format)?;
            importvet::io::write_file(path, &content)?;
            // Findings still surface on stderr when the report goes to a file.
            ConsoleSink::new().report_all(&results.errors);
            log::info!("wrote results to {}", path.display());
        }
        None => {
            let mut writer = output::create_writer(options.format);
            writer.write_results(&results)?;
        }
    }

    if options.fail_on_cycles && results.has_cycles() {
        log::error!(
            "{} circular imports found",
            results.stats.circular_refs_count
        );
        std::process::exit(2);
    }

    Ok(())
}

fn build_config(options: &AnalyzeOptions) -> Result<ValidationConfig> {
    let mut config = match &options.config_path {
        Some(path) => config::load_config_file(path)?,
        None => config::load_config(&options.path),
    };

    if let Some(ignore) = &options.ignore {
        config.ignore_patterns = ignore.clone();
    }
    if let Some(packages) = &options.valid_packages {
        config.valid_packages.extend(packages.iter().cloned());
    }
    Ok(config)
}

fn init_config(force: bool) -> Result<()> {
    let target = PathBuf::from(CONFIG_FILE_NAME);
    if target.exists() && !force {
        anyhow::bail!("{CONFIG_FILE_NAME} already exists (use --force to overwrite)");
    }

    let rendered = ValidationConfig::default().to_toml()?;
    importvet::io::write_file(&target, &rendered)?;
    println!("Created {CONFIG_FILE_NAME}");
    Ok(())
}
