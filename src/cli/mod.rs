use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Result, anyhow};
use clap::{Args, CommandFactory, Parser, Subcommand};
use time::OffsetDateTime;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::config::EffectiveConfig;
use crate::core::VerificationReport;
use crate::engine::{Engine, EngineOptions};
use crate::transport::ReqwestTransport;
use crate::ui::UiConfig;

#[derive(Debug, Parser)]
#[command(
    name = "cropcheck",
    version,
    about = "Check that a crop-disease prediction service is up, send it a sample image, and explain the diagnosis"
)]
pub struct Cli {
    /// Base URL of the prediction service, e.g. http://127.0.0.1:5000
    #[arg(long, global = true)]
    pub url: Option<String>,
    #[arg(long, global = true)]
    pub json: bool,
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,
    #[arg(long, global = true)]
    pub verbose: bool,
    #[arg(long, global = true)]
    pub quiet: bool,
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Content type declared for the uploaded image (default image/jpeg)
    #[arg(long, global = true)]
    pub mime_type: Option<String>,
    #[arg(long, global = true)]
    pub health_timeout: Option<u64>,
    #[arg(long, global = true)]
    pub predict_timeout: Option<u64>,
    /// tracing filter directive, e.g. `debug` or `cropcheck=trace`
    #[arg(long, global = true)]
    pub log_level: Option<String>,
    /// Write a JSON run log under ~/.config/cropcheck/logs
    #[arg(long, global = true)]
    pub save_log: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Probe the service, then submit the image
    Verify(ImageArgs),
    /// Probe the service only
    Health(HealthArgs),
    /// Submit the image without probing first
    Predict(ImageArgs),
    Config(ConfigArgs),
    Completion(CompletionArgs),
}

#[derive(Debug, Args)]
pub struct ImageArgs {
    pub image: PathBuf,
}

#[derive(Debug, Args)]
pub struct HealthArgs {}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[arg(long)]
    pub show: bool,
}

#[derive(Debug, Args)]
pub struct CompletionArgs {
    pub shell: String,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let (home_dir, cfg) = match load_config(&cli) {
        Ok(loaded) => loaded,
        Err(err) => {
            // Still report config errors through tracing, with the CLI-only filter.
            init_tracing(&log_filter(&cli, None));
            return Err(err);
        }
    };
    init_tracing(&log_filter(&cli, Some(&cfg.log.level)));

    let stdout_is_tty = std::io::stdout().is_terminal();
    let ui_cfg = UiConfig {
        color: stdout_is_tty && cfg.ui.color && !cli.no_color,
        quiet: cli.quiet,
    };
    let run_opts = RunOptions {
        json: cli.json,
        save_log: cli.save_log || cfg.log.save_run_log,
        show_progress: !cli.quiet && !cli.json,
    };

    match cli.command {
        Commands::Verify(args) => run_check(&cfg, &ui_cfg, &run_opts, &home_dir, "verify", |e| {
            e.verify(&args.image)
        }),
        Commands::Health(_args) => {
            run_check(&cfg, &ui_cfg, &run_opts, &home_dir, "health", |e| e.health())
        }
        Commands::Predict(args) => run_check(&cfg, &ui_cfg, &run_opts, &home_dir, "predict", |e| {
            e.predict(&args.image)
        }),
        Commands::Config(args) => {
            if args.show {
                if cli.json {
                    let stdout = std::io::stdout();
                    serde_json::to_writer_pretty(stdout.lock(), &cfg)?;
                    println!();
                } else {
                    println!("{}", toml::to_string_pretty(&cfg)?);
                }
            } else if !ui_cfg.quiet {
                eprintln!("config: use `cropcheck config --show`");
            }
            Ok(())
        }
        Commands::Completion(args) => {
            let shell = parse_shell(&args.shell)?;
            let mut cmd = Cli::command();
            let mut out = std::io::stdout().lock();
            clap_complete::generate(shell, &mut cmd, "cropcheck", &mut out);
            Ok(())
        }
    }
}

fn load_config(cli: &Cli) -> Result<(PathBuf, EffectiveConfig)> {
    let home_dir = crate::config::home_dir().map_err(crate::exit::invalid_args_err)?;

    let env_config_path = std::env::var_os("CROPCHECK_CONFIG").map(PathBuf::from);
    let mut cfg = crate::config::load(
        cli.config.as_deref().or(env_config_path.as_deref()),
        &home_dir,
    )
    .map_err(crate::exit::invalid_args_err)?;
    apply_cli_overrides(&mut cfg, cli).map_err(crate::exit::invalid_args_err)?;

    Ok((home_dir, cfg))
}

struct RunOptions {
    json: bool,
    save_log: bool,
    show_progress: bool,
}

fn run_check(
    cfg: &EffectiveConfig,
    ui_cfg: &UiConfig,
    opts: &RunOptions,
    home_dir: &Path,
    command: &str,
    check: impl FnOnce(&Engine) -> VerificationReport,
) -> Result<()> {
    let base_url = cfg.service.base_url.clone().ok_or_else(|| {
        crate::exit::invalid_args(
            "no service URL configured: pass --url, set CROPCHECK_BASE_URL, or set service.base_url in the config file",
        )
    })?;

    let engine = Engine::new(
        EngineOptions {
            base_url,
            health_timeout: Duration::from_secs(cfg.service.health_timeout_secs),
            predict_timeout: Duration::from_secs(cfg.service.predict_timeout_secs),
            mime_type: cfg.upload.mime_type.clone(),
            show_progress: opts.show_progress,
        },
        Box::new(ReqwestTransport::new()?),
    );

    let started_at = OffsetDateTime::now_utc();
    let report = check(&engine);
    let finished_at = OffsetDateTime::now_utc();

    if opts.json {
        write_json(&report)?;
    } else {
        crate::ui::print_report(&report, ui_cfg);
    }

    if opts.save_log {
        match crate::logs::write_run_log(home_dir, command, started_at, finished_at, &report) {
            Ok(path) => {
                let shown = crate::logs::display_path(&path, home_dir);
                if opts.json {
                    eprintln!("run log: {shown}");
                } else if !ui_cfg.quiet {
                    println!("\nRun log: {shown}");
                }
            }
            Err(err) => warn!(error = ?err, "failed to write run log"),
        }
    }

    match &report.failure {
        Some(failure) => Err(crate::exit::from_failure(failure)),
        None => Ok(()),
    }
}

fn apply_cli_overrides(cfg: &mut EffectiveConfig, cli: &Cli) -> Result<()> {
    if let Some(url) = &cli.url {
        let url = url.trim();
        crate::config::validate_base_url(url)?;
        cfg.service.base_url = Some(url.to_string());
    }
    if let Some(mime_type) = &cli.mime_type {
        let mime_type = mime_type.trim();
        crate::config::validate_mime_type(mime_type)?;
        cfg.upload.mime_type = mime_type.to_string();
    }
    if let Some(secs) = cli.health_timeout {
        if secs == 0 {
            return Err(anyhow!("--health-timeout must be greater than 0"));
        }
        cfg.service.health_timeout_secs = secs;
    }
    if let Some(secs) = cli.predict_timeout {
        if secs == 0 {
            return Err(anyhow!("--predict-timeout must be greater than 0"));
        }
        cfg.service.predict_timeout_secs = secs;
    }
    Ok(())
}

fn log_filter(cli: &Cli, config_level: Option<&str>) -> String {
    if let Some(level) = &cli.log_level {
        return level.clone();
    }
    if cli.verbose {
        return "warn,cropcheck=debug".to_string();
    }
    if cli.quiet {
        return "error".to_string();
    }
    config_level.unwrap_or(crate::config::DEFAULT_LOG_LEVEL).to_string()
}

fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter)
        .unwrap_or_else(|_| EnvFilter::new(crate::config::DEFAULT_LOG_LEVEL));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .try_init();
}

fn write_json(report: &VerificationReport) -> Result<()> {
    use std::io::Write;

    let buf = serde_json::to_vec_pretty(report)?;

    let mut stdout = std::io::stdout().lock();
    match stdout.write_all(&buf) {
        Ok(()) => {}
        Err(err) if err.kind() == std::io::ErrorKind::BrokenPipe => return Ok(()),
        Err(err) => return Err(err.into()),
    }
    match stdout.write_all(b"\n") {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
        Err(err) => Err(err.into()),
    }
}

fn parse_shell(s: &str) -> Result<clap_complete::Shell> {
    let s = s.trim().to_ascii_lowercase();
    match s.as_str() {
        "bash" => Ok(clap_complete::Shell::Bash),
        "zsh" => Ok(clap_complete::Shell::Zsh),
        "fish" => Ok(clap_complete::Shell::Fish),
        other => Err(crate::exit::invalid_args(format!(
            "unsupported shell: {other} (use bash|zsh|fish)"
        ))),
    }
}
