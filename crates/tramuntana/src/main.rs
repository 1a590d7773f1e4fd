// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Read as _;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::error;

use tramuntana::config::Config;
use tramuntana::hook::model::HookInput;
use tramuntana::mux_client::TmuxClient;

#[derive(Parser)]
#[command(name = "tramuntana", version, about = "Bridge daemon: a group chat as a remote control for tmux-hosted agent sessions.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bridge daemon.
    Serve(Config),
    /// Run the Session Hook, or install it into an agent's settings file.
    Hook(HookArgs),
    /// Print version information.
    Version,
}

#[derive(clap::Args)]
struct HookArgs {
    /// Install the hook into the settings file at this path instead of
    /// running it against stdin.
    #[arg(long)]
    install: Option<PathBuf>,
}

/// Scan raw argv for `--config path`/`--config=path` and apply it before
/// `Cli::parse()` runs, since env-sourced `Config` fields are resolved at
/// parse time and a dotenv-style file has to land in the environment
/// ahead of that (spec §6 `serve --config path`).
fn early_config_path() -> Option<PathBuf> {
    let args: Vec<String> = std::env::args().collect();
    for (i, arg) in args.iter().enumerate() {
        if arg == "--config" {
            return args.get(i + 1).map(PathBuf::from);
        }
        if let Some(v) = arg.strip_prefix("--config=") {
            return Some(PathBuf::from(v));
        }
    }
    None
}

#[tokio::main]
async fn main() {
    if let Some(path) = early_config_path() {
        if let Err(e) = Config::apply_config_file(&path) {
            eprintln!("error: {e}");
            std::process::exit(2);
        }
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(config) => {
            if let Err(e) = tramuntana::daemon::run(config).await {
                error!("fatal: {e:#}");
                std::process::exit(1);
            }
        }
        Commands::Hook(args) => std::process::exit(run_hook(args).await),
        Commands::Version => {
            println!("tramuntana {}", env!("CARGO_PKG_VERSION"));
        }
    }
}

async fn run_hook(args: HookArgs) -> i32 {
    if let Some(settings_path) = args.install {
        let hook_binary = std::env::current_exe()
            .ok()
            .and_then(|p| p.to_str().map(str::to_string))
            .unwrap_or_else(|| "tramuntana".to_string());
        return match tramuntana::hook::install::install(&settings_path, &hook_binary) {
            Ok(true) => {
                println!("installed hook into {}", settings_path.display());
                0
            }
            Ok(false) => {
                println!("hook already installed in {}", settings_path.display());
                0
            }
            Err(e) => {
                eprintln!("error: {e}");
                1
            }
        };
    }

    let mut input_text = String::new();
    if let Err(e) = std::io::stdin().read_to_string(&mut input_text) {
        eprintln!("error: reading stdin: {e}");
        return 1;
    }
    let input: HookInput = match serde_json::from_str(&input_text) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("error: parsing hook input: {e}");
            return 1;
        }
    };

    let pane_id = std::env::var(tramuntana::hook::PANE_ENV_VAR).ok();
    let data_dir = tramuntana::hook::resolve_data_dir();
    let resolver = TmuxClient::new(None);

    match tramuntana::hook::run(&resolver, input, pane_id, data_dir).await {
        Ok(_) => 0,
        Err(e) => {
            eprintln!("error: {e}");
            1
        }
    }
}
