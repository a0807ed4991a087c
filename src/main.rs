//! # Kisan Sathi CLI (`kisan`)
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `kisan init` | Create the local store and record the schema version |
//! | `kisan serve` | Run the `/tip` and `/plan` proxy |
//! | `kisan tip ask` | Ask for one tip (`--save` to cache it) |
//! | `kisan tip add <text>` | Cache a tip written by hand |
//! | `kisan tip list` / `count` / `clear` | Inspect or reset the tip cache |
//! | `kisan plan show` | Print today's plan, if any |
//! | `kisan plan generate` | Generate today's plan unless one exists |
//! | `kisan plan speak` | Read the plan aloud |
//! | `kisan plan watch` | Keep the plan card on screen, refreshing every 5 minutes |

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use kisan_sathi::app::App;
use kisan_sathi::config;
use kisan_sathi::{migrate, plan_cmd, server, tip_cmd};

/// Kisan Sathi: daily farming tips and tomorrow plans.
#[derive(Parser)]
#[command(name = "kisan", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/kisan.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the local store. Safe to run more than once.
    Init,

    /// Run the AI proxy server on `[server].bind`.
    Serve,

    /// Ask for tips and manage the tip cache.
    Tip {
        #[command(subcommand)]
        action: TipAction,
    },

    /// Generate, show, speak, or watch tomorrow's plan.
    Plan {
        #[command(subcommand)]
        action: PlanAction,
    },
}

/// Farm profile overrides; unset fields fall back to `[farm]`.
#[derive(Args, Clone, Default)]
struct ProfileArgs {
    #[arg(long)]
    crop: Option<String>,
    #[arg(long)]
    stage: Option<String>,
    #[arg(long)]
    location: Option<String>,
}

#[derive(Subcommand)]
enum TipAction {
    /// Ask the tip endpoint for one tip.
    Ask {
        #[command(flatten)]
        profile: ProfileArgs,
        /// Append the tip to the local cache.
        #[arg(long)]
        save: bool,
    },
    /// Cache a tip written by hand.
    Add {
        text: String,
        #[command(flatten)]
        profile: ProfileArgs,
    },
    /// Print cached tips, oldest first.
    List {
        /// Only the newest N tips.
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print the number of cached tips.
    Count,
    /// Remove every cached tip.
    Clear,
}

#[derive(Subcommand)]
enum PlanAction {
    /// Print today's plan and whether it is night-time.
    Show,
    /// Generate today's plan unless one is already stored.
    Generate {
        #[command(flatten)]
        profile: ProfileArgs,
    },
    /// Read the plan aloud; Ctrl-C stops playback.
    Speak {
        #[command(flatten)]
        profile: ProfileArgs,
    },
    /// Keep the plan card on screen until Ctrl-C.
    Watch {
        #[command(flatten)]
        profile: ProfileArgs,
        /// Generate once when the card shows with no plan.
        #[arg(long)]
        generate: bool,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("kisan_sathi=info,kisan_sathi_core=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Store initialized at {}.", cfg.db.path.display());
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Tip { action } => {
            let app = App::open(&cfg).await?;
            match action {
                TipAction::Ask { profile, save } => {
                    let profile =
                        cfg.farm
                            .resolve_partial(profile.crop, profile.stage, profile.location);
                    tip_cmd::run_tip_ask(&app, &profile, save).await?;
                }
                TipAction::Add { text, profile } => {
                    let profile =
                        cfg.farm
                            .resolve_partial(profile.crop, profile.stage, profile.location);
                    tip_cmd::run_tip_add(&app, &profile, &text).await?;
                }
                TipAction::List { limit } => tip_cmd::run_tip_list(&app, limit).await?,
                TipAction::Count => tip_cmd::run_tip_count(&app).await?,
                TipAction::Clear => tip_cmd::run_tip_clear(&app).await?,
            }
        }
        Commands::Plan { action } => {
            let app = App::open(&cfg).await?;
            match action {
                PlanAction::Show => plan_cmd::run_plan_show(&app).await?,
                PlanAction::Generate { profile } => {
                    let profile = cfg
                        .farm
                        .resolve(profile.crop, profile.stage, profile.location)?;
                    plan_cmd::run_plan_generate(&app, &profile).await?;
                }
                PlanAction::Speak { profile } => {
                    let profile = cfg
                        .farm
                        .resolve(profile.crop, profile.stage, profile.location)?;
                    plan_cmd::run_plan_speak(&app, &profile).await?;
                }
                PlanAction::Watch { profile, generate } => {
                    let profile = cfg
                        .farm
                        .resolve_partial(profile.crop, profile.stage, profile.location);
                    if generate && (profile.crop.is_empty() || profile.stage.is_empty()) {
                        anyhow::bail!("--generate needs a crop and stage (flags or [farm])");
                    }
                    plan_cmd::run_plan_watch(&app, &profile, generate).await?;
                }
            }
        }
    }

    Ok(())
}
