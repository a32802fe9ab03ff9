use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use vault_site::config::{self, SiteConfig};
use vault_site::styles::{FontProbe, NoFontProbe, WebFontProbe};
use vault_site::vault::FsVault;
use vault_site::{generate, output};

#[derive(Parser)]
#[command(name = "vault-site")]
#[command(about = "Publish a vault of linked markdown notes as a static HTML site")]
#[command(long_about = "\
Publish a vault of linked markdown notes as a static HTML site

Every note becomes one page with the vault's folder tree as a sidebar,
breadcrumbs and working internal links. Other files are copied as-is.

  vault/
  ├── .vault-site.toml           # Settings (optional, hidden, never published)
  ├── .obsidian/appearance.json  # Accent colour, font, theme (optional)
  ├── index.md                   # → dist/index.html
  ├── notes/
  │   ├── Alpha.md               # → dist/notes/Alpha.html
  │   └── diagram.png            # → dist/notes/diagram.png
  └── journal/                   # Left out while locked and privacy is on

The output folder, and every output folder used before, is never published.

Run 'vault-site gen-config' to print a documented .vault-site.toml.")]
#[command(version)]
struct Cli {
    /// Vault directory
    #[arg(long, default_value = ".", global = true)]
    vault: PathBuf,

    /// Output directory, relative to the vault (saved as the new output_dir)
    #[arg(long, global = true)]
    output: Option<String>,

    /// Never contact the web font service
    #[arg(long, global = true)]
    offline: bool,

    /// Log progress details to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate the site
    Build,
    /// Show what would be published without writing anything
    Check,
    /// Keep a folder out of the site while private folders are enabled
    Lock {
        /// Vault-relative folder path
        folder: String,
    },
    /// Publish a previously locked folder again
    Unlock {
        /// Vault-relative folder path
        folder: String,
    },
    /// Print a stock .vault-site.toml with all options documented
    GenConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Returns `Ok(false)` when the command finished but something was skipped.
fn run(cli: Cli) -> Result<bool, Box<dyn std::error::Error>> {
    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(true);
    }

    let vault = FsVault::open(&cli.vault)?;
    let mut site_config = load_site_config(&cli)?;

    match cli.command {
        Command::Build => {
            if cli.output.is_some() {
                config::save_config(&site_config, vault.root())?;
            }
            let probe: Box<dyn FontProbe> = if cli.offline || !site_config.web_fonts {
                Box::new(NoFontProbe)
            } else {
                Box::new(WebFontProbe::default())
            };

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = generate::generate(&vault, &mut site_config, probe.as_ref(), Some(tx));
            // The sender is gone either way, so the printer drains and stops
            if printer.join().is_err() {
                eprintln!("warning: progress printer panicked");
            }
            let report = result?;
            output::print_report(&report);
            Ok(report.is_clean())
        }
        Command::Check => {
            let (nav, documents, assets) = generate::plan(&vault, &site_config)?;
            output::print_check_output(&nav, documents, assets, &site_config);
            Ok(true)
        }
        Command::Lock { folder } => {
            if site_config.lock_folder(&folder)? {
                config::save_config(&site_config, vault.root())?;
                println!("Locked {}", config::normalize_folder(&folder));
            } else {
                println!("{} is already locked", config::normalize_folder(&folder));
            }
            if !site_config.allow_private_folders {
                println!("Note: allow_private_folders is off, locked folders are still published");
            }
            Ok(true)
        }
        Command::Unlock { folder } => {
            if site_config.unlock_folder(&folder)? {
                config::save_config(&site_config, vault.root())?;
                println!("Unlocked {}", config::normalize_folder(&folder));
            } else {
                println!("{} was not locked", config::normalize_folder(&folder));
            }
            Ok(true)
        }
        Command::GenConfig => Ok(true),
    }
}

/// Load the vault's settings and apply command-line overrides.
fn load_site_config(cli: &Cli) -> Result<SiteConfig, config::ConfigError> {
    let mut site_config = config::load_config(&cli.vault)?;
    if let Some(dir) = &cli.output {
        site_config.output_dir = dir.clone();
        site_config.normalize();
        site_config.validate()?;
    }
    Ok(site_config)
}
