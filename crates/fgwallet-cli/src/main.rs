//! FGWallet CLI: create, back up and restore a wallet from the terminal
//!
//! # Usage
//!
//! ```bash
//! fgwallet create
//! fgwallet backup wallet-backup.txt
//! fgwallet restore wallet-backup.txt
//! fgwallet --config fgwallet.toml balance
//! ```
//!
//! Passwords are taken from `FGWALLET_PASSWORD`, or else the first line
//! of stdin.

mod config;

use anyhow::{Context, Result};
use fgwallet_core::keys::generate_mnemonic;
use fgwallet_core::memory::disable_core_dumps;
use fgwallet_core::{BalanceWarning, KdfParams, Password};
use fgwallet_restore::{FileSource, RestoreErrorKind, WalletApplication};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use zeroize::Zeroizing;

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Create,
    Restore { file: PathBuf },
    Backup { file: PathBuf },
    Balance,
    Xpub,
    Reset,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Create => "create",
            Command::Restore { .. } => "restore",
            Command::Backup { .. } => "backup",
            Command::Balance => "balance",
            Command::Xpub => "xpub",
            Command::Reset => "reset",
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Invocation {
    Help,
    Version,
    Run {
        config_path: PathBuf,
        validate_only: bool,
        command: Option<Command>,
    },
}

fn main() -> Result<()> {
    // Keep decrypted keys out of core files
    disable_core_dumps();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (config_path, validate_only, command) = match parse_args(&args)? {
        Invocation::Help => {
            print_help();
            return Ok(());
        }
        Invocation::Version => {
            println!("fgwallet {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Invocation::Run {
            config_path,
            validate_only,
            command,
        } => (config_path, validate_only, command),
    };

    let mut cli_config = config::CliConfig::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    cli_config.apply_env_overrides();
    cli_config
        .validate()
        .context("Configuration validation failed")?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cli_config.log.level))
        .init();
    log::info!(
        "network {}, data dir {}",
        cli_config.wallet.network,
        cli_config.wallet.data_dir.display()
    );

    if validate_only {
        println!("Configuration is valid.");
        println!("  Network:          {}", cli_config.wallet.network);
        println!("  Data dir:         {}", cli_config.wallet.data_dir.display());
        println!("  Backup max chars: {}", cli_config.wallet.backup_max_chars);
        println!("  Log level:        {}", cli_config.log.level);
        return Ok(());
    }

    let Some(command) = command else {
        print_help();
        anyhow::bail!("No command given");
    };

    let app = WalletApplication::open(cli_config.app_settings()?)
        .with_context(|| format!("Failed to open wallet in {}", cli_config.wallet.data_dir.display()))?;

    let name = command.name();
    let result = run(&app, command);
    if let Err(e) = &result {
        log::error!("{} failed: {:#}", name, e);
    }
    result
}

fn run(app: &WalletApplication, command: Command) -> Result<()> {
    match command {
        Command::Create => create(app),
        Command::Restore { file } => restore(app, file),
        Command::Backup { file } => backup(app, file),
        Command::Balance => balance(app),
        Command::Xpub => {
            match app.extended_public_key() {
                Some(uri) => println!("{}", uri),
                None => println!("This wallet has no extended public key."),
            }
            Ok(())
        }
        Command::Reset => {
            app.initiate_reset().context("Blockchain reset failed")?;
            println!("Blockchain reset. The wallet will be rebuilt from the start of the chain.");
            Ok(())
        }
    }
}

fn parse_args(args: &[String]) -> Result<Invocation> {
    let mut config_path = PathBuf::from("fgwallet.toml");
    let mut validate_only = false;
    let mut positional: Vec<&str> = Vec::new();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                i += 1;
                if i < args.len() {
                    config_path = PathBuf::from(&args[i]);
                } else {
                    anyhow::bail!("--config requires a path argument");
                }
            }
            "--validate" => validate_only = true,
            "--help" | "-h" => return Ok(Invocation::Help),
            "--version" | "-V" => return Ok(Invocation::Version),
            other if other.starts_with('-') => {
                anyhow::bail!("Unknown argument: {}", other);
            }
            other => positional.push(other),
        }
        i += 1;
    }

    let file_arg = |name: &str| -> Result<PathBuf> {
        match positional.get(1..) {
            Some([file]) => Ok(PathBuf::from(file)),
            _ => anyhow::bail!("{} requires exactly one file argument", name),
        }
    };

    let command = match positional.first().copied() {
        None => None,
        Some("create") => Some(Command::Create),
        Some("restore") => Some(Command::Restore {
            file: file_arg("restore")?,
        }),
        Some("backup") => Some(Command::Backup {
            file: file_arg("backup")?,
        }),
        Some("balance") => Some(Command::Balance),
        Some("xpub") => Some(Command::Xpub),
        Some("reset") => Some(Command::Reset),
        Some(other) => anyhow::bail!("Unknown command: {}", other),
    };

    if let Some(cmd) = &command {
        let takes_file = matches!(cmd, Command::Restore { .. } | Command::Backup { .. });
        if !takes_file && positional.len() > 1 {
            anyhow::bail!("Unexpected argument: {}", positional[1]);
        }
    }

    Ok(Invocation::Run {
        config_path,
        validate_only,
        command,
    })
}

/// `FGWALLET_PASSWORD`, or the first line of stdin.
fn read_password(prompt: &str) -> Result<Password> {
    if let Ok(password) = std::env::var("FGWALLET_PASSWORD") {
        return Ok(Password::from(password));
    }

    eprint!("{}: ", prompt);
    io::stderr().flush().ok();

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password from stdin")?;
    Ok(Password::from(line))
}

fn create(app: &WalletApplication) -> Result<()> {
    if app.replace_warning() {
        anyhow::bail!("The current wallet holds coins; refusing to replace it");
    }

    let mnemonic = generate_mnemonic()?;
    let seed = Zeroizing::new(mnemonic.to_seed(""));
    let wallet = app.create_wallet(&seed[..])?;

    println!("New wallet created. Write down these words and keep them safe:");
    println!();
    println!("    {}", mnemonic);
    println!();
    if let Some(account) = &wallet.account {
        println!("Account xpub: {}", account.xpub);
    }
    println!("Remember to make an encrypted backup with `fgwallet backup <file>`.");
    Ok(())
}

/// Shown before a restore that would replace a wallet still holding coins.
fn replace_notice(app: &WalletApplication) -> Option<&'static str> {
    app.replace_warning().then_some(
        "Warning: the current wallet still holds coins and will be replaced. \
         Make sure you have its backup.",
    )
}

fn restore(app: &WalletApplication, file: PathBuf) -> Result<()> {
    if let Some(notice) = replace_notice(app) {
        log::warn!("restoring over a wallet that holds coins");
        eprintln!("{}", notice);
    }

    let password = read_password("Backup password")?;
    let source = FileSource::new(file);

    match app.handle_restore(&source, password) {
        Ok(restored) => {
            println!("Wallet restored from {}.", source.path().display());
            if restored.encrypted {
                println!("The restored keys are protected by a spending password.");
            }
            if restored.replaced_had_coins {
                println!("The previous wallet held coins; keep its backup.");
            }
            println!("Rescanning the blockchain, balances will appear once it catches up.");
            Ok(())
        }
        Err(e) => {
            log::error!("restore from {} failed: {}", source.path().display(), e);
            let hint = match e.kind() {
                RestoreErrorKind::Io => "check that the file exists and is readable",
                RestoreErrorKind::Decryption => "check the password",
                RestoreErrorKind::Format => "this does not look like a wallet backup",
            };
            eprintln!("Restore failed: {} ({}).", e, hint);
            if e.is_retryable() {
                eprintln!("Nothing was changed. Try again, or keep using the current wallet.");
            }
            std::process::exit(1);
        }
    }
}

fn backup(app: &WalletApplication, file: PathBuf) -> Result<()> {
    let password = read_password("New backup password")?;
    app.write_backup(&file, &password, KdfParams::default())
        .with_context(|| format!("Failed to write backup to {}", file.display()))?;
    println!("Encrypted backup written to {}.", file.display());
    Ok(())
}

fn balance(app: &WalletApplication) -> Result<()> {
    let view = app.balance_view().context("Failed to read chain state")?;

    if let Some(progress) = view.progress {
        println!("Balance hidden while syncing: {}", progress);
        return Ok(());
    }
    if let Some(amount) = view.balance {
        println!("Balance: {}", amount);
    }
    if view.warning == Some(BalanceWarning::TooMuch) {
        println!("Warning: this is more than a hot wallet should hold.");
    }
    if app.preferences().remind_backup() {
        println!("Reminder: this wallet has not been backed up yet.");
    }
    Ok(())
}

fn print_help() {
    println!(
        r#"FGWallet: encrypted wallet backup and restore

USAGE:
    fgwallet [OPTIONS] <COMMAND>

COMMANDS:
    create              Create a new wallet from a fresh mnemonic
    restore <FILE>      Restore the wallet from an encrypted backup
                        (replaces the current wallet, warning if it holds coins)
    backup <FILE>       Write an encrypted backup of the wallet
    balance             Show the wallet balance
    xpub                Print the account extended public key
    reset               Replay the blockchain from the start

OPTIONS:
    -c, --config <PATH>   Config file path (default: fgwallet.toml)
    --validate            Validate config and exit
    -h, --help            Show this help message
    -V, --version         Show version

ENVIRONMENT VARIABLES:
    FGWALLET_PASSWORD          Backup password (otherwise read from stdin)
    FGWALLET_DATA_DIR          Data directory path
    FGWALLET_NETWORK           Bitcoin network (bitcoin/testnet/signet/regtest)
    FGWALLET_BACKUP_MAX_CHARS  Largest backup accepted, in characters
    FGWALLET_LOG_LEVEL         Log level (error/warn/info/debug/trace)
"#
    );
}
