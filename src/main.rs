//! Secret Vault - seal and unseal secrets into versioned envelope files.

use clap::{Parser, Subcommand};
use secret_vault::store::{read_envelope, write_envelope, write_secret};
use secret_vault::{Result, Vault, VaultConfig};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use zeroize::Zeroizing;

#[derive(Parser)]
#[command(name = "secret-vault")]
#[command(author, version, about, long_about = None)]
#[command(
    about = "Seal secrets into versioned, passphrase-protected envelopes",
    long_about = "Encrypts small secrets (seed phrases, keys, tokens) with Argon2id and a versioned AEAD. Envelopes from every released cipher version remain readable."
)]
struct Cli {
    /// Argon2id memory cost in KiB for new seals
    #[arg(long, global = true, default_value_t = secret_vault::config::argon2_params::MEMORY_COST)]
    memory_kib: u32,

    /// Argon2id iterations for new seals
    #[arg(long, global = true, default_value_t = secret_vault::config::argon2_params::TIME_COST)]
    iterations: u32,

    /// Argon2id parallelism for new seals
    #[arg(long, global = true, default_value_t = secret_vault::config::argon2_params::PARALLELISM)]
    parallelism: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seal a secret into a new envelope file
    Seal {
        /// Envelope file to create
        envelope: PathBuf,

        /// File containing the secret
        #[arg(long, conflicts_with = "data")]
        input: Option<PathBuf>,

        /// Secret given on the command line
        #[arg(long, conflicts_with = "input")]
        data: Option<String>,

        /// Write the envelope as hex text instead of binary
        #[arg(long)]
        hex: bool,
    },

    /// Unseal an envelope file
    Unseal {
        /// Envelope file to read
        envelope: PathBuf,

        /// Output file (default: stdout)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Show envelope metadata without unsealing
    Inspect {
        /// Envelope file to read
        envelope: PathBuf,
    },

    /// Re-seal an envelope under the newest cipher version
    Migrate {
        /// Envelope file to rewrite
        envelope: PathBuf,
    },

    /// Change the passphrase of an envelope
    Passwd {
        /// Envelope file to rewrite
        envelope: PathBuf,
    },

    /// List supported cipher versions
    Versions,
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        debug!(error = %e, "command failed");
        eprintln!("Error: {}", e.user_message());
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let vault = Vault::new(VaultConfig::new(
        cli.memory_kib,
        cli.iterations,
        cli.parallelism,
    ))?;

    match cli.command {
        Commands::Seal {
            envelope,
            input,
            data,
            hex,
        } => cmd_seal(&vault, &envelope, input, data, hex),

        Commands::Unseal { envelope, output } => cmd_unseal(&vault, &envelope, output),

        Commands::Inspect { envelope } => cmd_inspect(&vault, &envelope),

        Commands::Migrate { envelope } => cmd_migrate(&vault, &envelope),

        Commands::Passwd { envelope } => cmd_passwd(&vault, &envelope),

        Commands::Versions => cmd_versions(&vault),
    }
}

fn prompt_password(prompt: &str) -> Result<Zeroizing<String>> {
    Ok(Zeroizing::new(rpassword::prompt_password(prompt)?))
}

fn prompt_new_password() -> Result<Zeroizing<String>> {
    let password = prompt_password("New passphrase: ")?;
    let confirm = prompt_password("Confirm passphrase: ")?;

    if *password != *confirm {
        eprintln!("Passphrases do not match");
        std::process::exit(1);
    }
    Ok(password)
}

fn cmd_seal(
    vault: &Vault,
    path: &Path,
    input: Option<PathBuf>,
    data: Option<String>,
    hex: bool,
) -> Result<()> {
    let secret = match (input, data) {
        (Some(path), None) => Zeroizing::new(std::fs::read_to_string(&path)?),
        (None, Some(s)) => Zeroizing::new(s),
        (None, None) => {
            // Read from stdin
            let mut buffer = Zeroizing::new(String::new());
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
        (Some(_), Some(_)) => unreachable!(),
    };

    let password = prompt_new_password()?;
    let envelope = vault.seal(&secret, &password)?;
    write_envelope(path, &envelope, hex)?;

    println!(
        "Sealed secret into {} ({})",
        path.display(),
        envelope.version
    );

    Ok(())
}

fn cmd_unseal(vault: &Vault, path: &Path, output: Option<PathBuf>) -> Result<()> {
    let (envelope, _) = read_envelope(path)?;
    let password = prompt_password("Passphrase: ")?;

    let secret = vault.unseal(&envelope, &password)?;

    match output {
        Some(out) => {
            write_secret(&out, &secret)?;
            println!("Wrote secret to {}", out.display());
        }
        None => {
            io::stdout().write_all(secret.as_bytes())?;
        }
    }

    Ok(())
}

fn cmd_inspect(vault: &Vault, path: &Path) -> Result<()> {
    let (envelope, is_hex) = read_envelope(path)?;
    let status = vault.migration_status(&envelope);
    let cipher = vault
        .registry()
        .resolve(envelope.version)
        .map(|c| c.name())
        .unwrap_or("unsupported");

    let report = serde_json::json!({
        "format": if is_hex { "hex" } else { "binary" },
        "version": envelope.version,
        "cipher": cipher,
        "kdf": {
            "algorithm": "argon2id",
            "memory_cost": envelope.kdf.memory_cost,
            "time_cost": envelope.kdf.time_cost,
            "parallelism": envelope.kdf.parallelism,
            "salt": hex::encode(&envelope.kdf.salt),
        },
        "nonce_len": envelope.nonce.len(),
        "tag_len": envelope.tag.len(),
        "migration": status,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

fn cmd_migrate(vault: &Vault, path: &Path) -> Result<()> {
    let (envelope, is_hex) = read_envelope(path)?;
    let status = vault.migration_status(&envelope);

    if !status.migration_required {
        println!("Envelope already uses {}", status.latest);
        return Ok(());
    }

    let password = prompt_password("Passphrase: ")?;
    let migrated = vault.migrate(&envelope, &password)?;
    write_envelope(path, &migrated, is_hex)?;

    println!("Migrated {} from {} to {}", path.display(), status.version, migrated.version);

    Ok(())
}

fn cmd_passwd(vault: &Vault, path: &Path) -> Result<()> {
    let (envelope, is_hex) = read_envelope(path)?;
    let old_password = prompt_password("Current passphrase: ")?;
    // Check before asking for the new one.
    vault.verify(&envelope, &old_password)?;
    let new_password = prompt_new_password()?;

    let rekeyed = vault.rekey(&envelope, &old_password, &new_password)?;
    write_envelope(path, &rekeyed, is_hex)?;

    println!("Passphrase changed successfully");

    Ok(())
}

fn cmd_versions(vault: &Vault) -> Result<()> {
    let current = vault.registry().current().identifier();

    for id in vault.registry().versions() {
        let cipher = vault.registry().resolve(id)?;
        let marker = if id == current { " (current)" } else { "" };
        println!("{}  {}{}", id, cipher.name(), marker);
    }

    Ok(())
}
