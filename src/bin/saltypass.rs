//! Saltypass CLI - a small encrypted password store
//!
//! Keeps named secrets in a single store file. Each secret is encrypted
//! with a master key (scrypt + NaCl secretbox) before it is written.

use clap::{Parser, Subcommand};
use std::error::Error as _;
use std::fs::File;
use std::path::PathBuf;
use std::process;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use saltypass::config::{DEFAULT_STORE_FILE, StoreConfig};
use saltypass::prompt::{SecretReader, StreamSecretReader, TerminalSecretReader};
use saltypass::secretcrypt::ScryptCost;
use saltypass::store::{self, SecretStore};
use saltypass::{ErrorCategory, ErrorKind, Result, SecretboxCipher, StoreError};

#[derive(Parser)]
#[command(name = "saltypass")]
#[command(version)]
#[command(about = "Small encrypted password store.", long_about = None)]
struct Cli {
    /// Path to the store file
    #[arg(
        long,
        global = true,
        value_name = "FILE",
        env = "SALTYPASS_STORE",
        default_value = DEFAULT_STORE_FILE,
    )]
    store: PathBuf,

    /// scrypt cost, as log2(N), used when encrypting new secrets
    #[arg(
        long,
        global = true,
        value_name = "N",
        env = "SALTYPASS_SCRYPT_LOG_N",
        default_value_t = ScryptCost::DEFAULT_LOG_N,
        value_parser = clap::value_parser!(u8)
            .range(i64::from(ScryptCost::MIN_LOG_N)..=i64::from(ScryptCost::MAX_LOG_N)),
    )]
    scrypt_log_n: u8,

    /// Read the master key from stdin instead of from terminal
    #[arg(long, global = true)]
    passphrase_stdin: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List entry names in store order
    #[command(alias = "ls")]
    List,

    /// Encrypt a secret and add it to the store
    Add {
        /// Name of the new entry
        name: String,

        /// Read the secret from this file instead of prompting for it.
        /// Required with --passphrase-stdin
        #[arg(long, value_name = "FILE")]
        secret_file: Option<PathBuf>,

        /// Accept a master key that does not open the existing entries
        #[arg(long)]
        allow_new_key: bool,
    },

    /// Remove the first entry with the given name
    #[command(alias = "rm")]
    Remove {
        /// Name of the entry to remove
        name: String,
    },

    /// Decrypt an entry and print its secret
    Show {
        /// Name of the entry to show
        name: String,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        let mut source = e.source();
        while let Some(cause) = source {
            eprintln!("  caused by: {cause}");
            source = cause.source();
        }
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let cost = ScryptCost::new(cli.scrypt_log_n)?;
    let store = StoreConfig::default()
        .with_path(cli.store)
        .with_cost(cost)
        .open();

    match cli.command {
        Commands::List => {
            for entry in store.load_or_empty()? {
                println!("{}", entry.name);
            }
            Ok(())
        }
        Commands::Add {
            name,
            secret_file,
            allow_new_key,
        } => {
            if secret_file.is_none() && cli.passphrase_stdin {
                return Err(StoreError::with_kind(
                    ErrorCategory::User,
                    ErrorKind::SecretUnavailable,
                    "--passphrase-stdin reads the master key from stdin; \
                     pass the secret with --secret-file",
                ));
            }
            let mut entries = store.load_or_empty()?;
            let secret = match secret_file {
                Some(path) => {
                    let file = File::open(&path).map_err(|e| {
                        StoreError::io(format!("failed to open {}", path.display()), e)
                    })?;
                    StreamSecretReader::new(Box::new(file)).read_secret()?
                }
                None => TerminalSecretReader::new(format!("Secret for {name}: ")).read_secret()?,
            };
            let key = master_key_reader(cli.passphrase_stdin).read_secret()?;

            if !allow_new_key {
                store.verify_key(&entries, &key).map_err(|e| {
                    if e.is(ErrorKind::CipherMismatch) {
                        e.with_context(
                            "master key does not open the existing entries \
                             (pass --allow-new-key to use it anyway)",
                        )
                    } else {
                        e
                    }
                })?;
            }
            if entries.iter().any(|e| e.name == name) {
                warn!(name = %name, "an entry with this name already exists; adding another");
            }

            entries.push(store.seal(&name, &secret, &key)?);
            store.save(&entries)
        }
        Commands::Remove { name } => {
            let mut entries = store.load()?;
            let index = store::find(&entries, &name)?;
            entries.remove(index);
            store.save(&entries)
        }
        Commands::Show { name } => show(&store, &name, cli.passphrase_stdin),
    }
}

fn show(store: &SecretStore<SecretboxCipher>, name: &str, passphrase_stdin: bool) -> Result<()> {
    let entries = store.load()?;
    let entry = &entries[store::find(&entries, name)?];
    let key = master_key_reader(passphrase_stdin).read_secret()?;
    let secret = store.reveal(entry, &key).map_err(|e| {
        if e.is(ErrorKind::CipherMismatch) {
            e.with_context("wrong master key")
        } else {
            e
        }
    })?;
    println!("{}", secret.as_str());
    Ok(())
}

fn master_key_reader(use_stdin: bool) -> Box<dyn SecretReader> {
    if use_stdin {
        Box::new(StreamSecretReader::new(Box::new(std::io::stdin())))
    } else {
        Box::new(TerminalSecretReader::master_key())
    }
}
