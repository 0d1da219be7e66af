//! encfile: encrypt or decrypt a file.
//!
//! Commands:
//!   encrypt (e)  - encrypt --in <file> --out <file>
//!   decrypt (d)  - decrypt --in <file> --out <file>
//!
//! The password comes from --password, the ENCFILE_PASSWORD environment
//! variable, or an interactive prompt, in that order.

use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use secrecy::{ExposeSecret, SecretString};
use tracing::info;

use encfile_codec::CodecError;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Parser, Debug)]
#[command(
    name = "encfile",
    version,
    long_version = concat!(
        env!("CARGO_PKG_VERSION"),
        " (commit ",
        env!("ENCFILE_GIT_COMMIT"),
        ")"
    ),
    about = "encrypt or decrypt file"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encrypt a file
    #[command(visible_alias = "e")]
    Encrypt(IoArgs),

    /// Decrypt a file
    #[command(visible_alias = "d")]
    Decrypt(IoArgs),
}

#[derive(Args, Debug)]
struct IoArgs {
    /// Input file
    #[arg(long = "in", env = "ENCFILE_IN", value_name = "FILE")]
    input: PathBuf,

    /// Output file
    #[arg(long = "out", env = "ENCFILE_OUT", value_name = "FILE")]
    output: PathBuf,

    /// Password; prompted interactively when neither the flag nor the
    /// environment variable is set
    #[arg(long, env = "ENCFILE_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

#[derive(Clone, Copy)]
enum Mode {
    Encrypt,
    Decrypt,
}

impl Mode {
    fn verb(self) -> &'static str {
        match self {
            Mode::Encrypt => "encrypt",
            Mode::Decrypt => "decrypt",
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Encrypt(args) => run(args, Mode::Encrypt),
        Commands::Decrypt(args) => run(args, Mode::Decrypt),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::from(exit_code_for(&err))
        }
    }
}

fn run(args: IoArgs, mode: Mode) -> Result<()> {
    let password = resolve_password(args.password)?;
    if password.expose_secret().len() < MIN_PASSWORD_LEN {
        anyhow::bail!("password length should >= {MIN_PASSWORD_LEN}");
    }

    let input = File::open(&args.input)
        .with_context(|| format!("open input file failed: {}", args.input.display()))?;
    let mut output = File::create(&args.output)
        .with_context(|| format!("create output file failed: {}", args.output.display()))?;

    let start = Instant::now();
    let mut reader = match mode {
        Mode::Encrypt => encfile_codec::new_encrypter(input, &password)?,
        Mode::Decrypt => encfile_codec::new_decrypter(input, &password)?,
    };

    let written = match io::copy(&mut reader, &mut output) {
        Ok(n) => n,
        Err(err) => {
            // The trailing-tag check fires on the stream's final read, after
            // plaintext has already been written out. Never leave an
            // unverified or partial output file behind.
            drop(output);
            let _ = std::fs::remove_file(&args.output);
            return Err(anyhow::Error::from(err)
                .context(format!("{} {} failed", mode.verb(), args.input.display())));
        }
    };

    let elapsed = start.elapsed();
    info!(
        "{} file {}, write:{} bytes to {}, time:{:?}",
        mode.verb(),
        args.input.display(),
        written,
        args.output.display(),
        elapsed
    );
    Ok(())
}

fn resolve_password(flag: Option<String>) -> Result<SecretString> {
    if let Some(password) = flag {
        return Ok(SecretString::from(password));
    }
    let typed = rpassword::prompt_password("Password: ").context("read password failed")?;
    Ok(SecretString::from(typed))
}

/// Exit codes: 3 authentication failure, 4 malformed container
/// (unknown version / truncated), 1 everything else. Usage errors exit 2
/// via clap.
fn exit_code_for(err: &anyhow::Error) -> u8 {
    for cause in err.chain() {
        if let Some(codec) = cause.downcast_ref::<CodecError>() {
            return match codec {
                CodecError::AuthenticationFailed => 3,
                CodecError::UnknownVersion(_) | CodecError::TruncatedContainer { .. } => 4,
                _ => 1,
            };
        }
    }
    1
}
