//! Command-line interface definition.
//!
//! Every flag can also be set through a `WARDEN_*` environment variable.

use std::{path::PathBuf, time::Duration};

use clap::{Args, Parser, Subcommand};
use humantime_serde::re::humantime;

/// Administrative tasks for warden token keys.
#[derive(Debug, Parser)]
#[command(name = "warden-admin", version, about)]
pub struct Cli {
    /// Command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Admin subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate an Ed25519 key pair.
    Genkey(GenKeyArgs),
    /// Issue a token signed by the active key.
    Gentoken(GenTokenArgs),
    /// Verify a token and print its claims.
    Verify(VerifyArgs),
}

/// Arguments for `genkey`.
#[derive(Debug, Args)]
pub struct GenKeyArgs {
    /// Key ID; a random UUID when omitted.
    #[arg(long, env = "WARDEN_KID")]
    pub kid: Option<String>,

    /// Directory receiving the private key file.
    #[arg(long, env = "WARDEN_KEYS_DIR", default_value = "keys")]
    pub keys_dir: PathBuf,

    /// Directory receiving the public key file.
    #[arg(long, env = "WARDEN_PUBLIC_DIR", default_value = "keys/public")]
    pub public_dir: PathBuf,
}

/// Key directory and active key shared by commands that build an authority.
#[derive(Debug, Args)]
pub struct AuthorityArgs {
    /// Directory holding `<kid>.pem` key files.
    #[arg(long, env = "WARDEN_KEYS_DIR", default_value = "keys")]
    pub keys_dir: PathBuf,

    /// Key ID used for signing.
    #[arg(long, env = "WARDEN_ACTIVE_KID")]
    pub active_kid: String,

    /// Issuer stamped on issued tokens and required on verified ones.
    #[arg(long, env = "WARDEN_ISSUER")]
    pub issuer: Option<String>,

    /// Audience stamped on issued tokens and required on verified ones.
    #[arg(long, env = "WARDEN_AUDIENCE")]
    pub audience: Option<String>,
}

/// Arguments for `gentoken`.
#[derive(Debug, Args)]
pub struct GenTokenArgs {
    #[command(flatten)]
    pub authority: AuthorityArgs,

    /// Subject of the token.
    #[arg(long, env = "WARDEN_SUBJECT")]
    pub subject: Option<String>,

    /// Token lifetime, e.g. `1h` or `8760h`.
    #[arg(long, env = "WARDEN_TTL", default_value = "8760h", value_parser = parse_duration)]
    pub ttl: Duration,

    /// Role granted by the token; repeatable.
    #[arg(long = "role", env = "WARDEN_ROLES", value_delimiter = ',', default_value = "ADMIN")]
    pub roles: Vec<String>,
}

/// Arguments for `verify`.
#[derive(Debug, Args)]
pub struct VerifyArgs {
    #[command(flatten)]
    pub authority: AuthorityArgs,

    /// Token to verify.
    #[arg(long, env = "WARDEN_TOKEN", hide_env_values = true)]
    pub token: String,
}

fn parse_duration(value: &str) -> Result<Duration, humantime::DurationError> {
    humantime::parse_duration(value)
}
