//! Admin command implementations.
//!
//! Each command writes its result to the supplied writer, so the binary can
//! print to stdout while tests capture the output.

use std::{io::Write, path::PathBuf, time::Duration};

use warden_authn::{AuthnConfig, Claims, TokenAuthority};
use warden_keystore::GeneratedKeyPair;

use crate::{
    cli::{AuthorityArgs, Command, GenKeyArgs, GenTokenArgs, VerifyArgs},
    error::Result,
};

/// Opening line of a printed token.
pub const TOKEN_BEGIN: &str = "-----BEGIN TOKEN-----";

/// Closing line of a printed token.
pub const TOKEN_END: &str = "-----END TOKEN-----";

/// Runs `command`, writing its output to `out`.
///
/// # Errors
///
/// Returns the failing command's error; nothing is written in that case.
pub fn run(command: &Command, out: &mut impl Write) -> Result<()> {
    match command {
        Command::Genkey(args) => {
            tracing::info!(
                command = "genkey",
                kid = args.kid.as_deref().unwrap_or("<random>"),
                keys_dir = %args.keys_dir.display(),
                public_dir = %args.public_dir.display(),
                "startup"
            );
            let (pair, private_path, public_path) = genkey(args)?;
            writeln!(out, "kid: {}", pair.kid())?;
            writeln!(out, "private key: {}", private_path.display())?;
            writeln!(out, "public key: {}", public_path.display())?;
        },
        Command::Gentoken(args) => {
            log_authority_args("gentoken", &args.authority);
            let token = gentoken(args)?;
            writeln!(out, "{TOKEN_BEGIN}")?;
            writeln!(out, "{token}")?;
            writeln!(out, "{TOKEN_END}")?;
        },
        Command::Verify(args) => {
            log_authority_args("verify", &args.authority);
            let claims = verify(args)?;
            writeln!(out, "{}", serde_json::to_string_pretty(&claims)?)?;
        },
    }
    Ok(())
}

/// Generates a key pair and writes `<kid>.pem` into the private and public
/// directories.
///
/// # Errors
///
/// Returns an error if the kid is invalid or either file cannot be written;
/// existing key files are never overwritten.
pub fn genkey(args: &GenKeyArgs) -> Result<(GeneratedKeyPair, PathBuf, PathBuf)> {
    let kid = args.kid.clone().unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let pair = GeneratedKeyPair::generate(&kid)?;
    let (private_path, public_path) = pair.write_to_dirs(&args.keys_dir, &args.public_dir)?;
    Ok((pair, private_path, public_path))
}

/// Issues a token for the requested subject and roles.
///
/// # Errors
///
/// Returns an error if the key directory cannot be loaded, the active key
/// cannot sign, or signing fails.
pub fn gentoken(args: &GenTokenArgs) -> Result<String> {
    let authority = authority(&args.authority, Some(args.ttl))?;

    let mut claims = authority.fresh_claims();
    claims.sub.clone_from(&args.subject);
    claims.roles.clone_from(&args.roles);

    Ok(authority.issue(&claims)?)
}

/// Verifies a token against the key directory.
///
/// # Errors
///
/// Returns the verification error for a rejected token.
pub fn verify(args: &VerifyArgs) -> Result<Claims> {
    let authority = authority(&args.authority, None)?;
    Ok(authority.verify(args.token.trim())?)
}

fn authority(args: &AuthorityArgs, ttl: Option<Duration>) -> Result<TokenAuthority> {
    let config = AuthnConfig::builder()
        .keys_dir(args.keys_dir.clone())
        .active_kid(args.active_kid.clone())
        .maybe_issuer(args.issuer.clone())
        .maybe_audience(args.audience.clone())
        .maybe_token_ttl(ttl)
        .build()?;
    Ok(TokenAuthority::from_config(&config)?)
}

fn log_authority_args(command: &str, args: &AuthorityArgs) {
    tracing::info!(
        command,
        keys_dir = %args.keys_dir.display(),
        active_kid = %args.active_kid,
        issuer = args.issuer.as_deref().unwrap_or_default(),
        audience = args.audience.as_deref().unwrap_or_default(),
        "startup"
    );
}
