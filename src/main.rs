//! sistry - team access and key rotation for sops-encrypted files.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sopsistry::cli::output;
use sopsistry::cli::{execute, Cli};
use sopsistry::error::{Error, KeyError, ManifestError};

fn main() {
    let cli = Cli::parse();
    output::init_colors(cli.globals.no_color);

    let filter = EnvFilter::try_from_env("SOPSISTRY_LOG").unwrap_or_else(|_| {
        if cli.globals.verbose {
            EnvFilter::new("sopsistry=debug")
        } else {
            EnvFilter::new("sopsistry=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    if let Err(e) = execute(cli.command, &cli.globals) {
        let suggestion = match &e {
            Error::Manifest(ManifestError::NotInitialized(_)) => Some("run: sistry init"),
            Error::Key(KeyError::NoKeyFiles(_)) => Some("run: sistry init"),
            Error::Key(KeyError::NoPrivateKey(_)) => {
                Some("your private key is missing from .secrets; ask a teammate to re-add you")
            }
            Error::Key(KeyError::MemberNotFound(_)) => {
                Some("pass --user or set SOPSISTRY_USER_ID to your member ID")
            }
            _ => None,
        };

        output::error(&e.to_string());
        if let Some(hint) = suggestion {
            output::hint(hint);
        }
        std::process::exit(1);
    }
}
