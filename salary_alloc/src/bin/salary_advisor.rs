//! Salary allocation advisor
//!
//! Reads answers from stdin and prints the dialogue to stdout. Logs go to
//! stderr; set `RUST_LOG=debug` to see them.

use salary_alloc::Session;
use std::io;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(io::stderr),
        )
        .init();

    let stdin = io::stdin();
    let mut session = Session::new(stdin.lock(), io::stdout());
    session.run()?;
    Ok(())
}
