//! varcore-dump - Main Entry Point
//!
//! Loads a generated table file, initialises a registry from it and prints
//! the dump of every variable, or of the variables named on the command line.
//!
//! ```text
//! varcore-dump <tables.toml|tables.json> [NAME...]
//! ```

use anyhow::{bail, Context};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use varcore::{Handle, Registry, TableSet};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,varcore=debug")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        bail!("usage: varcore-dump <tables.toml|tables.json> [NAME...]");
    };
    let names: Vec<String> = args.collect();

    let tables = TableSet::load(&path).with_context(|| format!("loading {}", path))?;
    let registry = Registry::init(tables).context("initialising registry")?;

    let handles: Vec<Handle> = if names.is_empty() {
        registry.handles().collect()
    } else {
        names
            .iter()
            .map(|name| {
                registry
                    .get_hnd(name)
                    .with_context(|| format!("no variable named {:?}", name))
            })
            .collect::<anyhow::Result<_>>()?
    };

    for hnd in handles {
        print!("{}", registry.dump_to_string(hnd));
    }

    tracing::info!("Dumped variables from {}", path);
    Ok(())
}
