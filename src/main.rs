//! relfetch - fetch pre-built executables from GitHub releases

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use relfetch::manifest::Manifest;
use relfetch::ops::fetch::{FetchOptions, fetch};
use relfetch::platform::OsTag;

#[derive(Parser)]
#[command(name = "relfetch")]
#[command(author, version, about = "Fetch pre-built executables from GitHub releases")]
struct Cli {
    /// Path to the releases manifest
    #[arg(long, default_value = "releases.json")]
    manifest: PathBuf,

    /// List program names and exit
    #[arg(long)]
    list: bool,

    /// Platform tag to fetch assets for
    #[arg(long, value_enum, required_unless_present = "list")]
    ostag: Option<OsTag>,

    /// Output directory for fetched programs
    #[arg(long, required_unless_present = "list")]
    outdir: Option<PathBuf>,

    /// Zip archive to append fetched programs into
    #[arg(long)]
    zip: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let manifest = Manifest::load(&cli.manifest)
        .with_context(|| format!("loading manifest {}", cli.manifest.display()))?;

    if cli.list {
        println!("{}", manifest.program_names().join(","));
        return Ok(());
    }

    // clap enforces these outside list mode
    let (Some(ostag), Some(outdir)) = (cli.ostag, cli.outdir) else {
        bail!("--ostag and --outdir are required for fetch mode");
    };

    let fetched = fetch(
        &manifest,
        ostag,
        &outdir,
        cli.zip.as_deref(),
        &FetchOptions::default(),
    )
    .await?;

    if fetched.is_empty() {
        eprintln!("warning: no programs fetched");
        std::process::exit(1);
    }

    println!("fetched {} programs", fetched.len());
    Ok(())
}
