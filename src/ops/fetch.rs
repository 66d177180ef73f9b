//! The fetch pipeline: resolve, download, locate, install, aggregate.
//!
//! Entries are processed strictly in sequence. A missing platform asset or
//! a missing archive member is logged and skipped; a failed download aborts
//! the whole run.

use std::fs::{self, File};
use std::path::Path;

use anyhow::{Context, Result};
use reqwest::Client;
use zip::ZipArchive;

use crate::io::archive::{append_to_zip, find_member, install_member};
use crate::io::download::download_to_temp;
use crate::manifest::Manifest;
use crate::platform::OsTag;

/// Per-tag asset download path on the release host.
pub const GITHUB_URL: &str = "https://github.com/{repo}/releases/download/{tag}/{asset}";

/// Substitute `{repo}`, `{tag}`, and `{asset}` into a URL template.
pub fn download_url(template: &str, repo: &str, tag: &str, asset: &str) -> String {
    template
        .replace("{repo}", repo)
        .replace("{tag}", tag)
        .replace("{asset}", asset)
}

/// Pipeline configuration.
///
/// The CLI always uses [`GITHUB_URL`]; tests point the template at a local
/// server.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub url_template: String,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            url_template: GITHUB_URL.to_string(),
        }
    }
}

/// Download and install the pre-built programs for one platform.
///
/// Returns the output filenames installed under `outdir`, in processing
/// order. When `zip_path` is set and at least one program was fetched, the
/// files are also appended into that archive.
pub async fn fetch(
    manifest: &Manifest,
    ostag: OsTag,
    outdir: &Path,
    zip_path: Option<&Path>,
    options: &FetchOptions,
) -> Result<Vec<String>> {
    fs::create_dir_all(outdir)
        .with_context(|| format!("creating output directory {}", outdir.display()))?;

    let client = Client::new();
    let mut fetched = Vec::new();

    for entry in &manifest.entries {
        let Some(asset) = entry.asset_for(ostag) else {
            tracing::info!(repo = %entry.repo, %ostag, "no asset for platform");
            println!("  skip {}: no asset for {}", entry.repo, ostag);
            continue;
        };

        let url = download_url(&options.url_template, &entry.repo, &entry.tag, asset);
        println!("  downloading {} {} ({})", entry.repo, entry.tag, asset);

        // a failed download aborts the run; entries are not isolated
        let tmp = download_to_temp(&client, &url)
            .await
            .with_context(|| format!("downloading {url}"))?;

        let file = File::open(tmp.path())?;
        let mut archive =
            ZipArchive::new(file).with_context(|| format!("opening archive {asset}"))?;

        for (output_name, archive_name) in &entry.programs {
            let Some(index) = find_member(&mut archive, archive_name, ostag)? else {
                tracing::warn!(%archive_name, %asset, "member not found in archive");
                println!("  warning: {archive_name} not found in {asset}");
                continue;
            };

            let out_file = install_member(&mut archive, index, outdir, output_name)
                .with_context(|| format!("installing {output_name}"))?;
            println!("  {out_file}");
            fetched.push(out_file);
        }
    }

    if let Some(zip_path) = zip_path
        && !fetched.is_empty()
    {
        append_to_zip(zip_path, outdir, &fetched)
            .with_context(|| format!("appending to {}", zip_path.display()))?;
        println!("  added {} programs to {}", fetched.len(), zip_path.display());
    }

    Ok(fetched)
}
