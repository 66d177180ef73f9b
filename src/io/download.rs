//! Archive download
//!
//! Streams a release asset into a scoped temp file; the file is removed
//! when the handle is dropped, on every exit path.

use futures::StreamExt;
use reqwest::Client;
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::USER_AGENT;

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Download a URL into a fresh temp file and return the handle.
///
/// Any non-success HTTP status is an error. The caller keeps the returned
/// `NamedTempFile` alive for as long as the archive is needed.
pub async fn download_to_temp(client: &Client, url: &str) -> Result<NamedTempFile, DownloadError> {
    let tmp = tempfile::Builder::new()
        .prefix("relfetch-")
        .suffix(".zip")
        .tempfile()?;

    let response = client
        .get(url)
        .header(reqwest::header::USER_AGENT, USER_AGENT)
        .send()
        .await?
        .error_for_status()?;

    let mut file = File::create(tmp.path()).await?;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
    }
    file.flush().await?;

    Ok(tmp)
}
