//! remove.bg CLI Tool
//!
//! Command-line interface for removing image backgrounds through the
//! remove.bg API.

use removebg::cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::main().await
}
