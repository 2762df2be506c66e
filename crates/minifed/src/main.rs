//! minifed - a local OpenID Federation on one port.

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    minifed::cli::run().await
}
