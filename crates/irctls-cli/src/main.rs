//! irctls - inspect IRC server certificates and manage trusted overrides.

use anyhow::Result;

fn main() -> Result<()> {
    irctls_cli::run()
}
