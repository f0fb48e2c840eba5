//! Build script for the moodify API.
//!
//! Copies the `.env.example` configuration template into the user's local data
//! directory (`<data_local_dir>/moodify/.env.example`) so that a fresh install
//! has a template next to the place where `moodify` looks for its `.env` file.

use std::{env, fs, path::PathBuf};

/// Copies the configuration template to the local data directory.
///
/// A missing template or an unwritable data directory only produces a cargo
/// warning; neither should break a build on a CI machine or in a sandbox.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=.env.example");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let env_example_path = manifest_dir.join(".env.example");

    if !env_example_path.is_file() {
        println!(
            "cargo:warning=.env.example not found at {}",
            env_example_path.display()
        );
        return Ok(());
    }

    let mut out_dir = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    out_dir.push("moodify");

    let copied = fs::create_dir_all(&out_dir).and_then(|_| {
        let contents = fs::read_to_string(&env_example_path)?;
        fs::write(out_dir.join(".env.example"), contents)
    });

    if let Err(e) = copied {
        println!(
            "cargo:warning=could not copy .env.example to {}: {}",
            out_dir.display(),
            e
        );
    }

    Ok(())
}
