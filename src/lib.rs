// 库文件，导出模块
pub mod cli;
pub mod client;
pub mod config;
pub mod info;
pub mod process;
pub mod ssh;
pub mod transfer;
pub mod utils;

pub use client::{Client, Response};
pub use config::{ConfigSources, ConnectionConfig, Overrides};
pub use info::Info;
pub use process::{ProcessEntry, Screen, ScreenId};
pub use utils::error::{RaspinelError, Result};

use anyhow::{bail, Context};
use clap::CommandFactory;
use cli::Cli;
use dialoguer::Password;
use ssh::Connector;
use std::path::Path;
use transfer::ProgressTracker;
use utils::file::calculate_md5;

/// Runs the CLI actions in order (info, download, upload, command) and
/// returns the process exit code.
pub fn run(cli: &Cli) -> anyhow::Result<i32> {
    if !cli.has_action() {
        Cli::command().print_help()?;
        println!("\nGUI mode is not available in this build; pass an action or a command.");
        return Ok(0);
    }

    let mut config = ConnectionConfig::resolve_from(&ConfigSources::system()?, &cli.overrides())
        .context("Failed to resolve connection settings")?;
    if cli.ask_password {
        let password = Password::new()
            .with_prompt(format!("Enter password for {}", config))
            .interact()?;
        config.password = Some(password);
    }

    run_and_close(Client::new(config), cli)
}

/// [`run_actions`] followed by a close. A close failure is only logged so it
/// never hides the outcome of the actions.
pub fn run_and_close<C: Connector>(mut client: Client<C>, cli: &Cli) -> anyhow::Result<i32> {
    let result = run_actions(&mut client, cli);
    if let Err(e) = client.close() {
        log::warn!("Failed to close connection: {}", e);
    }
    result
}

pub fn run_actions<C: Connector>(client: &mut Client<C>, cli: &Cli) -> anyhow::Result<i32> {
    if cli.info {
        let info = client.info().context("Failed to query remote information")?;
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&info)?);
        } else {
            println!("{info}");
        }
    }

    if let Some([src, dest]) = cli.download.as_deref() {
        let progress = ProgressTracker::new(&format!("Downloading {src}"));
        let downloaded = client.download_with_progress(src, dest, &progress)?;
        log::info!("Downloaded {} bytes to {}", downloaded.bytes, downloaded.local_path.display());
        if cli.verify {
            verify(client, &downloaded.local_path, src)?;
        }
    }

    if let Some([src, dest]) = cli.upload.as_deref() {
        let progress = ProgressTracker::new(&format!("Uploading {src}"));
        let uploaded = client.upload_with_progress(src, dest, &progress)?;
        log::info!("Uploaded {} bytes to {}", uploaded.bytes, uploaded.remote_path);
        if cli.verify {
            verify(client, Path::new(src), &uploaded.remote_path)?;
        }
    }

    if !cli.commands.is_empty() {
        let raw_cmd = cli.commands.join(" ");
        let resp = client.run(&raw_cmd)?;
        if !resp.out.is_empty() {
            println!("{}", resp.out);
        }
        if !resp.err.is_empty() {
            eprintln!("{}", resp.err);
        }
        return Ok(resp.exit);
    }

    Ok(0)
}

fn verify<C: Connector>(client: &mut Client<C>, local: &Path, remote: &str) -> anyhow::Result<()> {
    let local_md5 = calculate_md5(local)
        .with_context(|| format!("Failed to hash {}", local.display()))?;
    let remote_md5 = client.remote_md5(remote)?;
    if local_md5 != remote_md5 {
        bail!(
            "Checksum mismatch: {} is {} but {} is {}",
            local.display(),
            local_md5,
            remote,
            remote_md5
        );
    }
    println!("Checksum OK: {local_md5}");
    Ok(())
}
