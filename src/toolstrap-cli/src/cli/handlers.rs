//! Command dispatch and execution handlers.

use anyhow::{Context, Result};
use toolstrap_installer::{
    Arch, BootstrapManifest, InstallError, Installer, InstallerConfig, Os, Platform, Stage,
    bin_dir, resolve_install_path,
};

use super::args::*;
use crate::ci::{LogGroup, export_path, set_output};

/// Dispatch a CLI command to its handler.
pub async fn dispatch_command(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Install(args) => run_install(args).await,
        Commands::Path(args) => run_path(args),
        Commands::Artifact(args) => run_artifact(args),
    }
}

async fn run_install(args: InstallArgs) -> Result<()> {
    let mut config = InstallerConfig::from_env();
    if let Some(secs) = args.timeout {
        config.download_timeout_secs = secs;
    }
    if let Some(dir) = args.temp_dir {
        config.temp_root = Some(dir);
    }

    let installer = Installer::with_config(config);
    let manifest = installer.manifest();
    let title = format!(
        "Installing {} (bootstrap {})",
        manifest.tool, manifest.version
    );

    let mut last_stage: Option<Stage> = None;
    let result = {
        let _group = LogGroup::start(&title, args.ci_groups);
        installer
            .install_with_progress(args.version.as_deref(), |stage| {
                tracing::debug!("Stage reached: {}", stage);
                last_stage = Some(stage);
            })
            .await
    };

    let outcome = result.map_err(|e| describe_failure(e, last_stage))?;

    println!("{}", outcome.install_path.display());

    if let Some(path_file) = &args.path_file
        && let Some(dir) = bin_dir(&outcome.install_path)
    {
        export_path(path_file, dir)?;
        tracing::info!("Added {} to {}", dir.display(), path_file.display());
    }

    if let Some(output_file) = &args.output_file {
        set_output(
            output_file,
            "install-path",
            &outcome.install_path.to_string_lossy(),
        )?;
        if let Some(version) = outcome
            .reported_version
            .as_deref()
            .and_then(|v| v.lines().next())
        {
            set_output(output_file, "version", version)?;
        }
    }

    Ok(())
}

fn describe_failure(err: InstallError, last_stage: Option<Stage>) -> anyhow::Error {
    let kind = err.kind();
    let retriable = err.is_retriable();
    let context = match last_stage {
        Some(stage) => format!("Install failed [{kind}] after stage '{stage}'"),
        None => format!("Install failed [{kind}] before any stage completed"),
    };
    let err = anyhow::Error::new(err).context(context);
    if retriable {
        err.context("The failure looks transient; re-running the install may succeed")
    } else {
        err
    }
}

fn run_path(args: PathArgs) -> Result<()> {
    let os = match args.os {
        Some(os) => os,
        None => Platform::current()?.os.to_string(),
    };
    let path = resolve_install_path(&os)
        .with_context(|| format!("Cannot resolve install path for {os}"))?;
    println!("{}", path.display());
    Ok(())
}

fn run_artifact(args: ArtifactArgs) -> Result<()> {
    let os = args.os.as_deref().map(Os::parse).transpose()?;
    let arch = args.arch.as_deref().map(Arch::parse).transpose()?;
    let platform = match (os, arch) {
        (Some(os), Some(arch)) => Platform::new(os, arch),
        (os, arch) => {
            let host = Platform::current().context("Pass --os and --arch explicitly")?;
            Platform::new(os.unwrap_or(host.os), arch.unwrap_or(host.arch))
        }
    };

    let manifest = BootstrapManifest::pinned();
    let artifact = manifest.locate(platform)?;

    if args.json {
        let report = serde_json::json!({
            "version": manifest.version,
            "platform": platform,
            "artifact": artifact,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("version:  {}", manifest.version);
    println!("filename: {}", artifact.filename);
    println!("url:      {}", artifact.url);
    println!("sha256:   {}", artifact.sha256);
    Ok(())
}
