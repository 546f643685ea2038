use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use jdk_provision::certs::ImportOutcome;
use jdk_provision::installer::{install_from_local, InstallOutcome};
use jdk_provision::logging::init_logging;
use jdk_provision::platform::{Arch, Os};
use jdk_provision::{
    CaCerts, HttpArchiveFetcher, InstallerConfig, JdkDistributionName, JdkManager, JdkRelease,
    JdkSpec,
};

#[derive(Parser)]
#[command(name = "jdk-provision", about = "Install JDKs exactly once, with CA certificates")]
struct Cli {
    /// Config file (default: $JDK_PROVISION_CONFIG or ~/.jdk-provision/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy a JDK to <DESTINATION> and import the certificates listed in <CERTS_DIR>
    Install(InstallArgs),
    /// Install the JDK for a spec if needed and print its path
    Resolve(SpecArgs),
    /// Print the content hash of a spec
    Hash(SpecArgs),
    /// Print the download URL of a spec
    Url(SpecArgs),
}

#[derive(Args)]
struct InstallArgs {
    destination: PathBuf,
    /// Directory of `<alias>.serial-number` files
    certs_dir: PathBuf,
    /// JDK to copy
    #[arg(long, env = "JAVA_HOME")]
    source: PathBuf,
}

#[derive(Args)]
struct SpecArgs {
    #[arg(long)]
    distribution: JdkDistributionName,
    #[arg(long = "version")]
    jdk_version: String,
    /// Defaults to the host OS
    #[arg(long)]
    os: Option<Os>,
    /// Defaults to the host architecture
    #[arg(long)]
    arch: Option<Arch>,
    /// CA certificate as ALIAS=PEM_FILE; repeatable
    #[arg(long = "cert", value_name = "ALIAS=PEM_FILE")]
    certs: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = run(cli);
    let code = match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    };
    let _ = std::io::stdout().flush();
    let _ = std::io::stderr().flush();
    code
}

fn run(cli: Cli) -> Result<()> {
    let config =
        InstallerConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Install(args) => install(&config, &args),
        Commands::Resolve(args) => resolve(&config, &args),
        Commands::Hash(args) => {
            println!("{}", build_spec(&args)?.consistent_short_hash());
            Ok(())
        }
        Commands::Url(args) => {
            let spec = build_spec(&args)?;
            let url = config
                .distributions()
                .download_url(spec.distribution, &spec.release)?;
            println!("{url}");
            Ok(())
        }
    }
}

fn install(config: &InstallerConfig, args: &InstallArgs) -> Result<()> {
    let ca = config.ca_resources(Os::current()?);
    let report = install_from_local(&args.source, &args.destination, &args.certs_dir, &ca)
        .with_context(|| {
            format!(
                "Failed to install {} to {}",
                args.source.display(),
                args.destination.display()
            )
        })?;

    let imported = report
        .certificates
        .iter()
        .filter(|c| c.outcome == ImportOutcome::Imported)
        .count();
    tracing::debug!(
        "install {}; {imported} certificate(s) imported",
        match report.outcome {
            InstallOutcome::Installed => "performed",
            InstallOutcome::AlreadyInstalled => "skipped",
        }
    );
    println!("{}", args.destination.display());
    Ok(())
}

fn resolve(config: &InstallerConfig, args: &SpecArgs) -> Result<()> {
    let spec = build_spec(args)?;
    let fetcher = HttpArchiveFetcher::new(config.download_cache())?;
    let manager = JdkManager::new(
        config.storage_root.clone(),
        config.distributions(),
        Box::new(fetcher),
        config.ca_resources(Os::current()?),
    );
    let path = manager
        .jdk(&spec)
        .with_context(|| {
            format!(
                "Failed to provision {} {}",
                spec.distribution, spec.release.version
            )
        })?;
    println!("{}", path.display());
    Ok(())
}

fn build_spec(args: &SpecArgs) -> Result<JdkSpec> {
    let os = match args.os {
        Some(os) => os,
        None => Os::current()?,
    };
    let arch = match args.arch {
        Some(arch) => arch,
        None => Arch::current()?,
    };

    let mut files = Vec::with_capacity(args.certs.len());
    for cert in &args.certs {
        let Some((alias, path)) = cert.split_once('=') else {
            bail!("invalid --cert '{cert}': expected ALIAS=PEM_FILE");
        };
        if alias.is_empty() {
            bail!("invalid --cert '{cert}': alias must not be empty");
        }
        files.push((alias.to_string(), PathBuf::from(path)));
    }
    let ca_certs = CaCerts::from_files(files)?;

    Ok(JdkSpec::new(
        args.distribution,
        JdkRelease::new(args.jdk_version.clone(), os, arch),
        ca_certs,
    ))
}
