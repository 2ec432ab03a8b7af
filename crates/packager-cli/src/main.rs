use anyhow::Context;
use clap::Parser;
use packager_core::config::{CliOverrides, PackagerConfig, DEFAULT_CONFIG_FILE};
use packager_core::{Builder, Packager};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Packager - bundles AMD modules and their dependencies into one file
#[derive(Parser, Debug, Clone)]
#[command(name = "packager")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Module ids to bundle
    #[arg(value_name = "MODULE")]
    modules: Vec<String>,

    /// Options file (defaults to packager.yaml when present)
    #[arg(long, value_name = "FILE")]
    options: Option<PathBuf>,

    /// File the output should be written to
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// List the loaded modules
    #[arg(long = "modules", visible_alias = "list", conflicts_with_all = ["dependencies", "json"])]
    modules_only: bool,

    /// List the dependencies map
    #[arg(long, conflicts_with = "json")]
    dependencies: bool,

    /// Print the bundle definition as JSON
    #[arg(long)]
    json: bool,

    /// Write one file per package into DIR
    #[arg(long, value_name = "DIR")]
    by_package: Option<PathBuf>,

    /// Restore the bundle definition from a JSON file instead of loading modules
    #[arg(long, value_name = "FILE")]
    from_json: Option<PathBuf>,

    /// Text placed between modules
    #[arg(long, value_name = "TEXT")]
    glue: Option<String>,

    /// Directory for ids that match no alias
    #[arg(long, value_name = "DIR")]
    base_url: Option<PathBuf>,

    /// Do not read or write the bundle definition cache
    #[arg(long)]
    no_cache: bool,

    /// Write a default packager.yaml to the current directory
    #[arg(long)]
    init: bool,

    /// Log progress to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Method {
    Output,
    Modules,
    Dependencies,
    Json,
}

impl Cli {
    fn method(&self) -> Method {
        if self.modules_only {
            Method::Modules
        } else if self.dependencies {
            Method::Dependencies
        } else if self.json {
            Method::Json
        } else {
            Method::Output
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set RUST_LOG=debug for detailed logs
    let level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(_) => EnvFilter::from_default_env(),
        Err(_) => EnvFilter::default().add_directive(level.into()),
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    if cli.init {
        PackagerConfig::init_file(Path::new(DEFAULT_CONFIG_FILE))
            .context("Failed to write configuration")?;
        println!("Created {}", DEFAULT_CONFIG_FILE);
        return Ok(());
    }

    if cli.modules.is_empty() && cli.from_json.is_none() {
        eprintln!("Error: No modules specified. Use --help for usage information.");
        std::process::exit(1);
    }

    let (config, root) = load_config(&cli)?;
    let packager = Packager::new(config, root);
    let requires = packager.requires(&cli.modules);
    debug!("Requested modules: {:?}", requires);

    let mut builder = match cli.from_json {
        Some(ref path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Builder::from_json(&json)
                .with_context(|| format!("Failed to restore {}", path.display()))?
        }
        None => packager.require(&requires)?,
    };

    // A restored definition without explicit ids is used whole
    if !cli.modules.is_empty() {
        let (reduced, reduction) = builder.reduce_with_report(&requires);
        for id in &reduction.skipped {
            warn!("Module '{}' is not available and was skipped", id);
        }
        builder = reduced;
    }

    let method = cli.method();
    if matches!(method, Method::Output | Method::Modules) {
        eprint!(
            "\nLoaded Modules:\n  {}\n\n",
            builder.modules().join("\n  ")
        );
    }

    match method {
        Method::Output => {
            if let Some(ref dir) = cli.by_package {
                write_packages(&builder, &packager.config().glue, dir)?;
            } else {
                let output = builder.output(&packager.config().glue)?;
                write_output(cli.output.as_deref(), &output)?;
            }
        }
        Method::Json => {
            let json = builder.to_json_pretty()?;
            write_output(cli.output.as_deref(), &json)?;
        }
        Method::Dependencies => {
            eprint!("{}", format_dependencies(&builder));
        }
        Method::Modules => {}
    }

    Ok(())
}

/// Load the options file and apply command line overrides
///
/// Relative directories in the config resolve against the directory the
/// config file is in, or the working directory without one.
fn load_config(cli: &Cli) -> anyhow::Result<(PackagerConfig, PathBuf)> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let config_path = match cli.options {
        Some(ref path) => Some(path.clone()),
        None => {
            let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
            default_path.exists().then_some(default_path)
        }
    };

    let (mut config, root) = match config_path {
        Some(path) => {
            let config = PackagerConfig::from_file(&path)
                .with_context(|| format!("Failed to load options file {}", path.display()))?;
            let root = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => cwd.join(parent),
                _ => cwd,
            };
            (config, root)
        }
        None => (PackagerConfig::default(), cwd),
    };

    let overrides = CliOverrides {
        base_url: cli
            .base_url
            .as_ref()
            .map(|dir| dir.to_string_lossy().to_string()),
        glue: cli.glue.clone(),
        cache: cli.no_cache.then_some(false),
    };
    config.merge(&overrides);

    Ok((config, root))
}

fn write_output(path: Option<&Path>, output: &str) -> anyhow::Result<()> {
    match path {
        Some(path) => std::fs::write(path, output)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(output.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

/// One file per package; the unnamed package is written as `main.js`
fn write_packages(builder: &Builder, glue: &str, dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    for (package, code) in builder.output_by_package(glue)? {
        let name = if package.is_empty() {
            "main".to_string()
        } else {
            package.replace(['/', '\\'], "_")
        };
        let path = dir.join(format!("{}.js", name));
        std::fs::write(&path, code)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Wrote package '{}' to {}", package, path.display());
    }
    Ok(())
}

fn format_dependencies(builder: &Builder) -> String {
    let mut out = String::new();
    for (id, deps) in builder.dependencies() {
        out.push_str("\n  ");
        out.push_str(id);
        for dep in deps {
            out.push_str("\n    - ");
            out.push_str(dep);
        }
    }
    out.push_str("\n\n");
    out
}
