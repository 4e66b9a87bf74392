use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{exit, Command};

use clap::{Parser, Subcommand, ValueEnum};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const LAMBDA_PACKAGE: &str = "datazone_pipeline_lambda";

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the DataZone catalog pipeline workspace",
    long_about = "Builds and packages the catalog pipeline Lambdas and runs CI checks."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run CI checks
    Ci {
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
    /// Build the Lambda binaries and zip each one as a `bootstrap` artifact
    ServerlessPackage {
        /// Compilation target triple for Lambda binaries
        #[arg(long, default_value = "x86_64-unknown-linux-gnu")]
        target: String,
        #[arg(value_enum, long, default_value_t = BuildProfile::Release)]
        profile: BuildProfile,
        /// Package a single function instead of all of them
        #[arg(value_enum, long)]
        function: Option<LambdaFunction>,
        #[arg(long, env = "LAMBDA_DIST_DIR", default_value = "dist")]
        dist_dir: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum CiJob {
    /// Formatting, clippy, and tests
    Check,
    /// Cross-compile and zip the Lambda artifacts
    Package,
    /// Check, then package
    All,
}

#[derive(Clone, Copy, ValueEnum)]
enum BuildProfile {
    Debug,
    Release,
}

impl BuildProfile {
    fn dir_name(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Release => "release",
        }
    }

    fn as_cargo_flag(self) -> Option<&'static str> {
        match self {
            Self::Debug => None,
            Self::Release => Some("--release"),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LambdaFunction {
    PolicyGrant,
    AssetMetadata,
}

impl LambdaFunction {
    const ALL: [Self; 2] = [Self::PolicyGrant, Self::AssetMetadata];

    fn bin_name(self) -> &'static str {
        match self {
            Self::PolicyGrant => "policy_grant_lambda",
            Self::AssetMetadata => "asset_metadata_lambda",
        }
    }

    fn artifact_name(self) -> &'static str {
        match self {
            Self::PolicyGrant => "policy_grant.zip",
            Self::AssetMetadata => "asset_metadata.zip",
        }
    }
}

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn run_cargo(args: &[&str]) -> Result<(), String> {
    eprintln!("+ cargo {}", args.join(" "));
    let status = Command::new("cargo")
        .args(args)
        .status()
        .map_err(|error| format!("failed to execute cargo: {error}"))?;
    if status.success() {
        Ok(())
    } else {
        Err(format!(
            "cargo {} exited with {}",
            args.first().copied().unwrap_or_default(),
            status
        ))
    }
}

fn package_serverless_lambdas(
    target: &str,
    profile: BuildProfile,
    functions: &[LambdaFunction],
    dist_dir: &Path,
) -> Result<(), String> {
    ensure_rust_target_installed(target)?;

    step("Build Lambda binaries");
    let mut cargo_args = vec!["build", "-p", LAMBDA_PACKAGE, "--target", target];
    for function in functions {
        cargo_args.extend(["--bin", function.bin_name()]);
    }
    if let Some(flag) = profile.as_cargo_flag() {
        cargo_args.push(flag);
    }
    run_cargo(&cargo_args)?;

    step("Package Lambda zip artifacts");
    let target_dir = Path::new("target").join(target).join(profile.dir_name());
    fs::create_dir_all(dist_dir)
        .map_err(|error| format!("failed to create {}: {error}", dist_dir.display()))?;

    let mut packaged = Vec::new();
    for function in functions {
        let zip_path = dist_dir.join(function.artifact_name());
        package_lambda_zip(&target_dir.join(function.bin_name()), &zip_path)?;
        packaged.push(zip_path);
    }

    eprintln!("\nPackaged artifacts:");
    for path in packaged {
        eprintln!("- {}", path.display());
    }
    Ok(())
}

fn ensure_rust_target_installed(target: &str) -> Result<(), String> {
    let output = match Command::new("rustup")
        .args(["target", "list", "--installed"])
        .output()
    {
        Ok(output) => output,
        Err(error) => {
            eprintln!(
                "warning: failed to run `rustup target list --installed` ({error}); continuing without target preflight"
            );
            return Ok(());
        }
    };

    if !output.status.success() {
        return Err(format!(
            "failed to list installed rust targets: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }

    let installed = String::from_utf8_lossy(&output.stdout);
    if installed.lines().any(|line| line.trim() == target) {
        Ok(())
    } else {
        Err(format!(
            "rust target `{target}` is not installed; run `rustup target add {target}`"
        ))
    }
}

fn package_lambda_zip(binary_path: &Path, zip_path: &Path) -> Result<(), String> {
    let binary = fs::read(binary_path).map_err(|error| {
        format!(
            "expected lambda binary at '{}': {error}",
            binary_path.display()
        )
    })?;
    let file = fs::File::create(zip_path)
        .map_err(|error| format!("failed to create {}: {error}", zip_path.display()))?;

    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o755);
    zip.start_file("bootstrap", options)
        .map_err(|error| format!("failed to start bootstrap entry: {error}"))?;
    zip.write_all(&binary)
        .map_err(|error| format!("failed to write bootstrap entry: {error}"))?;
    zip.finish()
        .map_err(|error| format!("failed to finish {}: {error}", zip_path.display()))?;
    Ok(())
}

fn ci_check() -> Result<(), String> {
    step("Check formatting");
    run_cargo(&["fmt", "--all", "--", "--check"])?;

    step("Clippy");
    run_cargo(&[
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ])?;

    step("Test datazone_pipeline_core");
    run_cargo(&["test", "-p", "datazone_pipeline_core"])?;

    step("Test datazone_pipeline_lambda");
    run_cargo(&["test", "-p", LAMBDA_PACKAGE])
}

fn ci_package() -> Result<(), String> {
    package_serverless_lambdas(
        "x86_64-unknown-linux-gnu",
        BuildProfile::Release,
        &LambdaFunction::ALL,
        Path::new("dist"),
    )
}

fn run(command: Commands) -> Result<(), String> {
    match command {
        Commands::Ci { job } => {
            match job {
                CiJob::Check => ci_check()?,
                CiJob::Package => ci_package()?,
                CiJob::All => {
                    ci_check()?;
                    ci_package()?;
                }
            }
            eprintln!("\nCI job passed.");
            Ok(())
        }
        Commands::ServerlessPackage {
            target,
            profile,
            function,
            dist_dir,
        } => {
            let functions = match function {
                Some(function) => vec![function],
                None => LambdaFunction::ALL.to_vec(),
            };
            package_serverless_lambdas(&target, profile, &functions, &dist_dir)
        }
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli.command) {
        eprintln!("error: {error}");
        exit(1);
    }
}
