// crates/certus-cli/src/main.rs
// ============================================================================
// Module: Certus CLI Entry Point
// Description: Command dispatcher for the Certus evidence service.
// Purpose: Run the HTTP service and offline key and verification tasks.
// Dependencies: clap, certus-core, certus-config, certus-server, tokio.
// ============================================================================

//! ## Overview
//! The `certus` binary starts the evidence service, verifies stored bundles
//! against the configured store and key history, generates signing keys,
//! and validates configuration files. Security posture: key files and
//! configuration are operator inputs; see `Docs/security/threat_model.md`.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use certus_config::CertusConfig;
use certus_config::config_toml_example;
use certus_core::BundleId;
use certus_core::SigningBackend;
use certus_core::VerificationResult;
use certus_core::VerifyError;
use certus_core::runtime::Ed25519Signer;
use certus_core::runtime::signing::encode_public_key;
use certus_server::Backends;
use certus_server::CertusServer;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "certus", version, disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the evidence HTTP service.
    Serve(ServeCommand),
    /// Verify a stored evidence bundle.
    Verify(VerifyCommand),
    /// Generate an Ed25519 signing key file.
    Keygen(KeygenCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Arguments for `serve`.
#[derive(Args, Debug)]
struct ServeCommand {
    /// Optional config file path (defaults to certus.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Arguments for `verify`.
#[derive(Args, Debug)]
struct VerifyCommand {
    /// Evidence id returned at submission.
    #[arg(long, value_name = "ID")]
    evidence_id: String,
    /// Optional config file path (defaults to certus.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Arguments for `keygen`.
#[derive(Args, Debug)]
struct KeygenCommand {
    /// Destination for the base64 seed; must not exist.
    #[arg(long, value_name = "PATH")]
    out: PathBuf,
}

/// Configuration subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a configuration file.
    Validate(ConfigValidateCommand),
    /// Print an annotated example configuration.
    Example,
}

/// Arguments for `config validate`.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Optional config file path (defaults to certus.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Serve(command) => command_serve(command).await,
        Commands::Verify(command) => command_verify(command).await,
        Commands::Keygen(command) => command_keygen(&command),
        Commands::Config {
            command,
        } => command_config(command),
    }
}

// ============================================================================
// SECTION: Serve Command
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(command: ServeCommand) -> CliResult<ExitCode> {
    let config = CertusConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    let bind = config.server.bind.clone();
    let server = tokio::task::spawn_blocking(move || CertusServer::from_config(&config))
        .await
        .map_err(|err| CliError::new(format!("server init join failed: {err}")))?
        .map_err(|err| CliError::new(format!("server init failed: {err}")))?;
    write_stderr_line(&format!("certus listening on {bind}"))
        .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    server.serve().await.map_err(|err| CliError::new(format!("server failed: {err}")))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Verify Command
// ============================================================================

/// Executes the `verify` command.
///
/// Exits with failure when content, signature, or payloads do not check out.
/// Log issues alone are reported but do not fail the command.
async fn command_verify(command: VerifyCommand) -> CliResult<ExitCode> {
    let config = CertusConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    let evidence_id = command.evidence_id;
    let result = tokio::task::spawn_blocking(move || verify_evidence(&config, &evidence_id))
        .await
        .map_err(|err| CliError::new(format!("verification join failed: {err}")))??;
    let rendered = serde_json::to_string_pretty(&result)
        .map_err(|err| CliError::new(format!("failed to render result: {err}")))?;
    write_stdout_line(&rendered).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    if result.is_intact() { Ok(ExitCode::SUCCESS) } else { Ok(ExitCode::FAILURE) }
}

/// Verifies one bundle against the configured durable backends.
fn verify_evidence(config: &CertusConfig, evidence_id: &str) -> CliResult<VerificationResult> {
    let evidence_id = evidence_id.trim();
    if evidence_id.is_empty() {
        return Err(CliError::new("evidence id must be non-empty".to_string()));
    }
    let backends = Backends::for_verification(config)
        .map_err(|err| CliError::new(format!("failed to open backends: {err}")))?;
    backends.verifier().verify(&BundleId::new(evidence_id)).map_err(|err| match err {
        VerifyError::NotFound(id) => CliError::new(format!("evidence not found: {id}")),
        other => CliError::new(format!("verification failed: {other}")),
    })
}

// ============================================================================
// SECTION: Keygen Command
// ============================================================================

/// Executes the `keygen` command.
fn command_keygen(command: &KeygenCommand) -> CliResult<ExitCode> {
    let signer = Ed25519Signer::generate();
    write_key_file(&command.out, &signer)?;
    write_stdout_line(&format!("public_key: {}", encode_public_key(&signer.verifying_key())))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line(&format!("key_id: {}", signer.key_id()))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Writes the signer seed to a new file, refusing to overwrite.
fn write_key_file(path: &Path, signer: &Ed25519Signer) -> CliResult<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options
        .open(path)
        .map_err(|err| CliError::new(format!("failed to create {}: {err}", path.display())))?;
    writeln!(file, "{}", signer.seed_base64())
        .map_err(|err| CliError::new(format!("failed to write {}: {err}", path.display())))?;
    Ok(())
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(command) => command_config_validate(&command),
        ConfigCommand::Example => {
            write_stdout_line(config_toml_example().trim_end())
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Executes the config validation command.
fn command_config_validate(command: &ConfigValidateCommand) -> CliResult<ExitCode> {
    let _config = CertusConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    write_stdout_line("config ok").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
