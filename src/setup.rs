//! Interactive first-run setup.
//!
//! Installs the companion upstream (`cli-proxy-api`) if needed, runs its Claude
//! OAuth login, then starts the companion and the proxy together.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, BufReader, Lines};
use tokio::process::{Child, Command};
use tracing::info;

use crate::config::Config;
use crate::constants::{
    COMPANION_BINARIES, COMPANION_BREW_FORMULA, COMPANION_INSTALLER_URL, COMPANION_LOGIN_FLAG,
    COMPANION_RELEASES_URL, COMPANION_STARTUP_WAIT_MS,
};
use crate::error::ProxyError;
use crate::server::start_proxy;

#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("Cannot proceed without cli-proxy-api")]
    Declined,

    #[error(
        "Installation succeeded but binary not found in PATH. \
         Try restarting your terminal or add it to PATH manually."
    )]
    NotOnPath,

    #[error("{0} install failed. Install manually from: {url}", url = COMPANION_RELEASES_URL)]
    InstallFailed(&'static str),

    #[error("Unsupported platform: {0}. Download manually: {url}", url = COMPANION_RELEASES_URL)]
    UnsupportedPlatform(String),

    #[error("Auth failed or was cancelled")]
    AuthFailed,

    #[error("cli-proxy-api failed to start. Check your config.yaml")]
    CompanionExited,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    Proxy(#[from] ProxyError),
}

/// Reads y/n answers line by line.
pub struct Prompt<R> {
    lines: Lines<R>,
}

impl<R: AsyncRead + Unpin> Prompt<BufReader<R>> {
    pub fn new(input: R) -> Self {
        Self {
            lines: BufReader::new(input).lines(),
        }
    }
}

impl<R: AsyncBufRead + Unpin> Prompt<R> {
    /// Ask a yes/no question. End of input counts as "no".
    pub async fn confirm(&mut self, question: &str) -> std::io::Result<bool> {
        print!("{question} (y/n): ");
        std::io::stdout().flush()?;

        let answer = self.lines.next_line().await?.unwrap_or_default();
        Ok(is_yes(&answer))
    }
}

fn is_yes(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("y")
}

/// Find the companion binary on PATH under any of its known names.
pub fn find_companion_binary() -> Option<PathBuf> {
    COMPANION_BINARIES
        .iter()
        .find_map(|name| which::which(name).ok())
}

/// Shell command that installs the companion on `os`, if supported.
fn install_command(os: &str) -> Result<(&'static str, Vec<String>), SetupError> {
    match os {
        "macos" => Ok((
            "brew",
            vec!["install".to_string(), COMPANION_BREW_FORMULA.to_string()],
        )),
        "linux" => Ok((
            "bash",
            vec![
                "-c".to_string(),
                format!("curl -fsSL {COMPANION_INSTALLER_URL} | bash"),
            ],
        )),
        other => Err(SetupError::UnsupportedPlatform(other.to_string())),
    }
}

async fn install_companion() -> Result<(), SetupError> {
    let (program, args) = install_command(std::env::consts::OS)?;
    let source = if program == "brew" {
        "Homebrew"
    } else {
        "Official installer"
    };
    println!("Installing via {source}...");

    let status = Command::new(program).args(&args).status().await?;
    if !status.success() {
        return Err(SetupError::InstallFailed(source));
    }

    println!("Installation complete!");
    Ok(())
}

async fn run_login(binary: &Path) -> Result<(), SetupError> {
    println!("\nStarting Claude OAuth flow...");
    println!("Complete the login in your browser.\n");

    let status = Command::new(binary)
        .arg(COMPANION_LOGIN_FLAG)
        .status()
        .await?;
    if !status.success() {
        return Err(SetupError::AuthFailed);
    }

    println!("\nAuth complete!");
    Ok(())
}

/// Spawn the companion, relaying its output with a `[cli-proxy-api]` prefix.
/// The process is killed when the returned handle is dropped.
async fn spawn_companion(binary: &Path) -> Result<Child, SetupError> {
    let mut child = Command::new(binary)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    info!(pid = ?child.id(), binary = %binary.display(), "Spawned cli-proxy-api");

    if let Some(stdout) = child.stdout.take() {
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                println!("[cli-proxy-api] {line}");
            }
        });
    }
    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                eprintln!("[cli-proxy-api] {line}");
            }
        });
    }

    tokio::time::sleep(Duration::from_millis(COMPANION_STARTUP_WAIT_MS)).await;

    if child.try_wait()?.is_some() {
        return Err(SetupError::CompanionExited);
    }
    Ok(child)
}

/// Run the interactive setup, reading answers from stdin.
pub async fn run_setup(config: &Config) -> Result<(), SetupError> {
    let mut prompt = Prompt::new(tokio::io::stdin());

    println!("\n=== claude-oc-proxy setup ===\n");

    let binary = match find_companion_binary() {
        Some(binary) => {
            println!("cli-proxy-api found: {}", binary.display());
            binary
        }
        None => {
            println!("cli-proxy-api not found.");
            if !prompt.confirm("Install cli-proxy-api?").await? {
                return Err(SetupError::Declined);
            }
            install_companion().await?;
            find_companion_binary().ok_or(SetupError::NotOnPath)?
        }
    };

    if prompt.confirm("\nRun Claude OAuth login?").await? {
        run_login(&binary).await?;
    }

    if !prompt.confirm("\nStart proxy stack now?").await? {
        println!("\nSetup complete. Run manually:");
        println!("  Terminal 1: {}", binary.display());
        println!("  Terminal 2: claude-oc-proxy");
        return Ok(());
    }

    println!("\nStarting cli-proxy-api...");
    let mut companion = spawn_companion(&binary).await?;

    println!("Starting claude-oc-proxy...\n");
    let result = start_proxy(config).await;

    info!("Stopping cli-proxy-api");
    if let Err(e) = companion.kill().await {
        tracing::warn!("Failed to stop cli-proxy-api: {e}");
    }

    result.map_err(SetupError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y"));
        assert!(is_yes("Y\n"));
        assert!(is_yes("  y  "));
        assert!(!is_yes("yes"));
        assert!(!is_yes("n"));
        assert!(!is_yes(""));
    }

    #[tokio::test]
    async fn test_prompt_reads_answers_in_order() {
        let mut prompt = Prompt::new(&b"y\nn\nY\n"[..]);
        assert!(prompt.confirm("first?").await.unwrap());
        assert!(!prompt.confirm("second?").await.unwrap());
        assert!(prompt.confirm("third?").await.unwrap());
        // End of input means no
        assert!(!prompt.confirm("fourth?").await.unwrap());
    }

    #[test]
    fn test_install_command_per_platform() {
        let (program, args) = install_command("macos").unwrap();
        assert_eq!(program, "brew");
        assert_eq!(args, ["install", "cliproxyapi"]);

        let (program, args) = install_command("linux").unwrap();
        assert_eq!(program, "bash");
        assert_eq!(args[0], "-c");
        assert!(args[1].starts_with("curl -fsSL https://"));
        assert!(args[1].ends_with("| bash"));

        assert!(matches!(
            install_command("windows"),
            Err(SetupError::UnsupportedPlatform(os)) if os == "windows"
        ));
    }

    #[test]
    fn test_setup_error_messages() {
        let err = SetupError::UnsupportedPlatform("freebsd".to_string());
        assert_eq!(
            err.to_string(),
            "Unsupported platform: freebsd. Download manually: https://github.com/router-for-me/CLIProxyAPI/releases"
        );
    }
}
