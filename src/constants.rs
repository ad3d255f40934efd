/// Prefix added to tool names before they reach the upstream
pub const TOOL_PREFIX: &str = "oc_";

/// Model prefix that is stripped from the request and activates tool renaming
pub const ANTHROPIC_MODEL_PREFIX: &str = "anthropic/";

/// Model prefix that only activates tool renaming (model is left as-is)
pub const CLAUDE_MODEL_PREFIX: &str = "claude-";

/// Default listen port
pub const DEFAULT_PORT: u16 = 8318;

/// Default upstream base URL (cli-proxy-api's default listen address)
pub const DEFAULT_UPSTREAM: &str = "http://localhost:8317";

/// Default bind host
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Connect timeout for upstream requests. There is no total timeout: streamed
/// responses may legitimately run for minutes.
pub const UPSTREAM_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Names the companion upstream binary is installed under
pub static COMPANION_BINARIES: &[&str] = &["cli-proxy-api", "cliproxyapi"];

/// Homebrew formula for the companion on macOS
pub const COMPANION_BREW_FORMULA: &str = "cliproxyapi";

/// Official installer script for the companion on Linux
pub const COMPANION_INSTALLER_URL: &str = "https://raw.githubusercontent.com/brokechubb/cliproxyapi-installer/refs/heads/master/cliproxyapi-installer";

/// Release page for manual downloads
pub const COMPANION_RELEASES_URL: &str = "https://github.com/router-for-me/CLIProxyAPI/releases";

/// Flag that starts the companion's Claude OAuth login flow
pub const COMPANION_LOGIN_FLAG: &str = "-claude-login";

/// Grace period before checking that the spawned companion is still alive
pub const COMPANION_STARTUP_WAIT_MS: u64 = 2000;
