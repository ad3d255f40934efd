use std::process::Command;

/// Short commit hash of the checkout, if this is a git checkout at all.
fn git_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())?;
    let hash = String::from_utf8(output.stdout).ok()?;
    Some(hash.trim().to_string()).filter(|h| !h.is_empty())
}

fn main() {
    for path in ["build.rs", "Cargo.toml", ".git/HEAD", ".git/refs/heads/"] {
        println!("cargo::rerun-if-changed={path}");
    }

    let build_time = chrono::Utc::now().format("%Y-%m-%d %H:%M UTC");
    // Set by cargo for build scripts: "debug" or "release"
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());

    println!(
        "cargo::rustc-env=GIT_HASH={}",
        git_hash().as_deref().unwrap_or("unknown")
    );
    println!("cargo::rustc-env=BUILD_TIME={build_time}");
    println!("cargo::rustc-env=BUILD_PROFILE={profile}");
}
