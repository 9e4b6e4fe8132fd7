use std::path::Path;
use std::process::Command;

const SHA_VAR: &str = "TRISYNC_BUILD_SHA";

/// Short commit of the workspace, if it is a git checkout
fn git_sha(workspace: &Path) -> Option<String> {
    let out = Command::new("git")
        .arg("-C")
        .arg(workspace)
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }
    let sha = String::from_utf8(out.stdout).ok()?.trim().to_string();
    (!sha.is_empty()).then_some(sha)
}

fn main() {
    println!("cargo:rerun-if-env-changed={SHA_VAR}");

    // Packagers building from a tarball can pin the version string
    let sha = std::env::var(SHA_VAR).ok().filter(|s| !s.trim().is_empty()).or_else(|| {
        let manifest = std::env::var("CARGO_MANIFEST_DIR").ok()?;
        git_sha(Path::new(&manifest).parent()?)
    });

    println!("cargo:rustc-env={SHA_VAR}={}", sha.as_deref().unwrap_or("unknown"));
}
