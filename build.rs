// build.rs
use std::fs;
use std::process::Command;

fn main() {
    let git_version = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string());

    println!("cargo:rustc-env=PLACER_VERSION_GIT={}", git_version);
    println!("cargo:rerun-if-changed=.git/HEAD");
    // a new commit moves the branch ref, not HEAD
    if let Ok(head) = fs::read_to_string(".git/HEAD") {
        if let Some(branch) = head.trim().strip_prefix("ref: ") {
            println!("cargo:rerun-if-changed=.git/{}", branch);
        }
    }
    println!("cargo:rerun-if-changed=.git/packed-refs");
}
