use std::process::Command;

fn emit(key: &str, value: &str) {
    println!("cargo:rustc-env=BIRDWATCH_{key}={value}");
}

fn git_short_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout)
        .ok()
        .map(|s| s.trim().to_string())
}

fn main() {
    emit(
        "GIT_HASH",
        &git_short_hash().unwrap_or_else(|| "unknown".to_string()),
    );

    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());
    emit("BUILD_PROFILE", &profile);

    println!("cargo:rerun-if-changed=../../.git/HEAD");
    println!("cargo:rerun-if-changed=../../.git/refs");
}
