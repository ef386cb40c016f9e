//! Build script for Calorie Tracker
//!
//! Embeds a build number and timestamp. The number comes from
//! `CALTRACK_BUILD_NUMBER` when set (CI builds), otherwise from a local
//! counter that is bumped on every recompilation.

use std::env;
use std::fs;
use std::path::Path;

const COUNTER_FILE: &str = "build_number.txt";

fn read_counter(path: &Path) -> u64 {
    fs::read_to_string(path)
        .ok()
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(0)
}

fn next_local_build(path: &Path) -> u64 {
    let build = read_counter(path) + 1;
    if let Err(e) = fs::write(path, build.to_string()) {
        // An unwritable checkout still builds, the number just won't advance
        println!("cargo:warning=Could not update {}: {e}", path.display());
    }
    build
}

fn main() {
    println!("cargo:rerun-if-changed=src");
    println!("cargo:rerun-if-changed=Cargo.toml");
    println!("cargo:rerun-if-env-changed=CALTRACK_BUILD_NUMBER");

    let pinned = env::var("CALTRACK_BUILD_NUMBER")
        .ok()
        .and_then(|raw| raw.trim().parse::<u64>().ok());

    let build = match pinned {
        Some(build) => build,
        None => next_local_build(Path::new(COUNTER_FILE)),
    };

    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();

    println!("cargo:rustc-env=CALTRACK_BUILD_NUMBER={build}");
    println!("cargo:rustc-env=CALTRACK_BUILD_TIMESTAMP={timestamp}");

    println!("cargo:warning=Calorie Tracker build #{build} at {timestamp}");
}
