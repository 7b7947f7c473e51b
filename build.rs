// build.rs

use chrono::Utc;

fn main() {
    // Stamp the build time so the banner and status screen can report it
    let stamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
    println!("cargo:rustc-env=KOMONS_BUILD_DATE={}", stamp);

    // Only re-run when the build script itself changes
    println!("cargo:rerun-if-changed=build.rs");
}
