fn main() {
    let timestamp = chrono::Utc::now().format("%Y%m%d%H%M");
    let version = std::env::var("CARGO_PKG_VERSION").unwrap_or_default();
    println!("cargo:rustc-env=BUILD_VERSION={version}+{timestamp}");
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=assets/admin.css");

    // linkall.x has to come last
    println!("cargo:rustc-link-arg=-Tlinkall.x");
}
