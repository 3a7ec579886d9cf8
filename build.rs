fn main() {
    println!("cargo:rerun-if-env-changed=ASCIIFIELD_BUILD");
    println!("cargo:rerun-if-env-changed=GITHUB_SHA");

    let build_id = match std::env::var("ASCIIFIELD_BUILD") {
        Ok(v) if !v.is_empty() => v,
        _ => target_label(),
    };
    println!("cargo:rustc-env=ASCIIFIELD_BUILD={}", build_id);

    let sha = std::env::var("GITHUB_SHA")
        .ok()
        .and_then(|v| short_sha(&v))
        .unwrap_or_default();
    println!("cargo:rustc-env=ASCIIFIELD_GIT_SHA={}", sha);
}

fn short_sha(v: &str) -> Option<String> {
    let v = v.trim();
    let short = &v[..v.len().min(7)];
    if !short.is_empty() && short.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(short.to_ascii_lowercase())
    } else {
        None
    }
}

fn target_label() -> String {
    let os = match std::env::var("CARGO_CFG_TARGET_OS").as_deref() {
        Ok("macos") => "darwin".to_string(),
        Ok(other) => other.to_string(),
        Err(_) => "unknown".to_string(),
    };
    let arch = std::env::var("CARGO_CFG_TARGET_ARCH").unwrap_or_else(|_| "unknown".to_string());
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());
    format!("{os}-{arch}-{profile}")
}
