use std::env;
use std::path::{Path, PathBuf};

#[path = "build/api.rs"]
mod api;

/// How the WORLD library ended up being provided.
enum Linkage {
    /// Found an installed library through pkg-config.
    System,
    /// Compiled from the source tree under `World/`.
    Bundled,
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=WORLD_NO_PKG_CONFIG");
    println!("cargo:rustc-check-cfg=cfg(world_stub_bindings)");

    // Force a bundled build when requested
    let use_bundled = env::var("CARGO_FEATURE_BUNDLED").is_ok()
        || env::var("CARGO_FEATURE_STATIC").is_ok();

    // Check if we're in a docs.rs build
    let is_docs_rs = env::var("DOCS_RS").is_ok();

    if is_docs_rs {
        println!("cargo:warning=Building on docs.rs - using stub bindings");
        emit_stub();
        return;
    }

    let linkage = if use_bundled {
        try_build_bundled()
    } else {
        try_pkg_config().or_else(|| {
            let bundled = try_build_bundled();
            if bundled.is_some() {
                println!("cargo:warning=Falling back to bundled WORLD build");
            }
            bundled
        })
    };

    match linkage {
        Some(Linkage::System) => {
            println!("cargo:info=Linked against system WORLD library");
            println!("cargo:stub=0");
        }
        Some(Linkage::Bundled) => {
            println!("cargo:info=Linked against bundled WORLD build");
            println!("cargo:stub=0");
        }
        None => {
            println!("cargo:warning=WORLD library not available - using stub bindings");
            println!("cargo:warning=The crate will compile but the engine cannot be called at runtime");
            emit_stub();
        }
    }
}

/// Mark this build as stubbed, both for this crate and for dependents
/// (visible to them as `DEP_WORLD_STUB`).
fn emit_stub() {
    println!("cargo:rustc-cfg=world_stub_bindings");
    println!("cargo:stub=1");
}

/// Try to find WORLD using pkg-config.
fn try_pkg_config() -> Option<Linkage> {
    if env::var("WORLD_NO_PKG_CONFIG").is_ok() {
        return None;
    }

    let statik = env::var("CARGO_FEATURE_STATIC").is_ok();

    // pkg-config emits the link directives itself on success
    // Newer releases change CheapTrick's option layout; linking one of
    // those against these declarations would corrupt memory.
    for name in ["world", "libworld"] {
        match pkg_config::Config::new()
            .range_version(api::MIN_VERSION..api::MAX_VERSION)
            .statik(statik)
            .probe(name)
        {
            Ok(_) => return Some(Linkage::System),
            Err(e) => println!("cargo:warning=pkg-config could not find {}: {}", name, e),
        }
    }

    None
}

/// Try to build WORLD from a source tree placed next to this crate.
fn try_build_bundled() -> Option<Linkage> {
    println!("cargo:info=Attempting to build WORLD from bundled source");

    let world_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").ok()?).join("World");
    let src_dir = world_dir.join("src");

    if !src_dir.exists() {
        println!("cargo:warning=Bundled WORLD source not found at {:?}", src_dir);
        return None;
    }

    let header = src_dir.join("world").join("cheaptrick.h");
    match std::fs::read_to_string(&header) {
        Ok(text) if api::cheaptrick_header_matches(&text) => {}
        Ok(_) => {
            println!(
                "cargo:warning=Bundled WORLD at {:?} is {} or newer; world-sys needs an older release",
                world_dir,
                api::MAX_VERSION
            );
            return None;
        }
        Err(e) => {
            println!("cargo:warning=Cannot read {:?}: {}", header, e);
            return None;
        }
    }
    println!("cargo:rerun-if-changed={}", header.display());

    let cpp_files = collect_sources(&src_dir);
    if cpp_files.is_empty() {
        println!("cargo:warning=No C++ source files found in bundled WORLD");
        return None;
    }

    // The upstream tree keeps public headers in src/world/
    let mut build = cc::Build::new();
    build
        .cpp(true)
        .files(&cpp_files)
        .include(&src_dir)
        .warnings(false)
        .opt_level(2);

    if cfg!(target_os = "windows") {
        build.define("WIN32", None);
    }

    build.compile("world");

    for file in &cpp_files {
        println!("cargo:rerun-if-changed={}", file.display());
    }

    Some(Linkage::Bundled)
}

/// Collect every `.cpp` file directly under `dir`.
fn collect_sources(dir: &Path) -> Vec<PathBuf> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|entry| {
                let path = entry.ok()?.path();
                if path.extension().map(|e| e == "cpp").unwrap_or(false) {
                    Some(path)
                } else {
                    None
                }
            })
            .collect(),
        Err(_) => {
            println!("cargo:warning=Failed to read bundled WORLD src directory");
            Vec::new()
        }
    }
}
