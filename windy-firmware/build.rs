//! Build script for windy-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates tile.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate tile.toml configuration at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=tile.toml");

    let config_path = Path::new("tile.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: tile.toml not found!                                     ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a tile.toml configuration file.           ║\n\
            ║  Please create one in the windy-firmware directory.              ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read tile.toml                                 ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in tile.toml                         ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let mut errors = Vec::new();
    validate_known_sections(&config, &mut errors);
    validate_wifi(&config, &mut errors);
    validate_server(&config, &mut errors);
    validate_views(&config, &mut errors);
    validate_numbers(&config, &mut errors);

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid tile.toml                                        ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    println!("cargo:warning=tile.toml validated successfully");
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Keys the firmware's parser understands, per section
const KNOWN_KEYS: &[(&str, &[&str])] = &[
    ("wifi", &["ssid", "passphrase"]),
    ("server", &["host", "port"]),
    ("panel", &["width", "height"]),
    (
        "timing",
        &["refresh_s", "flip_s", "retry_backoff_s", "download_deadline_s"],
    ),
];

fn validate_known_sections(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(root) = config.as_table() else {
        errors.push("top level must be a table".to_string());
        return;
    };

    for (section, value) in root {
        if section == "view" {
            continue;
        }
        let Some(keys) = KNOWN_KEYS
            .iter()
            .find(|(name, _)| *name == section.as_str())
            .map(|(_, keys)| *keys)
        else {
            errors.push(format!("unknown section [{}]", section));
            continue;
        };
        if let Some(table) = value.as_table() {
            for key in table.keys() {
                if !keys.contains(&key.as_str()) {
                    errors.push(format!("[{}] unknown key '{}'", section, key));
                }
            }
        }
    }
}

fn require_string(
    config: &toml::Value,
    section: &str,
    key: &str,
    max_len: usize,
    errors: &mut Vec<String>,
) {
    match config.get(section).and_then(|s| s.get(key)) {
        Some(toml::Value::String(s)) if s.is_empty() => {
            errors.push(format!("[{}] '{}' cannot be empty", section, key));
        }
        Some(toml::Value::String(s)) if s.len() > max_len => {
            errors.push(format!("[{}] '{}' longer than {} bytes", section, key, max_len));
        }
        Some(toml::Value::String(_)) => {}
        Some(_) => errors.push(format!("[{}] '{}' must be a string", section, key)),
        None => errors.push(format!("[{}] missing '{}'", section, key)),
    }
}

fn validate_wifi(config: &toml::Value, errors: &mut Vec<String>) {
    require_string(config, "wifi", "ssid", 32, errors);
    require_string(config, "wifi", "passphrase", 64, errors);
}

fn validate_server(config: &toml::Value, errors: &mut Vec<String>) {
    require_string(config, "server", "host", 64, errors);
    if let Some(port) = config.get("server").and_then(|s| s.get("port")) {
        match port.as_integer() {
            Some(p) if (1..=65535).contains(&p) => {}
            _ => errors.push("[server] port must be 1-65535".to_string()),
        }
    }
}

fn validate_views(config: &toml::Value, errors: &mut Vec<String>) {
    let views = match config.get("view") {
        Some(toml::Value::Table(t)) => t,
        Some(_) => {
            errors.push("[view] must be a table of [view.<name>] sections".to_string());
            return;
        }
        None => {
            errors.push("Missing [view.*] section - at least one view is required".to_string());
            return;
        }
    };

    if views.len() > 2 {
        errors.push("at most 2 [view.*] sections are supported".to_string());
    }

    for (name, view) in views {
        if name.len() > 16 {
            errors.push(format!("[view.{}] name longer than 16 bytes", name));
        }
        match view.get("path") {
            Some(toml::Value::String(path)) if path.starts_with('/') && path.len() <= 64 => {}
            Some(_) => errors.push(format!(
                "[view.{}] path must start with '/' and be at most 64 bytes",
                name
            )),
            None => errors.push(format!("[view.{}] missing 'path'", name)),
        }
    }
}

fn validate_numbers(config: &toml::Value, errors: &mut Vec<String>) {
    let ranges: &[(&str, &str, i64, i64)] = &[
        ("panel", "width", 1, 1024),
        ("panel", "height", 1, 768),
        ("timing", "refresh_s", 60, 86_400),
        ("timing", "flip_s", 1, 3_600),
        ("timing", "retry_backoff_s", 1, 3_600),
        ("timing", "download_deadline_s", 5, 600),
    ];

    for &(section, key, min, max) in ranges {
        let Some(value) = config.get(section).and_then(|s| s.get(key)) else {
            continue;
        };
        match value.as_integer() {
            Some(v) if (min..=max).contains(&v) => {}
            _ => errors.push(format!("[{}] {} must be {}-{}", section, key, min, max)),
        }
    }
}
