//! Integration Test: Blocking I/O Prohibition
//!
//! **Policy**: Async production code in the core and the CLI MUST NOT use
//! blocking I/O.
//! **Required**: Use `tokio::fs`, `tokio::net`, `tokio::io`, not `std::fs`,
//! `std::net`, or blocking stdin/stdout inside async functions.
//!
//! Non-async setup code (configuration loading before the runtime hot path,
//! CLI argument parsing) and test code are exempt.

use std::fs;
use std::path::{Path, PathBuf};

/// Production source trees checked by this test
fn production_dirs() -> Vec<PathBuf> {
    let workspace_root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../..");
    vec![
        workspace_root.join("core/src"),
        workspace_root.join("cli/src"),
    ]
}

/// Test that async production code does not use blocking I/O
#[test]
fn test_no_blocking_io_in_production_code() {
    let mut violations = Vec::new();
    for dir in production_dirs() {
        check_directory(&dir, &mut violations);
    }

    if !violations.is_empty() {
        eprintln!("\nBlocking I/O calls found in async production code!\n");
        for violation in &violations {
            eprintln!("  {violation}");
        }
        eprintln!("\nFORBIDDEN blocking I/O in async code:");
        eprintln!("  - std::fs::read(), std::fs::write(), std::fs::File");
        eprintln!("  - std::net::TcpStream, std::net::TcpListener");
        eprintln!("  - std::thread::sleep()");
        eprintln!("  - reqwest::blocking::*");
        eprintln!("  - std::io::stdin() / std::io::stdout() in async functions");
        eprintln!("\nREQUIRED async I/O:");
        eprintln!("  - tokio::fs::read().await, tokio::fs::write().await");
        eprintln!("  - tokio::time::sleep().await");
        eprintln!("  - tokio::io::stdin() / tokio::io::stdout()");

        panic!(
            "\nFound {} blocking I/O violation(s) in production code.\nFix these before merging!",
            violations.len()
        );
    }
}

fn check_directory(dir: &Path, violations: &mut Vec<String>) {
    assert!(
        dir.exists(),
        "production source directory missing: {}",
        dir.display()
    );

    for entry in walkdir::WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
        if entry.path().extension().and_then(|s| s.to_str()) == Some("rs") {
            check_file(entry.path(), violations);
        }
    }
}

fn check_file(path: &Path, violations: &mut Vec<String>) {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => return,
    };

    let lines: Vec<&str> = content.lines().collect();
    let mut in_test_module = false;

    for (idx, line) in lines.iter().enumerate() {
        let line_number = idx + 1;

        // Everything after a #[cfg(test)] module marker is test code
        if line.trim_start().starts_with("#[cfg(test)]") {
            in_test_module = true;
        }
        if in_test_module {
            continue;
        }

        // Skip comments
        let code_part = line.split("//").next().unwrap_or(line);

        // Check for blocking file system I/O in async functions
        if code_part.contains("std::fs::") && is_in_async_function(&lines, idx) {
            violations.push(format!(
                "{}:{} - Blocking file I/O in async: {}",
                path.display(),
                line_number,
                line.trim()
            ));
        }

        // Check for blocking network I/O
        if code_part.contains("std::net::") {
            violations.push(format!(
                "{}:{} - Blocking network I/O: {}",
                path.display(),
                line_number,
                line.trim()
            ));
        }

        // Check for thread sleeps
        if code_part.contains("std::thread::sleep") || code_part.contains("thread::sleep(") {
            violations.push(format!(
                "{}:{} - Thread sleep: {}",
                path.display(),
                line_number,
                line.trim()
            ));
        }

        // Check for blocking HTTP client
        if code_part.contains("reqwest::blocking") {
            violations.push(format!(
                "{}:{} - Blocking HTTP client: {}",
                path.display(),
                line_number,
                line.trim()
            ));
        }

        // Check for blocking stdin/stdout in async context
        if (code_part.contains("std::io::stdin()") || code_part.contains("std::io::stdout()"))
            && is_in_async_function(&lines, idx)
        {
            violations.push(format!(
                "{}:{} - Blocking stdin/stdout in async: {}",
                path.display(),
                line_number,
                line.trim()
            ));
        }
    }
}

/// Check if a line is inside an async function
///
/// Scans backwards to the nearest function definition. Coarse but effective
/// for the flat function bodies in this workspace.
fn is_in_async_function(lines: &[&str], current_idx: usize) -> bool {
    for i in (0..=current_idx).rev() {
        let line = lines[i].trim();
        if line.contains("fn ") {
            return line.contains("async fn");
        }
        // Module boundary means we left any function body
        if line.starts_with("mod ") || line.starts_with("pub mod ") {
            return false;
        }
    }
    false
}
