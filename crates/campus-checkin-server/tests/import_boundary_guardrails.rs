fn rust_files_under(root: &std::path::Path) -> Vec<std::path::PathBuf> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in std::fs::read_dir(&dir).expect("read dir") {
            let path = entry.expect("entry").path();
            if path.is_dir() {
                stack.push(path);
            } else if path.extension().and_then(|ext| ext.to_str()) == Some("rs") {
                out.push(path);
            }
        }
    }
    out.sort();
    out
}

/// Source text ahead of the first `#[cfg(test)]` module.
fn production_source(path: &std::path::Path) -> String {
    let text = std::fs::read_to_string(path).expect("read source file");
    text.split("#[cfg(test)]")
        .next()
        .unwrap_or_default()
        .to_string()
}

fn assert_free_of(dir: &str, forbidden: &[&str]) {
    let root = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(dir);
    for path in rust_files_under(&root) {
        let production = production_source(&path);
        for token in forbidden {
            assert!(
                !production.contains(token),
                "file {} contains forbidden token: {}",
                path.display(),
                token
            );
        }
    }
}

#[test]
fn services_do_not_depend_on_http() {
    assert_free_of("src/services", &["axum::", "crate::http::", "campus_checkin_api::"]);
}

#[test]
fn http_layer_does_not_reach_storage_backends() {
    assert_free_of(
        "src/http",
        &["SqliteLedger", "InMemoryLedger", "rusqlite::", "std::fs::"],
    );
}

#[test]
fn library_code_does_not_unwrap() {
    for dir in ["src/services", "src/http", "src/middleware", "src/runtime"] {
        let root = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(dir);
        for path in rust_files_under(&root) {
            let production = production_source(&path);
            assert!(
                !production.contains(".unwrap()"),
                "file {} unwraps outside tests",
                path.display()
            );
        }
    }
}

#[test]
fn test_modules_are_excluded_from_boundary_scans() {
    let path = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("src/http/request_tracing.rs");
    let full = std::fs::read_to_string(&path).expect("read source file");
    let production = production_source(&path);
    assert!(full.contains("InMemoryLedger"));
    assert!(!production.contains("InMemoryLedger"));
    assert!(production.contains("fn extract_request_trace"));
}
