// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

#[test]
fn directory_enums_are_non_exhaustive() {
    let src_root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("src");
    for file in ["role.rs", "directory.rs"] {
        let path = src_root.join(file);
        let text = std::fs::read_to_string(&path).expect("read source");
        for line in text.lines() {
            if !line.starts_with("pub enum ") {
                continue;
            }
            let idx = text.find(line).expect("enum line in source text");
            let window = &text[idx.saturating_sub(160)..idx];
            assert!(
                window.contains("#[non_exhaustive]"),
                "public enum without #[non_exhaustive] in {}: {}",
                path.display(),
                line.trim()
            );
        }
    }
}
