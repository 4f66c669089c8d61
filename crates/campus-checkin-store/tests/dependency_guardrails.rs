// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

#[test]
fn store_crate_stays_below_the_http_layer() {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let cargo_toml =
        std::fs::read_to_string(manifest_dir.join("Cargo.toml")).expect("read Cargo.toml");
    for forbidden in ["campus-checkin-api", "campus-checkin-server", "axum"] {
        assert!(
            !cargo_toml.contains(forbidden),
            "forbidden dependency in store crate: {forbidden}"
        );
    }
}
