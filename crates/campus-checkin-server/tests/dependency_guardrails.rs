#[test]
fn server_crate_does_not_depend_on_cli() {
    let manifest = std::fs::read_to_string(concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml"))
        .expect("read Cargo.toml");
    for forbidden in ["campus-checkin-cli", "clap", "reqwest"] {
        assert!(
            !manifest.contains(forbidden),
            "server crate must not depend on {forbidden}"
        );
    }
}
