use std::process::Command;

#[test]
fn prints_only_the_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_jenkinsapi-version"))
        .output()
        .expect("could not run jenkinsapi-version");

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        env!("CARGO_PKG_VERSION")
    );
    assert!(output.stderr.is_empty());
}
