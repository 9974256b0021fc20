//! Run the `jenkins-invoke` binary against a fake Jenkins server.

use std::process::{Command, Output};

use mockito::Server;

/// Run `jenkins-invoke` with `args`, using `jenkins_url` as `JENKINS_URL`.
fn jenkins_invoke(jenkins_url: &str, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_jenkins-invoke"))
        .args(args)
        .env("JENKINS_URL", jenkins_url)
        .env_remove("RUST_LOG")
        .output()
        .expect("could not run jenkins-invoke")
}

#[test]
fn no_jobs_prints_help_and_fails() {
    // Nothing listens here, so any request would fail loudly.
    let output = jenkins_invoke("http://127.0.0.1:9", &[]);

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage: jenkins-invoke [OPTIONS] <JOBS>..."));
    assert!(stdout.contains("--jenkinsbase"));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("At least one job must be specified!"));
}

#[test]
fn jenkins_url_supplies_the_default_server() {
    let mut server = Server::new();
    let job_mock = server
        .mock("GET", "/job/build-A/api/json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"name": "build-A", "url": "http://ci/job/build-A/"}"#)
        .expect(1)
        .create();
    let _crumb = server
        .mock("GET", "/crumbIssuer/api/json")
        .with_status(404)
        .create();
    let trigger_mock = server
        .mock("POST", "/job/build-A/build")
        .with_status(201)
        .with_header("location", "/queue/item/1/")
        .expect(1)
        .create();

    let output = jenkins_invoke(&server.url(), &["build-A"]);

    assert!(output.status.success(), "{:?}", output);
    job_mock.assert();
    trigger_mock.assert();
}

#[test]
fn unknown_job_exits_nonzero() {
    let mut server = Server::new();
    let _job = server
        .mock("GET", "/job/nope/api/json")
        .with_status(404)
        .create();

    let output = jenkins_invoke(&server.url(), &["nope"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown job \"nope\""));
}

#[test]
fn version_flag() {
    let output = jenkins_invoke("http://127.0.0.1:9", &["--version"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim(),
        format!("jenkins-invoke {}", env!("CARGO_PKG_VERSION"))
    );
}
