#![deny(unsafe_code)]

use std::process;

use clap::{CommandFactory, Parser};
use jenkinsapi_common::{
    prelude::*, tracing::level_filters::LevelFilter,
    tracing_support::initialize_tracing,
};

mod invoke;

use crate::invoke::Invoker;

/// The Jenkins server to use if neither `--jenkinsbase` nor `JENKINS_URL` is
/// given.
const DEFAULT_BASEURL: &str = "http://localhost/jenkins";

/// Command-line options, parsed using `clap`.
#[derive(Parser)]
#[command(
    version,
    override_usage = "jenkins-invoke [OPTIONS] <JOBS>...",
    about = "Execute a number of jenkins jobs on the server of your choice. \
             Optionally block until the jobs are complete."
)]
pub struct Opt {
    /// Jenkins server base url.
    #[arg(
        short = 'J',
        long = "jenkinsbase",
        env = "JENKINS_URL",
        default_value = DEFAULT_BASEURL
    )]
    pub baseurl: String,

    /// Username for jenkins authentication.
    #[arg(short = 'u', long = "username")]
    pub username: Option<String>,

    /// Password for jenkins user authentication.
    #[arg(short = 'p', long = "password")]
    pub password: Option<String>,

    /// Block until each of the jobs is complete.
    #[arg(short = 'b', long = "block")]
    pub block: bool,

    /// Optional security token.
    #[arg(short = 't', long = "token")]
    pub token: Option<String>,

    /// The jobs to invoke, in order.
    #[arg(value_name = "JOBS")]
    pub jobs: Vec<JobName>,
}

impl fmt::Debug for Opt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Opt")
            .field("baseurl", &self.baseurl)
            .field("username", &self.username)
            .field("block", &self.block)
            .field("jobs", &self.jobs)
            // Leave out `password` and `token`.
            .finish()
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    initialize_tracing(LevelFilter::INFO);
    let opt = Opt::parse();
    debug!("Args: {:?}", opt);

    if let Err(err) = run(&opt).await {
        error!("invocation failed: {:?}", err);
        process::exit(1);
    }
}

/// Check our arguments and invoke every job.
async fn run(opt: &Opt) -> Result<()> {
    require_jobs(opt)?;
    Invoker::new(opt)?.run().await
}

/// Fail with a help message unless we were given at least one job.
fn require_jobs(opt: &Opt) -> Result<()> {
    if opt.jobs.is_empty() {
        Opt::command()
            .print_help()
            .context("could not print help")?;
        return Err(format_err!("At least one job must be specified!"));
    }
    Ok(())
}

#[test]
fn parse_all_options() {
    let opt = Opt::try_parse_from(&[
        "jenkins-invoke",
        "-J",
        "http://ci.example.com",
        "-u",
        "alice",
        "-p",
        "hunter2",
        "-b",
        "--token",
        "secret",
        "build-A",
        "build-B",
    ])
    .unwrap();
    assert_eq!(opt.baseurl, "http://ci.example.com");
    assert_eq!(opt.username.as_deref(), Some("alice"));
    assert_eq!(opt.password.as_deref(), Some("hunter2"));
    assert!(opt.block);
    assert_eq!(opt.token.as_deref(), Some("secret"));
    let jobs = opt.jobs.iter().map(|j| j.as_str()).collect::<Vec<_>>();
    assert_eq!(jobs, vec!["build-A", "build-B"]);
    assert!(!format!("{:?}", opt).contains("hunter2"));
}

#[test]
fn defaults() {
    let opt = Opt::try_parse_from(&["jenkins-invoke", "-J", "http://ci", "build-A"])
        .unwrap();
    assert!(!opt.block);
    assert!(opt.username.is_none());
    assert!(opt.password.is_none());
    assert!(opt.token.is_none());
}

#[test]
fn missing_jobs_is_an_error() {
    let opt = Opt::try_parse_from(&["jenkins-invoke", "-J", "http://ci"]).unwrap();
    let err = require_jobs(&opt).unwrap_err();
    assert_eq!(err.to_string(), "At least one job must be specified!");
}

#[test]
fn blank_job_names_are_rejected() {
    let err = Opt::try_parse_from(&["jenkins-invoke", "-J", "http://ci", ""])
        .unwrap_err();
    assert!(err.to_string().contains("jobname"));
}

#[test]
fn command_is_well_formed() {
    Opt::command().debug_assert();
}
