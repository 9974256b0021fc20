use crate::prelude::*;

/// The final result of a build.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildResult {
    /// The build succeeded.
    Success,
    /// The build succeeded, but some tests failed.
    Unstable,
    /// The build failed.
    Failure,
    /// The build was skipped, typically because an upstream build failed.
    NotBuilt,
    /// Somebody stopped the build.
    Aborted,
}

impl fmt::Display for BuildResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BuildResult::Success => "SUCCESS",
            BuildResult::Unstable => "UNSTABLE",
            BuildResult::Failure => "FAILURE",
            BuildResult::NotBuilt => "NOT_BUILT",
            BuildResult::Aborted => "ABORTED",
        };
        f.write_str(s)
    }
}

/// A single run of a job, as returned by `GET /job/$NAME/$NUMBER/api/json`.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Build {
    /// The build number.
    pub number: u64,
    /// The URL of this build.
    pub url: String,
    /// Is this build still running?
    #[serde(default)]
    pub building: bool,
    /// The result, once the build has finished.
    #[serde(default)]
    pub result: Option<BuildResult>,
}

impl Build {
    /// Has this build reached a terminal state?
    ///
    /// Jenkins sometimes clears `building` a moment before it records the
    /// result, so we require both.
    pub fn has_finished(&self) -> bool {
        !self.building && self.result.is_some()
    }
}

#[test]
fn build_has_finished() {
    let running: Build = serde_json::from_str(
        r#"{"number": 3, "url": "http://ci/job/a/3/", "building": true, "result": null}"#,
    )
    .unwrap();
    assert!(!running.has_finished());

    let finishing: Build = serde_json::from_str(
        r#"{"number": 3, "url": "http://ci/job/a/3/", "building": false, "result": null}"#,
    )
    .unwrap();
    assert!(!finishing.has_finished());

    let aborted: Build = serde_json::from_str(
        r#"{"number": 3, "url": "http://ci/job/a/3/", "building": false, "result": "ABORTED"}"#,
    )
    .unwrap();
    assert!(aborted.has_finished());
    assert_eq!(aborted.result, Some(BuildResult::Aborted));
    assert_eq!(aborted.result.unwrap().to_string(), "ABORTED");
}
