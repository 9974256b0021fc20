use std::str::FromStr;

use crate::prelude::*;

/// The name of a Jenkins job. Jobs inside folders are named with `/`
/// separators, as in `folder/job`.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct JobName(String);

impl JobName {
    /// The full name of this job.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The path segments we need to address this job under `/job/`.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }
}

impl FromStr for JobName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.split('/').all(|segment| segment.trim().is_empty()) {
            return Err(format_err!("jobname must be a non-empty string"));
        }
        Ok(JobName(s.to_owned()))
    }
}

impl fmt::Display for JobName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Information about a job, as returned by `GET /job/$NAME/api/json`.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobInfo {
    /// The short name of this job.
    pub name: String,
    /// The URL of this job, as reported by the server.
    pub url: String,
    /// Can this job be built right now? Disabled jobs are not buildable.
    #[serde(default = "default_buildable")]
    pub buildable: bool,
    /// Is a build of this job already waiting in the queue?
    #[serde(default)]
    pub in_queue: bool,
    /// Job properties. We only care about parameter definitions.
    #[serde(default)]
    pub property: Vec<JobProperty>,
}

fn default_buildable() -> bool {
    true
}

impl JobInfo {
    /// The names of this job's build parameters.
    pub fn parameter_names(&self) -> impl Iterator<Item = &str> {
        self.property
            .iter()
            .flat_map(|p| p.parameter_definitions.iter())
            .map(|d| d.name.as_str())
    }

    /// Does this job take build parameters? If so, it must be triggered via
    /// `buildWithParameters` instead of `build`.
    pub fn has_params(&self) -> bool {
        self.parameter_names().next().is_some()
    }
}

/// A single job property.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobProperty {
    /// Present on `ParametersDefinitionProperty`, and empty otherwise.
    #[serde(default)]
    pub parameter_definitions: Vec<ParameterDefinition>,
}

/// A build parameter declared by a job.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ParameterDefinition {
    /// The name of the parameter.
    pub name: String,
}

#[test]
fn job_names() {
    let name = "folder/build-A".parse::<JobName>().unwrap();
    assert_eq!(name.as_str(), "folder/build-A");
    assert_eq!(name.segments().collect::<Vec<_>>(), vec!["folder", "build-A"]);

    let err = "".parse::<JobName>().unwrap_err();
    assert!(err.to_string().contains("jobname"));
    assert!(" ".parse::<JobName>().is_err());
    assert!("/".parse::<JobName>().is_err());
}

#[test]
fn parse_job_info() {
    let json = r#"{
        "_class": "hudson.model.FreeStyleProject",
        "name": "build-A",
        "url": "http://ci.example.com/job/build-A/",
        "buildable": true,
        "inQueue": false,
        "nextBuildNumber": 12,
        "property": [
            {"_class": "jenkins.model.BuildDiscarderProperty"},
            {
                "_class": "hudson.model.ParametersDefinitionProperty",
                "parameterDefinitions": [
                    {"name": "BRANCH", "type": "StringParameterDefinition"}
                ]
            }
        ]
    }"#;
    let info: JobInfo = serde_json::from_str(json).unwrap();
    assert_eq!(info.name, "build-A");
    assert!(info.buildable);
    assert!(info.has_params());
    assert_eq!(info.parameter_names().collect::<Vec<_>>(), vec!["BRANCH"]);

    let bare: JobInfo =
        serde_json::from_str(r#"{"name": "b", "url": "http://ci/job/b/"}"#).unwrap();
    assert!(bare.buildable);
    assert!(!bare.has_params());
}
