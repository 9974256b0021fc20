//! Errors reported by the Jenkins API which callers may want to inspect.
//!
//! Everything else is reported as a plain `anyhow::Error` with context.

use std::fmt;

use reqwest::StatusCode;
use url::Url;

/// An error returned by a Jenkins server.
///
/// These are wrapped in an `anyhow::Error`, so use `err.downcast_ref()` to
/// check for a specific case.
#[derive(Debug)]
pub enum JenkinsError {
    /// The server has no job with this name.
    UnknownJob(String),
    /// Triggering a build did not redirect us to a queue item.
    NotAQueueUrl(String),
    /// The queue item for a triggered build was cancelled before it ran.
    QueueItemCancelled {
        /// The queue item which was cancelled.
        url: Url,
        /// Jenkins' explanation, if it gave one.
        why: Option<String>,
    },
    /// The server returned an HTTP status we didn't expect.
    UnexpectedStatus {
        /// The URL we requested.
        url: Url,
        /// The status we received.
        status: StatusCode,
        /// The body of the response, for diagnostics.
        body: String,
    },
}

impl fmt::Display for JenkinsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JenkinsError::UnknownJob(name) => write!(f, "unknown job {:?}", name),
            JenkinsError::NotAQueueUrl(location) => {
                write!(f, "not a queue URL: {}", location)
            }
            JenkinsError::QueueItemCancelled { url, why } => match why {
                Some(why) => write!(f, "queue item {} was cancelled: {}", url, why),
                None => write!(f, "queue item {} was cancelled", url),
            },
            JenkinsError::UnexpectedStatus { url, status, body } => {
                write!(f, "unexpected HTTP status {} for {}:\n{}", status, url, body)
            }
        }
    }
}

impl std::error::Error for JenkinsError {}

#[test]
fn display_messages() {
    let url: Url = "http://ci.example.com/queue/item/7/".parse().unwrap();
    assert_eq!(
        JenkinsError::UnknownJob("build-A".to_owned()).to_string(),
        "unknown job \"build-A\""
    );
    assert_eq!(
        JenkinsError::QueueItemCancelled {
            url: url.clone(),
            why: None,
        }
        .to_string(),
        "queue item http://ci.example.com/queue/item/7/ was cancelled"
    );
    assert_eq!(
        JenkinsError::UnexpectedStatus {
            url,
            status: StatusCode::FORBIDDEN,
            body: "No valid crumb".to_owned(),
        }
        .to_string(),
        "unexpected HTTP status 403 Forbidden for http://ci.example.com/queue/item/7/:\nNo valid crumb"
    );
}
