//! A client for the Jenkins REST API.
//!
//! We only implement what our tools need: looking up jobs, triggering builds,
//! and waiting for them to finish.

use reqwest::{header::LOCATION, redirect, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::prelude::*;

/// How long to wait between requests when blocking on a build.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// How many redirects we follow before giving up.
const MAX_REDIRECTS: usize = 10;

/// A CSRF protection token, as returned by `GET /crumbIssuer/api/json`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Crumb {
    /// The token itself.
    crumb: String,
    /// The header in which we should send the token.
    crumb_request_field: String,
}

/// The outcome of triggering a job.
#[derive(Debug)]
pub struct Invocation {
    /// The queue item which Jenkins created for our build.
    pub queue_item_url: Url,
    /// The finished build, if we waited for it.
    pub build: Option<Build>,
}

/// A client for talking to a Jenkins server.
pub struct Client {
    url: Url,
    username: Option<String>,
    password: Option<String>,
    poll_interval: Duration,
    client: reqwest::Client,
}

impl Client {
    /// Create a new client for the Jenkins server at `baseurl`. If `username`
    /// is present, we use HTTP Basic authentication.
    ///
    /// This does not contact the server.
    #[instrument(level = "trace", skip_all, fields(baseurl = %baseurl))]
    pub fn new(
        baseurl: &str,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<Client> {
        let url = baseurl
            .parse::<Url>()
            .with_context(|| format!("invalid Jenkins URL {:?}", baseurl))?;
        if url.cannot_be_a_base() {
            return Err(format_err!("invalid Jenkins URL {:?}", baseurl));
        }

        // Jenkins only honors a crumb within the session that issued it, so
        // keep cookies. Follow redirects, except to a queue item, because
        // that's what a build trigger answers with.
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(redirect::Policy::custom(|attempt| {
                if attempt.url().path().contains("/queue/item/") {
                    attempt.stop()
                } else if attempt.previous().len() >= MAX_REDIRECTS {
                    attempt.error(format!("more than {} redirects", MAX_REDIRECTS))
                } else {
                    attempt.follow()
                }
            }))
            .build()
            .context("cannot build HTTP client")?;

        Ok(Client {
            url: with_trailing_slash(url),
            username: username.map(|u| u.to_owned()),
            password: password.map(|p| p.to_owned()),
            poll_interval: DEFAULT_POLL_INTERVAL,
            client,
        })
    }

    /// Change how often we poll while waiting for builds.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Client {
        self.poll_interval = poll_interval;
        self
    }

    /// Look up a job by name.
    ///
    /// `GET /job/$NAME/api/json`
    #[instrument(skip_all, fields(job_name = %name), level = "trace")]
    pub async fn get_job(&self, name: &JobName) -> Result<Job<'_>> {
        let url = self.job_url(name)?;
        let api_url = url.join("api/json")?;
        let resp = self
            .authenticated(self.client.get(api_url.clone()))
            .send()
            .await
            .with_context(|| format!("error getting {}", api_url))?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(JenkinsError::UnknownJob(name.to_string()).into());
        }
        let info: JobInfo = self.handle_json_response(&api_url, resp).await?;
        debug!("found job {} at {}", info.name, url);
        Ok(Job {
            client: self,
            name: name.clone(),
            url,
            info,
        })
    }

    /// The URL of a job, including any enclosing folders.
    fn job_url(&self, name: &JobName) -> Result<Url> {
        let mut url = self.url.clone();
        url.path_segments_mut()
            .map_err(|_| format_err!("cannot build job URL from {}", self.url))?
            .pop_if_empty()
            .extend(name.segments().flat_map(|segment| vec!["job", segment]))
            .push("");
        Ok(url)
    }

    /// Fetch a CSRF crumb, if the server uses them.
    ///
    /// `GET /crumbIssuer/api/json`
    #[instrument(skip_all, level = "trace")]
    async fn crumb(&self) -> Result<Option<Crumb>> {
        let url = self.url.join("crumbIssuer/api/json")?;
        let resp = self
            .authenticated(self.client.get(url.clone()))
            .send()
            .await
            .with_context(|| format!("error getting {}", url))?;
        if resp.status() == StatusCode::NOT_FOUND {
            trace!("server does not issue crumbs");
            return Ok(None);
        }
        Ok(Some(self.handle_json_response(&url, resp).await?))
    }

    /// Trigger a build at `url`, and return the URL of the new queue item.
    /// This is not idempotent, so we never retry it.
    #[instrument(skip_all, fields(url = %redacted(url)), level = "trace")]
    async fn trigger(&self, url: &Url) -> Result<Url> {
        let mut req = self.authenticated(self.client.post(url.clone()));
        if let Some(crumb) = self.crumb().await? {
            req = req.header(crumb.crumb_request_field.as_str(), crumb.crumb);
        }
        let resp = req
            .send()
            .await
            .with_context(|| format!("error posting {}", redacted(url)))?;

        let status = resp.status();
        if !matches!(
            status,
            StatusCode::OK | StatusCode::CREATED | StatusCode::SEE_OTHER
        ) {
            return Err(self.handle_error_response(&redacted(url), resp).await);
        }
        let location = resp
            .headers()
            .get(LOCATION)
            .ok_or_else(|| {
                format_err!("no Location header from {}", redacted(url))
            })?
            .to_str()
            .context("Location header is not valid text")?;
        let queue_item_url = self
            .url
            .join(location)
            .with_context(|| format!("cannot parse Location {:?}", location))?;
        if !queue_item_url.path().contains("/queue/item/") {
            return Err(JenkinsError::NotAQueueUrl(location.to_owned()).into());
        }
        Ok(with_trailing_slash(queue_item_url))
    }

    /// Wait until the queue item at `queue_item_url` has become a build, and
    /// that build has finished. There is no timeout.
    #[instrument(skip_all, fields(queue_item = %queue_item_url), level = "trace")]
    async fn wait_for_build(&self, queue_item_url: &Url) -> Result<Build> {
        let api_url = queue_item_url.join("api/json")?;
        let executable = loop {
            let item: QueueItem = self.get_json(&api_url).await?;
            if item.cancelled {
                return Err(JenkinsError::QueueItemCancelled {
                    url: queue_item_url.clone(),
                    why: item.why,
                }
                .into());
            }
            if let Some(executable) = item.executable {
                break executable;
            }
            trace!(
                "still queued: {}",
                item.why.as_deref().unwrap_or("no reason given")
            );
            tokio::time::sleep(self.poll_interval).await;
        };

        let build_url = self
            .url
            .join(&executable.url)
            .with_context(|| format!("cannot parse build URL {:?}", executable.url))?;
        let api_url = with_trailing_slash(build_url).join("api/json")?;
        debug!("waiting for build #{}", executable.number);
        let mut build: Build = self.get_json(&api_url).await?;
        while !build.has_finished() {
            tokio::time::sleep(self.poll_interval).await;
            build = self.get_json(&api_url).await?;
        }
        Ok(build)
    }

    /// Add our credentials to a request.
    fn authenticated(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.username {
            Some(username) => req.basic_auth(username, self.password.as_ref()),
            None => req,
        }
    }

    /// `GET` a URL and parse the JSON response.
    async fn get_json<T>(&self, url: &Url) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let resp = self
            .authenticated(self.client.get(url.clone()))
            .send()
            .await
            .with_context(|| format!("error getting {}", url))?;
        self.handle_json_response(url, resp).await
    }

    /// Check the HTTP status code and parse a JSON response.
    #[instrument(level = "trace", skip_all, fields(url = %url))]
    async fn handle_json_response<T>(&self, url: &Url, resp: Response) -> Result<T>
    where
        T: DeserializeOwned,
    {
        if resp.status().is_success() {
            let value = resp
                .json()
                .await
                .with_context(|| format!("error parsing {}", url))?;
            Ok(value)
        } else {
            Err(self.handle_error_response(url, resp).await)
        }
    }

    /// Extract an error from an HTTP response payload.
    #[instrument(level = "trace", skip_all, fields(url = %url, status = %resp.status()))]
    async fn handle_error_response(&self, url: &Url, resp: Response) -> Error {
        let status = resp.status();
        match resp.text().await {
            Ok(body) => JenkinsError::UnexpectedStatus {
                url: url.clone(),
                status,
                body,
            }
            .into(),
            Err(err) => err.into(),
        }
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("poll_interval", &self.poll_interval)
            // Never print the password.
            .finish()
    }
}

/// A job on a Jenkins server, which we can trigger.
#[derive(Debug)]
pub struct Job<'a> {
    client: &'a Client,
    name: JobName,
    url: Url,
    info: JobInfo,
}

impl<'a> Job<'a> {
    /// What the server told us about this job.
    pub fn info(&self) -> &JobInfo {
        &self.info
    }

    /// Start a new build of this job. If `token` is present, pass it as the
    /// job's remote trigger token. If `block` is true, wait until the build
    /// has finished, however long that takes.
    ///
    /// Jobs with parameters are built with their default values.
    ///
    /// `POST /job/$NAME/build` or `POST /job/$NAME/buildWithParameters`
    #[instrument(skip_all, fields(job = %self.name, block = block), level = "trace")]
    pub async fn invoke(&self, token: Option<&str>, block: bool) -> Result<Invocation> {
        if !self.info.buildable {
            warn!("{} is not buildable, Jenkins may ignore this request", self.name);
        }
        if self.info.in_queue {
            debug!("{} already has a build in the queue", self.name);
        }

        let endpoint = if self.info.has_params() {
            "buildWithParameters"
        } else {
            "build"
        };
        let mut url = self.url.join(endpoint)?;
        if let Some(token) = token {
            url.query_pairs_mut().append_pair("token", token);
        }
        let queue_item_url = self.client.trigger(&url).await?;
        info!("queued {} as {}", self.name, queue_item_url);

        let build = if block {
            let build = self.client.wait_for_build(&queue_item_url).await?;
            if let Some(result) = build.result {
                info!("{} #{} finished: {}", self.name, build.number, result);
            }
            Some(build)
        } else {
            None
        };
        Ok(Invocation {
            queue_item_url,
            build,
        })
    }
}

/// Make sure `url` ends in `/`, so that relative joins append to it.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Strip the query string, which may contain a trigger token.
fn redacted(url: &Url) -> Url {
    let mut url = url.clone();
    url.set_query(None);
    url
}
