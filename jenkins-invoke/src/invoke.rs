//! Triggering each requested job in turn.

use jenkinsapi_common::{prelude::*, rest_api::Client};

use crate::Opt;

/// Invokes the jobs named in our options, one at a time.
#[derive(Debug)]
pub struct Invoker<'a> {
    opt: &'a Opt,
    client: Client,
}

impl<'a> Invoker<'a> {
    /// Create an invoker with a client for the server in `opt`.
    pub fn new(opt: &'a Opt) -> Result<Invoker<'a>> {
        let client = Client::new(
            &opt.baseurl,
            opt.username.as_deref(),
            opt.password.as_deref(),
        )?;
        Ok(Invoker { opt, client })
    }

    #[cfg(test)]
    fn with_client(opt: &'a Opt, client: Client) -> Invoker<'a> {
        Invoker { opt, client }
    }

    /// Invoke every job in order, stopping at the first failure.
    #[instrument(skip_all, level = "debug")]
    pub async fn run(&self) -> Result<()> {
        for job in &self.opt.jobs {
            self.invoke_job(job, self.opt.block, self.opt.token.as_deref())
                .await?;
        }
        Ok(())
    }

    /// Invoke a single job, waiting for it to finish if `block` is true.
    #[instrument(skip(self, token), fields(jobname = %jobname), level = "debug")]
    pub async fn invoke_job(
        &self,
        jobname: &JobName,
        block: bool,
        token: Option<&str>,
    ) -> Result<()> {
        let job = self.client.get_job(jobname).await?;
        job.invoke(token, block).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    };

    use clap::Parser;
    use mockito::{Mock, Request, Server, ServerGuard};

    use super::*;

    fn opt(server: &ServerGuard, args: &[&str]) -> Opt {
        let url = server.url();
        let mut argv = vec!["jenkins-invoke", "-J", url.as_str()];
        argv.extend_from_slice(args);
        Opt::try_parse_from(&argv).unwrap()
    }

    fn client(opt: &Opt) -> Client {
        Client::new(&opt.baseurl, None, None)
            .unwrap()
            .with_poll_interval(Duration::from_millis(10))
    }

    async fn mock_no_crumbs(server: &mut ServerGuard) -> Mock {
        server
            .mock("GET", "/crumbIssuer/api/json")
            .with_status(404)
            .create_async()
            .await
    }

    async fn mock_job(server: &mut ServerGuard, name: &str, hits: usize) -> Mock {
        server
            .mock("GET", format!("/job/{}/api/json", name).as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!(
                r#"{{"name": "{}", "url": "http://ci/job/{}/"}}"#,
                name, name
            ))
            .expect(hits)
            .create_async()
            .await
    }

    async fn mock_trigger(
        server: &mut ServerGuard,
        name: &str,
        queue_id: u64,
        hits: usize,
    ) -> Mock {
        server
            .mock("POST", format!("/job/{}/build", name).as_str())
            .with_status(201)
            .with_header("location", &format!("/queue/item/{}/", queue_id))
            .expect(hits)
            .create_async()
            .await
    }

    #[tokio::test]
    async fn invokes_each_job_once() {
        let mut server = Server::new_async().await;
        let _crumb = mock_no_crumbs(&mut server).await;
        let job_a = mock_job(&mut server, "build-A", 1).await;
        let job_b = mock_job(&mut server, "build-B", 1).await;
        let trigger_a = mock_trigger(&mut server, "build-A", 1, 1).await;
        let trigger_b = mock_trigger(&mut server, "build-B", 2, 1).await;

        let opt = opt(&server, &["build-A", "build-B"]);
        Invoker::with_client(&opt, client(&opt)).run().await.unwrap();

        job_a.assert_async().await;
        job_b.assert_async().await;
        trigger_a.assert_async().await;
        trigger_b.assert_async().await;
    }

    #[tokio::test]
    async fn first_failure_stops_the_run() {
        let mut server = Server::new_async().await;
        let _crumb = mock_no_crumbs(&mut server).await;
        let _job_a = mock_job(&mut server, "build-A", 1).await;
        let trigger_a = mock_trigger(&mut server, "build-A", 1, 1).await;
        let missing_b = server
            .mock("GET", "/job/build-B/api/json")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;
        let job_c = mock_job(&mut server, "build-C", 0).await;
        let trigger_c = mock_trigger(&mut server, "build-C", 3, 0).await;

        let opt = opt(&server, &["build-A", "build-B", "build-C"]);
        let err = Invoker::with_client(&opt, client(&opt))
            .run()
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<JenkinsError>(),
            Some(JenkinsError::UnknownJob(_))
        ));
        trigger_a.assert_async().await;
        missing_b.assert_async().await;
        job_c.assert_async().await;
        trigger_c.assert_async().await;
    }

    #[tokio::test]
    async fn blocking_waits_for_each_build() {
        let log = Arc::new(Mutex::new(Vec::<String>::new()));
        let logged = |label: &'static str, body: String| {
            let log = log.clone();
            move |_: &Request| {
                log.lock().unwrap().push(label.to_owned());
                body.clone().into_bytes()
            }
        };

        let mut server = Server::new_async().await;
        let _crumb = mock_no_crumbs(&mut server).await;
        let _job_a = mock_job(&mut server, "build-A", 1).await;
        let _job_b = mock_job(&mut server, "build-B", 1).await;
        let mut mocks = vec![];
        for (queue_id, name) in &[(1, "build-A"), (2, "build-B")] {
            mocks.push(
                server
                    .mock("POST", format!("/job/{}/build", name).as_str())
                    .with_status(201)
                    .with_header("location", &format!("/queue/item/{}/", queue_id))
                    .with_body_from_request(logged(
                        if *queue_id == 1 { "trigger A" } else { "trigger B" },
                        String::new(),
                    ))
                    .expect(1)
                    .create_async()
                    .await,
            );
            mocks.push(
                server
                    .mock("GET", format!("/queue/item/{}/api/json", queue_id).as_str())
                    .with_status(200)
                    .with_header("content-type", "application/json")
                    .with_body(format!(
                        r#"{{"id": {}, "executable": {{"number": 5, "url": "/job/{}/5/"}}}}"#,
                        queue_id, name
                    ))
                    .create_async()
                    .await,
            );
        }

        // Build A reports `building` on its first poll, and finishes on the
        // second.
        let a_polls = Arc::new(AtomicUsize::new(0));
        let a_log = log.clone();
        mocks.push(
            server
                .mock("GET", "/job/build-A/5/api/json")
                .with_status(200)
                .with_header("content-type", "application/json")
                .with_body_from_request(move |_| {
                    let building = a_polls.fetch_add(1, Ordering::SeqCst) == 0;
                    a_log.lock().unwrap().push(if building {
                        "poll A (building)".to_owned()
                    } else {
                        "poll A (done)".to_owned()
                    });
                    let result = if building { "null" } else { r#""SUCCESS""# };
                    format!(
                        r#"{{"number": 5, "url": "/job/build-A/5/", "building": {}, "result": {}}}"#,
                        building, result
                    )
                    .into_bytes()
                })
                .expect(2)
                .create_async()
                .await,
        );
        mocks.push(
            server
                .mock("GET", "/job/build-B/5/api/json")
                .with_status(200)
                .with_header("content-type", "application/json")
                .with_body_from_request(logged(
                    "poll B (done)",
                    r#"{"number": 5, "url": "/job/build-B/5/", "building": false, "result": "SUCCESS"}"#
                        .to_owned(),
                ))
                .expect(1)
                .create_async()
                .await,
        );

        let opt = opt(&server, &["--block", "build-A", "build-B"]);
        Invoker::with_client(&opt, client(&opt)).run().await.unwrap();

        for mock in &mocks {
            mock.assert_async().await;
        }
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "trigger A",
                "poll A (building)",
                "poll A (done)",
                "trigger B",
                "poll B (done)",
            ]
        );
    }

    #[tokio::test]
    async fn blocked_failure_stops_before_next_job() {
        let mut server = Server::new_async().await;
        let _crumb = mock_no_crumbs(&mut server).await;
        let _job_a = mock_job(&mut server, "build-A", 1).await;
        let _trigger_a = mock_trigger(&mut server, "build-A", 1, 1).await;
        let _queue = server
            .mock("GET", "/queue/item/1/api/json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": 1, "cancelled": true, "why": "Cancelled by admin"}"#)
            .create_async()
            .await;
        let job_b = mock_job(&mut server, "build-B", 0).await;

        let opt = opt(&server, &["-b", "build-A", "build-B"]);
        let err = Invoker::with_client(&opt, client(&opt))
            .run()
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Cancelled by admin"));
        job_b.assert_async().await;
    }
}
