use crate::prelude::*;

/// An entry in the build queue, as returned by `GET /queue/item/$ID/api/json`.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct QueueItem {
    /// The queue item ID.
    #[serde(default)]
    pub id: Option<u64>,
    /// Was this item removed from the queue without being built?
    #[serde(default)]
    pub cancelled: bool,
    /// Why this item is still waiting, if it is.
    #[serde(default)]
    pub why: Option<String>,
    /// The build created from this item, once it has left the queue.
    #[serde(default)]
    pub executable: Option<Executable>,
}

/// A reference to the build started from a queue item.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Executable {
    /// The build number.
    pub number: u64,
    /// The URL of the build.
    pub url: String,
}

#[test]
fn parse_queue_items() {
    let waiting: QueueItem = serde_json::from_str(
        r#"{"id": 7, "blocked": false, "why": "Waiting for next available executor", "executable": null}"#,
    )
    .unwrap();
    assert_eq!(waiting.id, Some(7));
    assert!(!waiting.cancelled);
    assert!(waiting.executable.is_none());

    let started: QueueItem = serde_json::from_str(
        r#"{"id": 7, "cancelled": false, "executable": {"number": 12, "url": "http://ci/job/a/12/"}}"#,
    )
    .unwrap();
    assert_eq!(started.executable.unwrap().number, 12);
}
