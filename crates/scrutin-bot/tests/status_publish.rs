use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use scrutin_bot::config::PublishingConfig;
use scrutin_bot::workflows::publishing::{
    GatewayError, MediaHandle, PollOutcome, PollReply, PostGateway, PostId, PublishError,
    PublishRequest, PublishState, StatusPublisher, POLL_DURATION_MINUTES, POLL_OPTIONS,
    POLL_QUESTION,
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Upload(PathBuf),
    Post { text: String, media: Vec<String> },
    Poll { reply_to: String, poll: PollReply },
}

#[derive(Debug, Default)]
struct FakePostGateway {
    calls: Arc<Mutex<Vec<Call>>>,
    failing_upload: Option<PathBuf>,
    fail_post: bool,
    fail_poll: bool,
}

impl FakePostGateway {
    fn new(calls: Arc<Mutex<Vec<Call>>>) -> Self {
        Self {
            calls,
            ..Self::default()
        }
    }

    fn record(&self, call: Call) -> usize {
        let mut guard = self.calls.lock().expect("call log mutex");
        guard.push(call);
        guard.len()
    }
}

fn rejected(endpoint: &str) -> GatewayError {
    GatewayError::Rejected {
        endpoint: endpoint.to_string(),
        status: 403,
        body: "{\"detail\":\"forbidden\"}".to_string(),
    }
}

impl PostGateway for FakePostGateway {
    fn upload_media(&self, path: &Path) -> Result<MediaHandle, GatewayError> {
        let index = self.record(Call::Upload(path.to_path_buf()));
        if self.failing_upload.as_deref() == Some(path) {
            return Err(rejected("/1.1/media/upload.json"));
        }
        Ok(MediaHandle(format!("media-{index}")))
    }

    fn create_post(&self, text: &str, media: &[MediaHandle]) -> Result<PostId, GatewayError> {
        self.record(Call::Post {
            text: text.to_string(),
            media: media.iter().map(|handle| handle.0.clone()).collect(),
        });
        if self.fail_post {
            return Err(rejected("/2/tweets"));
        }
        Ok(PostId("1600000000000000001".to_string()))
    }

    fn create_poll_reply(
        &self,
        in_reply_to: &PostId,
        poll: &PollReply,
    ) -> Result<PostId, GatewayError> {
        self.record(Call::Poll {
            reply_to: in_reply_to.0.clone(),
            poll: poll.clone(),
        });
        if self.fail_poll {
            return Err(rejected("/2/tweets"));
        }
        Ok(PostId("1600000000000000002".to_string()))
    }
}

fn request() -> PublishRequest {
    PublishRequest::new(
        "20/03/2023: Rejeté par @AssembleeNat la motion\n355 votants, 200 pour, 100 contre, 50 abstentions\n#DirectAN",
        vec![
            PathBuf::from("medias/VTANR5L16V1234/proportion.png"),
            PathBuf::from("medias/VTANR5L16V1234/group_breakdown.png"),
        ],
    )
}

fn calls(log: &Arc<Mutex<Vec<Call>>>) -> Vec<Call> {
    log.lock().expect("call log mutex").clone()
}

#[test]
fn uploads_in_order_then_posts_then_replies_with_poll() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let publisher = StatusPublisher::new(Box::new(FakePostGateway::new(log.clone())));

    let receipt = publisher.publish(request()).expect("publish succeeds");

    assert_eq!(receipt.state(), PublishState::PollReplied);
    assert_eq!(receipt.post_id.0, "1600000000000000001");
    assert_eq!(
        receipt.media,
        vec![
            MediaHandle("media-1".to_string()),
            MediaHandle("media-2".to_string())
        ]
    );
    assert!(matches!(
        &receipt.poll,
        PollOutcome::Replied(reply) if reply.0 == "1600000000000000002"
    ));

    let calls = calls(&log);
    assert_eq!(calls.len(), 4);
    assert_eq!(
        calls[0],
        Call::Upload(PathBuf::from("medias/VTANR5L16V1234/proportion.png"))
    );
    assert_eq!(
        calls[1],
        Call::Upload(PathBuf::from("medias/VTANR5L16V1234/group_breakdown.png"))
    );
    match &calls[2] {
        Call::Post { text, media } => {
            assert!(text.ends_with("#DirectAN"));
            assert_eq!(media, &vec!["media-1".to_string(), "media-2".to_string()]);
        }
        other => panic!("expected a post, got {other:?}"),
    }
    match &calls[3] {
        Call::Poll { reply_to, poll } => {
            assert_eq!(reply_to, "1600000000000000001");
            assert_eq!(poll.text, POLL_QUESTION);
            assert_eq!(poll.options, vec!["Oui".to_string(), "Non".to_string()]);
            assert_eq!(poll.duration_minutes, 1440);
        }
        other => panic!("expected a poll reply, got {other:?}"),
    }
}

#[test]
fn failed_upload_stops_before_posting() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let gateway = FakePostGateway {
        failing_upload: Some(PathBuf::from("medias/VTANR5L16V1234/proportion.png")),
        ..FakePostGateway::new(log.clone())
    };
    let publisher = StatusPublisher::new(Box::new(gateway));

    let err = publisher.publish(request()).expect_err("upload failure aborts");

    match err {
        PublishError::MediaUpload { path, .. } => {
            assert_eq!(path, PathBuf::from("medias/VTANR5L16V1234/proportion.png"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    let calls = calls(&log);
    assert_eq!(calls.len(), 1);
    assert!(calls.iter().all(|call| matches!(call, Call::Upload(_))));
}

#[test]
fn failed_post_sends_no_poll() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let gateway = FakePostGateway {
        fail_post: true,
        ..FakePostGateway::new(log.clone())
    };
    let publisher = StatusPublisher::new(Box::new(gateway));

    let err = publisher.publish(request()).expect_err("post failure is fatal");

    assert!(matches!(err, PublishError::Post(GatewayError::Rejected { status: 403, .. })));
    assert!(!calls(&log)
        .iter()
        .any(|call| matches!(call, Call::Poll { .. })));
}

#[test]
fn failed_poll_keeps_the_published_post() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let gateway = FakePostGateway {
        fail_poll: true,
        ..FakePostGateway::new(log.clone())
    };
    let publisher = StatusPublisher::new(Box::new(gateway));

    let receipt = publisher.publish(request()).expect("post survives the poll failure");

    assert_eq!(receipt.state(), PublishState::PollFailed);
    assert_eq!(receipt.post_id.0, "1600000000000000001");
    match &receipt.poll {
        PollOutcome::Failed(err) => {
            assert_eq!(err.post_id, receipt.post_id);
            assert!(err.to_string().contains("1600000000000000001"));
        }
        PollOutcome::Replied(_) => panic!("poll should have failed"),
    }
}

#[test]
fn post_without_media_skips_uploads() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let publisher = StatusPublisher::new(Box::new(FakePostGateway::new(log.clone())));

    let receipt = publisher
        .publish(PublishRequest::new("texte seul", Vec::new()))
        .expect("publish succeeds");

    assert!(receipt.media.is_empty());
    let calls = calls(&log);
    assert!(matches!(&calls[0], Call::Post { media, .. } if media.is_empty()));
}

#[test]
fn poll_constants_match_the_published_question() {
    assert_eq!(
        POLL_QUESTION,
        "Pensez-vous qu'il aurait fallu plus de votants pour ce vote ?"
    );
    assert_eq!(POLL_OPTIONS, ["Oui", "Non"]);
    assert_eq!(POLL_DURATION_MINUTES, 24 * 60);
}

#[test]
fn console_sink_publishes_without_network() {
    let dir = tempfile::tempdir().expect("tempdir");
    let image = dir.path().join("proportion.png");
    std::fs::write(&image, b"\x89PNG\r\n\x1a\n").expect("write image");

    let publisher =
        StatusPublisher::from_config(&PublishingConfig::Console).expect("console sink builds");
    let receipt = publisher
        .publish(PublishRequest::new("texte", vec![image]))
        .expect("console publish succeeds");

    assert_eq!(receipt.state(), PublishState::PollReplied);
    assert!(receipt.post_id.0.starts_with("debug-post-"));
    assert_eq!(receipt.media.len(), 1);
}
