use super::console::ConsoleGateway;
use super::gateway::{GatewayError, MediaHandle, PollReply, PostGateway, PostId};
use super::twitter::TwitterClient;
use crate::config::PublishingConfig;
use crate::workflows::scrutin::{RenderedCharts, VoteSummary};
use std::path::PathBuf;
use tracing::{info, warn};

pub const POLL_QUESTION: &str = "Pensez-vous qu'il aurait fallu plus de votants pour ce vote ?";
pub const POLL_OPTIONS: [&str; 2] = ["Oui", "Non"];
pub const POLL_DURATION_MINUTES: u32 = 24 * 60;
/// Longer texts are still sent; the service decides whether to refuse them.
const POST_LENGTH_LIMIT: usize = 280;

/// Text and ordered image attachments for one status update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest {
    pub text: String,
    pub media: Vec<PathBuf>,
}

impl PublishRequest {
    pub fn new(text: impl Into<String>, media: Vec<PathBuf>) -> Self {
        Self {
            text: text.into(),
            media,
        }
    }

    pub fn for_vote(summary: &VoteSummary, charts: &RenderedCharts) -> Self {
        Self::new(summary.status_text(), charts.paths())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishState {
    Init,
    MediaUploaded,
    Posted,
    PollReplied,
    PollFailed,
}

#[derive(Debug, thiserror::Error)]
#[error("poll reply to post {post_id} failed: {source}")]
pub struct PollReplyError {
    pub post_id: PostId,
    #[source]
    pub source: GatewayError,
}

#[derive(Debug)]
pub enum PollOutcome {
    Replied(PostId),
    Failed(PollReplyError),
}

/// What a publish left behind. The main post exists in both poll outcomes.
#[derive(Debug)]
pub struct PublishReceipt {
    pub post_id: PostId,
    pub media: Vec<MediaHandle>,
    pub poll: PollOutcome,
    state: PublishState,
}

impl PublishReceipt {
    /// Terminal state reached by the publish that produced this receipt.
    pub fn state(&self) -> PublishState {
        self.state
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("media upload failed for {path}: {source}")]
    MediaUpload {
        path: PathBuf,
        #[source]
        source: GatewayError,
    },
    #[error("status post failed: {0}")]
    Post(#[source] GatewayError),
}

#[derive(Debug)]
pub struct StatusPublisher {
    gateway: Box<dyn PostGateway>,
}

impl StatusPublisher {
    pub fn new(gateway: Box<dyn PostGateway>) -> Self {
        Self { gateway }
    }

    /// Picks the sink once: the console in debug mode, the network otherwise.
    pub fn from_config(config: &PublishingConfig) -> Result<Self, GatewayError> {
        let gateway: Box<dyn PostGateway> = match config {
            PublishingConfig::Console => Box::new(ConsoleGateway::new()),
            PublishingConfig::Twitter(settings) => Box::new(TwitterClient::new(settings)?),
        };
        Ok(Self::new(gateway))
    }

    pub fn publish(&self, request: PublishRequest) -> Result<PublishReceipt, PublishError> {
        let PublishRequest { text, media } = request;

        let length = text.chars().count();
        if length > POST_LENGTH_LIMIT {
            warn!(length, limit = POST_LENGTH_LIMIT, "status text exceeds the post length limit");
        }

        let mut state = PublishState::Init;
        let mut handles = Vec::with_capacity(media.len());
        for path in media {
            let handle = self
                .gateway
                .upload_media(&path)
                .map_err(|source| PublishError::MediaUpload { path, source })?;
            handles.push(handle);
        }
        state = advance(state, PublishState::MediaUploaded);

        let post_id = self
            .gateway
            .create_post(&text, &handles)
            .map_err(PublishError::Post)?;
        state = advance(state, PublishState::Posted);

        let poll = PollReply {
            text: POLL_QUESTION.to_string(),
            options: POLL_OPTIONS.iter().map(|option| option.to_string()).collect(),
            duration_minutes: POLL_DURATION_MINUTES,
        };
        let (poll, state) = match self.gateway.create_poll_reply(&post_id, &poll) {
            Ok(reply_id) => (
                PollOutcome::Replied(reply_id),
                advance(state, PublishState::PollReplied),
            ),
            Err(source) => {
                let err = PollReplyError {
                    post_id: post_id.clone(),
                    source,
                };
                warn!(error = %err, "poll reply failed; status post kept");
                (
                    PollOutcome::Failed(err),
                    advance(state, PublishState::PollFailed),
                )
            }
        };

        Ok(PublishReceipt {
            post_id,
            media: handles,
            poll,
            state,
        })
    }
}

fn advance(from: PublishState, to: PublishState) -> PublishState {
    info!(?from, ?to, "publish progressed");
    to
}
