use std::fmt::{self, Debug};
use std::path::{Path, PathBuf};

/// Identifier returned by the service for an uploaded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaHandle(pub String);

impl fmt::Display for MediaHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostId(pub String);

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A threaded reply carrying a poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollReply {
    pub text: String,
    pub options: Vec<String>,
    pub duration_minutes: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("unable to read media {path}: {source}")]
    Media {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{endpoint} answered {status}: {body}")]
    Rejected {
        endpoint: String,
        status: u16,
        body: String,
    },
    #[error("unexpected response from {endpoint}: {detail}")]
    Decode { endpoint: String, detail: String },
    #[error("unable to sign request: {0}")]
    Signing(String),
    #[error("client runtime unavailable: {0}")]
    Runtime(String),
}

/// Everything the publisher needs from a micro-blogging service, whether it
/// is one network client, several, or a local sink.
pub trait PostGateway: Debug {
    fn upload_media(&self, path: &Path) -> Result<MediaHandle, GatewayError>;

    fn create_post(&self, text: &str, media: &[MediaHandle]) -> Result<PostId, GatewayError>;

    fn create_poll_reply(
        &self,
        in_reply_to: &PostId,
        poll: &PollReply,
    ) -> Result<PostId, GatewayError>;
}
