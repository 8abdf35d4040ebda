use super::gateway::{GatewayError, MediaHandle, PollReply, PostGateway, PostId};
use super::oauth::OAuthSigner;
use crate::config::TwitterSettings;
use reqwest::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::runtime::Runtime;
use tracing::{debug, info};

const MEDIA_UPLOAD_PATH: &str = "/1.1/media/upload.json";
const CREATE_POST_PATH: &str = "/2/tweets";

/// Synchronous client for the two Twitter APIs the bot needs: the v1.1
/// upload endpoint for images and the v2 endpoint for posts and polls.
pub struct TwitterClient {
    http: Client,
    runtime: Runtime,
    signer: OAuthSigner,
    api_base: String,
    upload_base: String,
}

impl TwitterClient {
    pub fn new(settings: &TwitterSettings) -> Result<Self, GatewayError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| GatewayError::Runtime(err.to_string()))?;
        let context = runtime.enter();
        let http = Client::builder()
            .user_agent(concat!("scrutin-bot/", env!("CARGO_PKG_VERSION")))
            .build()?;

        drop(context);

        Ok(Self {
            http,
            runtime,
            signer: OAuthSigner::new(settings.credentials.clone()),
            api_base: settings.api_base.clone(),
            upload_base: settings.upload_base.clone(),
        })
    }

    fn signed_post(&self, url: &str) -> Result<RequestBuilder, GatewayError> {
        let authorization = self.signer.authorization("POST", url)?;
        Ok(self.http.post(url).header(AUTHORIZATION, authorization))
    }

    fn send<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: RequestBuilder,
    ) -> Result<T, GatewayError> {
        self.runtime.block_on(async {
            let response = request.send().await?;
            let status = response.status();
            let body = response.text().await?;

            if !status.is_success() {
                return Err(GatewayError::Rejected {
                    endpoint: endpoint.to_string(),
                    status: status.as_u16(),
                    body,
                });
            }

            serde_json::from_str(&body).map_err(|err| GatewayError::Decode {
                endpoint: endpoint.to_string(),
                detail: err.to_string(),
            })
        })
    }

    fn create_tweet(&self, payload: &TweetPayload<'_>) -> Result<PostId, GatewayError> {
        let url = format!("{}{}", self.api_base, CREATE_POST_PATH);
        let request = self.signed_post(&url)?.json(payload);
        let created: TweetResponse = self.send(CREATE_POST_PATH, request)?;
        Ok(PostId(created.data.id))
    }
}

impl std::fmt::Debug for TwitterClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwitterClient")
            .field("api_base", &self.api_base)
            .field("upload_base", &self.upload_base)
            .finish_non_exhaustive()
    }
}

impl PostGateway for TwitterClient {
    fn upload_media(&self, path: &Path) -> Result<MediaHandle, GatewayError> {
        let bytes = std::fs::read(path).map_err(|source| GatewayError::Media {
            path: path.to_path_buf(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "media".to_string());
        let mime = mime_guess::from_path(path).first_or_octet_stream();

        debug!(path = %path.display(), bytes = bytes.len(), %mime, "uploading media");
        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime.essence_str())?;
        let form = Form::new().part("media", part);

        let url = format!("{}{}", self.upload_base, MEDIA_UPLOAD_PATH);
        let request = self.signed_post(&url)?.multipart(form);
        let uploaded: MediaUploadResponse = self.send(MEDIA_UPLOAD_PATH, request)?;
        Ok(MediaHandle(uploaded.media_id_string))
    }

    fn create_post(&self, text: &str, media: &[MediaHandle]) -> Result<PostId, GatewayError> {
        let media_ids: Vec<&str> = media.iter().map(|handle| handle.0.as_str()).collect();
        let payload = TweetPayload {
            text,
            media: (!media_ids.is_empty()).then_some(TweetMedia { media_ids }),
            reply: None,
            poll: None,
        };
        let post_id = self.create_tweet(&payload)?;
        info!(post = %post_id, "status posted");
        Ok(post_id)
    }

    fn create_poll_reply(
        &self,
        in_reply_to: &PostId,
        poll: &PollReply,
    ) -> Result<PostId, GatewayError> {
        let options: Vec<&str> = poll.options.iter().map(String::as_str).collect();
        let payload = TweetPayload {
            text: &poll.text,
            media: None,
            reply: Some(TweetReply {
                in_reply_to_tweet_id: &in_reply_to.0,
            }),
            poll: Some(TweetPoll {
                options,
                duration_minutes: poll.duration_minutes,
            }),
        };
        let reply_id = self.create_tweet(&payload)?;
        info!(post = %reply_id, reply_to = %in_reply_to, "poll reply posted");
        Ok(reply_id)
    }
}

#[derive(Debug, Serialize)]
struct TweetPayload<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    media: Option<TweetMedia<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply: Option<TweetReply<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    poll: Option<TweetPoll<'a>>,
}

#[derive(Debug, Serialize)]
struct TweetMedia<'a> {
    media_ids: Vec<&'a str>,
}

#[derive(Debug, Serialize)]
struct TweetReply<'a> {
    in_reply_to_tweet_id: &'a str,
}

#[derive(Debug, Serialize)]
struct TweetPoll<'a> {
    options: Vec<&'a str>,
    duration_minutes: u32,
}

#[derive(Debug, Deserialize)]
struct TweetResponse {
    data: TweetData,
}

#[derive(Debug, Deserialize)]
struct TweetData {
    id: String,
}

#[derive(Debug, Deserialize)]
struct MediaUploadResponse {
    media_id_string: String,
}
