use super::gateway::{GatewayError, MediaHandle, PollReply, PostGateway, PostId};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;

/// Debug sink: logs what would have been published and hands back synthetic ids.
///
/// Only the uploads not yet attached to a post are remembered, so a long
/// batch does not accumulate paths.
#[derive(Debug, Default)]
pub struct ConsoleGateway {
    pending: Mutex<Vec<(MediaHandle, PathBuf)>>,
    uploads: Mutex<usize>,
    posts: Mutex<usize>,
}

impl ConsoleGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_post_id(&self) -> PostId {
        let mut posts = self.posts.lock().expect("console post counter poisoned");
        *posts += 1;
        PostId(format!("debug-post-{}", *posts))
    }

    #[cfg(test)]
    fn pending_count(&self) -> usize {
        self.pending.lock().expect("console media list poisoned").len()
    }
}

impl PostGateway for ConsoleGateway {
    fn upload_media(&self, path: &Path) -> Result<MediaHandle, GatewayError> {
        let mut uploads = self.uploads.lock().expect("console upload counter poisoned");
        *uploads += 1;
        let handle = MediaHandle(format!("debug-media-{}", *uploads));

        let mut pending = self.pending.lock().expect("console media list poisoned");
        pending.push((handle.clone(), path.to_path_buf()));
        Ok(handle)
    }

    fn create_post(&self, text: &str, media: &[MediaHandle]) -> Result<PostId, GatewayError> {
        let staged = {
            let mut pending = self.pending.lock().expect("console media list poisoned");
            std::mem::take(&mut *pending)
        };
        let paths: Vec<String> = media
            .iter()
            .map(|handle| {
                staged
                    .iter()
                    .find(|(staged_handle, _)| staged_handle == handle)
                    .map(|(_, path)| path.display().to_string())
                    .unwrap_or_else(|| handle.to_string())
            })
            .collect();
        let post_id = self.next_post_id();

        info!(
            post = %post_id,
            length = text.chars().count(),
            media = ?paths,
            "debug post\n{text}"
        );
        Ok(post_id)
    }

    fn create_poll_reply(
        &self,
        in_reply_to: &PostId,
        poll: &PollReply,
    ) -> Result<PostId, GatewayError> {
        let post_id = self.next_post_id();
        info!(
            post = %post_id,
            reply_to = %in_reply_to,
            options = ?poll.options,
            duration_minutes = poll.duration_minutes,
            "debug poll reply\n{}",
            poll.text
        );
        Ok(post_id)
    }
}
