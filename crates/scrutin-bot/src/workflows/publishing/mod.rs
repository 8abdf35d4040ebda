mod console;
mod gateway;
mod oauth;
mod publisher;
mod twitter;

pub use console::ConsoleGateway;
pub use gateway::{GatewayError, MediaHandle, PollReply, PostGateway, PostId};
pub use publisher::{
    PollOutcome, PollReplyError, PublishError, PublishReceipt, PublishRequest, PublishState,
    StatusPublisher, POLL_DURATION_MINUTES, POLL_OPTIONS, POLL_QUESTION,
};
pub use twitter::TwitterClient;
