//! Await messages from a tokio task instead of polling once per frame.
//!
//! Run with:
//!   cargo run -p gcmsg --example async-poll --features demo,async

use std::time::Duration;

use clap::Parser;
use gcmsg::channel::AsyncPoller;
use gcmsg::endpoint::{LoopbackEndpoint, MessageType};
use gcmsg::logging::{init_logging, LogFormat, LogLevel};
use gcmsg::{Channel, Envelope};

#[derive(Parser, Debug)]
#[command(about = "Poll a loopback endpoint from an async task")]
struct Args {
    /// Poll period in milliseconds
    #[arg(long, default_value_t = 10)]
    period_ms: u64,

    /// Give up after this many milliseconds without a message
    #[arg(long, default_value_t = 250)]
    deadline_ms: u64,

    #[arg(long, value_enum, default_value = "text")]
    log_format: LogFormat,

    #[arg(long, value_enum, default_value = "info")]
    log_level: LogLevel,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.log_format, args.log_level);

    let mut channel = Channel::new(LoopbackEndpoint::new());
    channel.send(&Envelope::new(MessageType(1), &b"ping"[..]))?;
    channel.send(&Envelope::new(MessageType(2), &b"pong"[..]))?;

    let mut poller = AsyncPoller::new(channel, Duration::from_millis(args.period_ms));
    let deadline = Duration::from_millis(args.deadline_ms);

    while let Some(envelope) = poller.next_within(deadline).await? {
        tracing::info!(msg_type = %envelope.msg_type(), len = envelope.len(), "received");
    }

    eprintln!("no message within {deadline:?}, exiting");
    Ok(())
}
