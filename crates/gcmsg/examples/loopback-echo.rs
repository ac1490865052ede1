//! Tick-driven echo over an in-process loopback endpoint.
//!
//! Run with:
//!   cargo run -p gcmsg --example loopback-echo --features demo -- --messages 5 --log-level debug

use clap::Parser;
use gcmsg::channel::{ChannelConfig, LengthPrefixed};
use gcmsg::endpoint::LoopbackEndpoint;
use gcmsg::logging::{init_logging, LogFormat, LogLevel};
use gcmsg::{Channel, Envelope};

#[derive(Parser, Debug)]
#[command(about = "Echo messages through a loopback endpoint")]
struct Args {
    /// Number of messages to send
    #[arg(long, default_value_t = 3)]
    messages: u32,

    /// Message type used for every send
    #[arg(long, default_value_t = 7001)]
    msg_type: u32,

    #[arg(long, value_enum, default_value = "text", env = "GCMSG_LOG_FORMAT")]
    log_format: LogFormat,

    #[arg(long, value_enum, default_value = "info", env = "GCMSG_LOG_LEVEL")]
    log_level: LogLevel,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.log_format, args.log_level);

    let config = ChannelConfig {
        advisory_max_payload: Some(1024),
        ..ChannelConfig::default()
    };
    let mut channel = Channel::with_config(LoopbackEndpoint::new(), config);

    for seq in 0..args.messages {
        let body = LengthPrefixed::new(format!("hello #{seq}"));
        let envelope = Envelope::encode(args.msg_type, &body)?;
        channel.send(&envelope)?;
    }

    // Once-per-tick drain, the way a game loop would pump the queue.
    let mut received = Vec::new();
    let mut ticks = 0u32;
    while (received.len() as u32) < args.messages {
        ticks += 1;
        channel.drain(2, &mut received)?;
    }

    for envelope in &received {
        let body: LengthPrefixed = envelope.decode_as()?;
        tracing::info!(
            msg_type = %envelope.msg_type(),
            len = envelope.len(),
            body = %String::from_utf8_lossy(&body.0),
            "echoed"
        );
    }

    let stats = channel.pool().stats();
    eprintln!(
        "{} messages in {ticks} ticks (pool hits={} misses={} retained={})",
        received.len(),
        stats.hits,
        stats.misses,
        channel.pool().retained()
    );
    Ok(())
}
