//! Prints a LiveKit join token for manual testing, e.g. with LiveKit Meet.
//!
//! Credentials come from the environment (or the env file), falling back to
//! the `--dev` server defaults.

use clap::Parser;
use std::process::ExitCode;
use voxgate_server::config::load_env_file;
use voxgate_voice::{
    LiveKitConfig, VoiceService, DEFAULT_LIVEKIT_URL, DEV_LIVEKIT_API_KEY, DEV_LIVEKIT_API_SECRET,
};

const RULE_WIDTH: usize = 70;

#[derive(Debug, Parser)]
#[command(version, about = "Generate a LiveKit token to join a room for testing")]
struct Args {
    /// Room to join.
    #[arg(default_value = "test-room")]
    room_name: String,

    /// Participant identity and display name.
    #[arg(default_value = "user")]
    participant_name: String,

    /// Optional participant metadata.
    #[arg(long)]
    metadata: Option<String>,

    #[arg(long, env = "LIVEKIT_URL", default_value = DEFAULT_LIVEKIT_URL)]
    url: String,

    #[arg(long, env = "LIVEKIT_API_KEY", default_value = DEV_LIVEKIT_API_KEY, hide_env_values = true)]
    api_key: String,

    #[arg(long, env = "LIVEKIT_API_SECRET", default_value = DEV_LIVEKIT_API_SECRET, hide_env_values = true)]
    api_secret: String,
}

fn main() -> ExitCode {
    load_env_file();
    let args = Args::parse();

    let service = VoiceService::new(LiveKitConfig::new(
        &args.url,
        &args.api_key,
        &args.api_secret,
    ));

    let token = match service.generate_join_token(
        &args.room_name,
        &args.participant_name,
        &args.participant_name,
        args.metadata.as_deref(),
    ) {
        Ok(token) => token,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let rule = "=".repeat(RULE_WIDTH);
    println!("{rule}");
    println!("LiveKit Connection Details");
    println!("{rule}");
    println!("LiveKit URL:     {}", args.url);
    println!("Room Name:       {}", args.room_name);
    println!("Participant:     {}", args.participant_name);
    println!("\nToken:");
    println!("{token}");
    println!("{rule}");
    println!("\nOpen LiveKit Meet: https://meet.livekit.io/custom");
    println!("Paste the URL and token above to join the room");
    println!("{rule}");

    ExitCode::SUCCESS
}
