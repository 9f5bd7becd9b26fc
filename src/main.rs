use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use neomind::server::DEFAULT_PORT;
use neomind::voice::{AudioCapture, UtteranceSegmenter, rms};
use neomind::{App, ChatClient, CompanionServer, Config};

/// NeoMind - Voice companion for children
#[derive(Parser)]
#[command(name = "neomind", version, about)]
struct Cli {
    /// Don't speak replies aloud
    #[arg(long)]
    no_tts: bool,

    /// Don't listen on the microphone
    #[arg(long)]
    no_mic: bool,

    /// Chat service URL
    #[arg(long)]
    server_url: Option<String>,

    /// Child's name
    #[arg(long)]
    name: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the keyword-reply chat service
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
        port: u16,
    },
    /// Check the chat service
    Health,
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 if config.debug => "warn,neomind=debug",
        0 => "warn,neomind=info",
        1 => "info,neomind=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Load configuration and apply command-line overrides
fn load_config(cli: &Cli) -> neomind::Result<Config> {
    let mut config = Config::load()?;

    if cli.no_tts {
        config.voice.tts_enabled = false;
    }
    if cli.no_mic {
        config.voice.microphone_enabled = false;
    }
    if cli.verbose > 0 {
        config.debug = true;
    }
    if let Some(url) = &cli.server_url {
        config.server_url = url.trim_end_matches('/').to_string();
    }
    if let Some(name) = cli.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        config.child_name = name.to_string();
    }

    Ok(config)
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    if let Some(cmd) = cli.command {
        return match cmd {
            Command::Serve { port } => Ok(CompanionServer::new(port).run().await?),
            Command::Health => health(&config).await,
            Command::TestMic { duration } => test_mic(duration).await,
        };
    }

    tracing::info!(
        child = %config.child_name,
        server = %config.server_url,
        face = ?config.face,
        "starting NeoMind"
    );
    tracing::debug!(?config, "loaded configuration");

    App::from_config(&config).run().await?;
    Ok(())
}

/// Check the chat service once
async fn health(config: &Config) -> anyhow::Result<()> {
    let client = ChatClient::new(config.server_url.clone());
    let status = client.health().await;

    println!("{}: {status}", client.base_url());
    if status.is_healthy() {
        Ok(())
    } else {
        anyhow::bail!("chat service is not healthy")
    }
}

/// Test microphone input
#[allow(clippy::future_not_send)]
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    let mut capture = AudioCapture::new()?;
    capture.start()?;
    println!("---");

    for i in 0..duration {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let frames = capture.take_frames();
        let samples: Vec<f32> = frames.iter().flatten().copied().collect();
        let energy = rms(&samples);
        let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);
        let speech = frames
            .iter()
            .filter(|f| UtteranceSegmenter::is_speech(f))
            .count();

        // Visual meter
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let meter_len = (energy * 100.0).min(50.0) as usize;
        let meter: String = "█".repeat(meter_len) + &" ".repeat(50 - meter_len);

        println!(
            "[{:2}s] RMS: {:.4} | Peak: {:.4} | speech frames: {:3}/{:3} | [{}]",
            i + 1,
            energy,
            peak,
            speech,
            frames.len(),
            meter
        );
    }

    capture.stop();

    println!("\n---");
    println!("If you saw movement in the meter, your mic is working!");
    println!("Speech frames count toward Neo hearing you; if they stay at 0, speak louder");
    println!("or move closer. If RMS stayed near 0, check:");
    println!("  1. Is your mic plugged in?");
    println!("  2. Run: arecord -l (to list devices)");

    Ok(())
}
