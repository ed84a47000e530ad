use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use hark::config::{CaptureBackend, SpeechBackend};
use hark::nlu::stub::{self, StubAnswers};
use hark::voice::TextToSpeech;
use hark::{
    AnswerPipeline, AnswerRepo, AnswerSource, AnswerStore, CachePolicy, CaptureOptions, Config,
    ConsoleSynthesizer, Error, HttpNluClient, KeyboardRecognizer, MicrophoneRecognizer, NluClient,
    Recognizer, Session, SpeakerSynthesizer, Synthesizer, TerminalSurface, db, speech,
};

/// Hark - voice assistant front end
#[derive(Parser)]
#[command(name = "hark", version, about)]
struct Cli {
    /// NLU service base URL (e.g. "http://localhost:8000")
    #[arg(long, env = "HARK_NLU_URL")]
    nlu_url: Option<String>,

    /// Skip the answer cache entirely
    #[arg(long)]
    no_cache: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Listen for utterances and answer them (default)
    Listen,
    /// Answer one typed utterance
    Ask {
        /// The utterance, as it would have been transcribed
        text: String,
    },
    /// Check that the NLU service is up
    Status,
    /// Inspect or edit the answer cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
    /// Speak text through the configured synthesizer
    Say {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
    },
    /// Run a local stand-in NLU service
    Stub {
        /// Port to listen on
        #[arg(short, long, default_value = "8000")]
        port: u16,
        /// TOML file with an `[answers]` table of canned replies
        #[arg(short, long)]
        answers: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Print the cached answer for an utterance
    Get { key: String },
    /// Store an answer for an utterance
    Set { key: String, value: String },
    /// Forget one utterance
    Remove { key: String },
    /// List all cached answers
    List,
    /// Forget everything
    Clear,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity; RUST_LOG wins when set
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info,hark=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    if let Some(url) = &cli.nlu_url {
        config.set_nlu_url(url)?;
    }
    if cli.no_cache {
        config.cache.enabled = false;
    }
    tracing::debug!(?config, "loaded configuration");

    match cli.command.unwrap_or(Command::Listen) {
        Command::Listen => listen(&config).await,
        Command::Ask { text } => ask(&config, &text).await,
        Command::Status => status(&config).await,
        Command::Cache { action } => cache(&config, action),
        Command::Say { text } => say(&config, &text).await,
        Command::Stub { port, answers } => {
            let answers = answers
                .map(|path| StubAnswers::load(&path))
                .transpose()?
                .unwrap_or_default();
            stub::run(port, answers).await?;
            Ok(())
        }
    }
}

/// Interactive loop: one capture session per turn
async fn listen(config: &Config) -> anyhow::Result<()> {
    let pipeline = Arc::new(build_pipeline(config)?);
    let recognizer = build_recognizer(config);
    let push_to_talk = config.capture.backend == CaptureBackend::Microphone;

    let session = Session::new(
        recognizer,
        pipeline,
        CaptureOptions::single_shot(&config.capture.locale),
    );
    if !session.is_supported() {
        return Ok(());
    }

    if push_to_talk {
        println!("Press Enter to speak, Ctrl-D to quit.");
    } else {
        println!("Type what you would say, Ctrl-D to quit.");
    }

    loop {
        if push_to_talk && !wait_for_enter().await? {
            break;
        }

        match session.trigger().await {
            Ok(Some(resolution)) => {
                tracing::debug!(source = ?resolution.source, "interaction complete");
            }
            Ok(None) => {}
            // Already shown on the surface
            Err(Error::Nlu(_)) => {}
            Err(e) => tracing::error!(error = %e, "interaction failed"),
        }

        if session.input_closed() {
            break;
        }
    }

    Ok(())
}

/// Resolve and speak one utterance
async fn ask(config: &Config, text: &str) -> anyhow::Result<()> {
    let synthesizer = build_synthesizer(config)?;
    let pipeline = pipeline_with(config, Arc::clone(&synthesizer))?;

    match pipeline.resolve_and_speak(text).await {
        Ok(resolution) => {
            if resolution.source == AnswerSource::Cache {
                tracing::info!("answered from cache");
            }
            synthesizer.wait_idle().await;
            Ok(())
        }
        // Already shown on the surface
        Err(Error::Nlu(_)) => Err(anyhow::anyhow!("NLU processing failed")),
        Err(e) => Err(e.into()),
    }
}

/// Query the NLU service status endpoint
async fn status(config: &Config) -> anyhow::Result<()> {
    let client = HttpNluClient::new(&config.nlu)?;
    let body = client.status().await.map_err(Error::from)?;
    println!("{}: {body}", config.nlu.base_url);
    Ok(())
}

fn cache(config: &Config, action: CacheAction) -> anyhow::Result<()> {
    let store = AnswerRepo::new(db::init(&config.cache.path)?);

    match action {
        CacheAction::Get { key } => match store.get(&key)? {
            Some(value) => println!("{value}"),
            None => anyhow::bail!("no cached answer for {key:?}"),
        },
        CacheAction::Set { key, value } => store.set(&key, &value)?,
        CacheAction::Remove { key } => {
            if !store.remove(&key)? {
                anyhow::bail!("no cached answer for {key:?}");
            }
        }
        CacheAction::List => {
            for entry in store.entries()? {
                println!("{:?} -> {:?}", entry.key, entry.value);
            }
        }
        CacheAction::Clear => {
            let removed = store.clear()?;
            println!("removed {removed} cached answers");
        }
    }

    Ok(())
}

async fn say(config: &Config, text: &str) -> anyhow::Result<()> {
    let synthesizer = build_synthesizer(config)?;
    speech::say(synthesizer.as_ref(), text).await?;
    synthesizer.wait_idle().await;
    Ok(())
}

fn build_pipeline(config: &Config) -> anyhow::Result<AnswerPipeline> {
    pipeline_with(config, build_synthesizer(config)?)
}

fn pipeline_with(
    config: &Config,
    synthesizer: Arc<dyn Synthesizer>,
) -> anyhow::Result<AnswerPipeline> {
    let nlu: Arc<dyn NluClient> = Arc::new(HttpNluClient::new(&config.nlu)?);
    let pipeline = AnswerPipeline::new(Arc::new(TerminalSurface::new()), nlu, synthesizer);

    if !config.cache.enabled {
        return Ok(pipeline);
    }

    let store: Arc<dyn AnswerStore> = Arc::new(AnswerRepo::new(db::init(&config.cache.path)?));
    let policy = if config.cache.write_through {
        CachePolicy::WriteThrough
    } else {
        CachePolicy::ReadOnly
    };
    Ok(pipeline.with_cache(store, policy))
}

fn build_recognizer(config: &Config) -> Arc<dyn Recognizer> {
    match config.capture.backend {
        CaptureBackend::Keyboard => Arc::new(KeyboardRecognizer::new()),
        CaptureBackend::Microphone => Arc::new(MicrophoneRecognizer::new(
            config.openai_api_key.clone(),
            config.capture.stt_model.clone(),
            config.capture.max_listen,
        )),
    }
}

fn build_synthesizer(config: &Config) -> anyhow::Result<Arc<dyn Synthesizer>> {
    if config.speech.backend == SpeechBackend::Console {
        return Ok(Arc::new(ConsoleSynthesizer::new()));
    }

    let Some(api_key) = config.openai_api_key.clone() else {
        tracing::warn!("OPENAI_API_KEY not set, speaking to the console instead");
        return Ok(Arc::new(ConsoleSynthesizer::new()));
    };
    if !SpeakerSynthesizer::is_available() {
        tracing::warn!("no audio output device, speaking to the console instead");
        return Ok(Arc::new(ConsoleSynthesizer::new()));
    }

    let tts = TextToSpeech::new(
        api_key,
        config.speech.tts_model.clone(),
        config.speech.tts_voice.clone(),
        config.speech.tts_speed,
    )?;
    Ok(Arc::new(SpeakerSynthesizer::new(tts)))
}

/// Block until Enter; false on EOF
async fn wait_for_enter() -> anyhow::Result<bool> {
    print!("[press Enter] ");
    std::io::stdout().flush()?;

    let read = tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)
    })
    .await??;

    Ok(read > 0)
}
