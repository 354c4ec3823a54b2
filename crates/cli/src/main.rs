#![deny(warnings)]

use anyhow::Context;
use clap::Parser;
use sentio_core::camera::SyntheticFrameSource;
use sentio_core::classify::HeuristicClassifier;
use sentio_core::companion::{Companion, CompanionRequest, HostedCompanion};
use sentio_core::config::{
    resolve_api_key, ApiKeys, AppConfig, DetectorConfig, Env, StdEnv,
    DEFAULT_DETECTION_INTERVAL_SECS, DEFAULT_SMOOTHING_WINDOW, ENV_OPENAI_API_KEY,
};
use sentio_core::detector::{EmotionDetector, EmotionReading};
use sentio_core::emotion::Emotion;
use sentio_core::prompts::random_writing_prompt;
use sentio_core::session::CaptureSession;
use sentio_core::store::{JournalEntry, JournalStore};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const DEFAULT_JOURNAL_DB: &str = "data/sentio_journal.db";
const FRAME_INTERVAL_MS: u64 = 33;
const READING_CHANNEL_CAPACITY: usize = 16;

#[derive(Parser, Debug)]
#[command(name = "sentio")]
#[command(about = "Emotion-aware journaling session in the terminal")]
struct Args {
    /// Recent-observation buffer capacity.
    #[arg(long, default_value_t = DEFAULT_SMOOTHING_WINDOW)]
    smoothing_window: usize,

    /// Minimum seconds between classifier invocations.
    #[arg(long, default_value_t = DEFAULT_DETECTION_INTERVAL_SECS)]
    detection_interval: f64,

    /// How long to watch the (synthetic) camera before summarizing.
    #[arg(long, default_value_t = 30)]
    duration_secs: u64,

    /// Where to write the session log; defaults to a timestamped filename.
    #[arg(long)]
    export_path: Option<PathBuf>,

    /// Journal database location.
    #[arg(long)]
    journal_db: Option<PathBuf>,

    /// Journal entry text to save once the session ends.
    #[arg(long)]
    note: Option<String>,

    #[arg(long, env = ENV_OPENAI_API_KEY)]
    openai_api_key: Option<String>,

    /// Seed for the synthetic frame source.
    #[arg(long, default_value_t = 17)]
    camera_seed: u64,

    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    let env = StdEnv;
    let cfg = build_config(&args, &env)?;

    tracing::info!(
        smoothing_window = cfg.detector.smoothing_window.get(),
        detection_interval_secs = cfg.detector.detection_interval.as_secs_f64(),
        duration_secs = args.duration_secs,
        "config loaded"
    );

    run_session(cfg, args).await
}

async fn run_session(cfg: AppConfig, args: Args) -> anyhow::Result<()> {
    let detector = EmotionDetector::new(cfg.detector);
    let source = SyntheticFrameSource::new(64, 48, args.camera_seed);
    let classifier = HeuristicClassifier::new();

    let mut session = CaptureSession::spawn(
        source,
        classifier,
        detector,
        Duration::from_millis(FRAME_INTERVAL_MS),
        READING_CHANNEL_CAPACITY,
    )
    .context("start capture session")?;

    let deadline = tokio::time::sleep(Duration::from_secs(args.duration_secs));
    tokio::pin!(deadline);

    let mut last_reading: Option<EmotionReading> = None;
    loop {
        tokio::select! {
            _ = &mut deadline => break,
            reading = session.next_reading() => match reading {
                Some(reading) => {
                    if let Some(error) = &reading.error {
                        tracing::warn!(error = %error, "detection fell back to neutral");
                    } else {
                        tracing::info!(
                            emotion = %reading.emotion,
                            smoothed = %reading.smoothed_emotion,
                            confidence = reading.confidence,
                            face_detected = reading.face_detected,
                            "reading"
                        );
                    }
                    last_reading = Some(reading);
                }
                None => break,
            }
        }
    }

    session.stop();
    let detector = tokio::task::spawn_blocking(move || session.finish())
        .await
        .context("join capture worker")??;

    match detector.session_summary() {
        Some(summary) => {
            tracing::info!(
                duration_minutes = summary.duration_minutes,
                total_logged = summary.total_emotions_logged,
                most_common = %summary.most_common_emotion,
                session_start = %summary.session_start,
                session_end = %summary.session_end,
                "session summary"
            );
            for (emotion, count) in &summary.emotion_breakdown {
                tracing::info!(emotion = %emotion, count = *count, "breakdown");
            }
        }
        None => tracing::info!("no emotions were logged this session"),
    }

    let exported = detector
        .export_emotion_log(args.export_path.as_deref())
        .context("export emotion log")?;
    tracing::info!(path = %exported.display(), "session log written");

    if let Some(note) = args.note {
        save_journal_entry(&cfg, &detector, last_reading, note).await?;
    }

    Ok(())
}

async fn save_journal_entry(
    cfg: &AppConfig,
    detector: &EmotionDetector,
    last_reading: Option<EmotionReading>,
    note: String,
) -> anyhow::Result<()> {
    let emotion_label = detector
        .session_summary()
        .map(|s| s.most_common_emotion)
        .unwrap_or_else(|| detector.smoothed_emotion());
    let confidence = last_reading.map(|r| r.confidence).unwrap_or(0.0);
    let prompt = random_writing_prompt(Emotion::from_label_lossy(&emotion_label));

    let mut entry = JournalEntry::new(emotion_label, confidence, note).with_prompt(prompt);

    if let Some(key) = &cfg.api_keys.openai {
        let companion = HostedCompanion::new(key.expose().to_owned());
        let request = CompanionRequest {
            entry_text: entry.entry_text.clone(),
            emotion: entry.emotion.clone(),
            confidence: entry.confidence,
            voice_tone: None,
        };
        match companion.respond(request).await {
            Ok(reply) => {
                tracing::info!(reply = %reply.text, "companion replied");
                entry = entry.with_ai_response(reply.text);
            }
            Err(e) => tracing::warn!(error = %e, "companion reply failed, saving entry without it"),
        }
    }

    let db_path = cfg
        .journal_db
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_JOURNAL_DB));
    let store = JournalStore::open(&db_path)
        .with_context(|| format!("open journal database {}", db_path.display()))?;
    store.insert(&entry).context("insert journal entry")?;
    tracing::info!(id = %entry.id, db = %db_path.display(), "journal entry saved");

    Ok(())
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(
            level
                .parse()
                .with_context(|| format!("invalid --log-level: {level}"))?,
        )
        .from_env_lossy();

    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

fn build_config(args: &Args, env: &impl Env) -> anyhow::Result<AppConfig> {
    let detector = DetectorConfig::new(args.smoothing_window, args.detection_interval)?;
    let openai = resolve_api_key(args.openai_api_key.clone(), ENV_OPENAI_API_KEY, env)?;

    Ok(AppConfig {
        detector,
        api_keys: ApiKeys { openai },
        journal_db: args.journal_db.clone(),
    })
}
