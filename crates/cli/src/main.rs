use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use engine::{
    Command, Engine, EngineConfig, Event, FileProjectStore, PlaybackState, Timestamp,
    VideoTimeline, format_timestamp, parse_timestamp,
};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

mod timeline;

use timeline::ScriptedTimeline;

type ProjectEngine = Engine<ScriptedTimeline, FileProjectStore>;

/// Slideo - rehearse presentations recorded as a single video
#[derive(Parser)]
#[command(name = "slideo")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Pause tolerance around each breakpoint, in milliseconds
    #[arg(long, global = true)]
    tolerance_ms: Option<i64>,

    /// JSON file with engine calibration (kebab-case keys)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a project for a video and write it immediately
    New {
        /// Project file; `.eo` is appended when there is no extension
        project: PathBuf,
        video: PathBuf,
    },
    /// Print the project's video and breakpoints
    Show { project: PathBuf },
    /// Add breakpoints (HH:MM:SS.mmm, MM:SS, SS.mmm or plain milliseconds)
    Add {
        project: PathBuf,
        #[arg(required = true, value_parser = parse_time)]
        times: Vec<Timestamp>,
    },
    /// Remove breakpoints
    Remove {
        project: PathBuf,
        #[arg(required = true, value_parser = parse_time)]
        times: Vec<Timestamp>,
    },
    /// Add breakpoints every `--every` from `--from` up to and including `--to`
    AddEvery {
        project: PathBuf,
        #[arg(long, value_parser = parse_time)]
        from: Timestamp,
        #[arg(long, value_parser = parse_time)]
        to: Timestamp,
        #[arg(long, value_parser = parse_time)]
        every: Timestamp,
    },
    /// Play the given positions through the engine and report each pause
    Rehearse {
        project: PathBuf,
        #[arg(required = true, value_parser = parse_time)]
        positions: Vec<Timestamp>,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref(), cli.tolerance_ms)?;

    match cli.command {
        Commands::New { project, video } => run_new(config, project, video),
        Commands::Show { project } => run_show(config, &project),
        Commands::Add { project, times } => {
            run_edit(config, &project, Command::AddBreakpoints { at: times })
        }
        Commands::Remove { project, times } => {
            run_edit(config, &project, Command::RemoveBreakpoints { at: times })
        }
        Commands::AddEvery {
            project,
            from,
            to,
            every,
        } => run_edit(
            config,
            &project,
            Command::AddBreakpointsRegularly { from, to, every },
        ),
        Commands::Rehearse { project, positions } => run_rehearse(config, &project, &positions),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn parse_time(value: &str) -> std::result::Result<Timestamp, String> {
    parse_timestamp(value).map_err(|error| error.to_string())
}

fn load_config(path: Option<&Path>, tolerance_ms: Option<i64>) -> Result<EngineConfig> {
    let mut config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("failed to parse config {}", path.display()))?
        }
        None => EngineConfig::default(),
    };
    if let Some(tolerance_ms) = tolerance_ms {
        if tolerance_ms <= 0 {
            bail!("--tolerance-ms must be positive, got {tolerance_ms}");
        }
        config.pause_tolerance_ms = tolerance_ms;
    }
    validate_config(&config)?;
    debug!(?config, "engine config loaded");
    Ok(config)
}

fn validate_config(config: &EngineConfig) -> Result<()> {
    for (key, value) in [
        ("pause-tolerance-ms", config.pause_tolerance_ms),
        ("max-seek-step-ms", config.max_seek_step_ms),
        ("seek-step-divisor", config.seek_step_divisor),
    ] {
        if value <= 0 {
            bail!("{key} must be positive, got {value}");
        }
    }
    Ok(())
}

fn engine_with(config: EngineConfig) -> ProjectEngine {
    Engine::with_config(ScriptedTimeline::default(), FileProjectStore, config)
}

fn open(config: EngineConfig, project: &Path) -> Result<ProjectEngine> {
    let mut engine = engine_with(config);
    let events = engine
        .handle_command(Command::OpenProject {
            path: project.to_path_buf(),
        })
        .with_context(|| format!("failed to open project {}", project.display()))?;
    report(&events);
    Ok(engine)
}

fn run_new(config: EngineConfig, project: PathBuf, video: PathBuf) -> Result<()> {
    let mut engine = engine_with(config);
    let events = engine
        .handle_command(Command::NewProject {
            project_file: project.clone(),
            video_file: video,
        })
        .with_context(|| format!("failed to create project {}", project.display()))?;
    report(&events);

    if let Some(snapshot) = engine.snapshot() {
        println!("created {}", snapshot.project_file.display());
    }
    Ok(())
}

fn run_show(config: EngineConfig, project: &Path) -> Result<()> {
    let engine = open(config, project)?;
    let Some(snapshot) = engine.snapshot() else {
        bail!("project {} is not loaded", project.display());
    };

    println!("{}", snapshot.title);
    println!("project: {}", snapshot.project_file.display());
    println!("video:   {}", snapshot.video_file);
    println!("breakpoints: {}", snapshot.breakpoints.len());
    for (index, at) in snapshot.breakpoints.iter().enumerate() {
        println!("  {:>3}  {}", index + 1, format_timestamp(*at));
    }
    Ok(())
}

fn run_edit(config: EngineConfig, project: &Path, command: Command) -> Result<()> {
    let mut engine = open(config, project)?;
    let events = engine
        .handle_command(command)
        .context("failed to edit breakpoints")?;
    if events.is_empty() {
        println!("no change");
        return Ok(());
    }

    let events = engine
        .handle_command(Command::SaveProject)
        .with_context(|| format!("failed to save project {}", project.display()))?;
    report(&events);
    println!(
        "saved {} breakpoint(s) to {}",
        engine.breakpoints().len(),
        project.display()
    );
    Ok(())
}

fn run_rehearse(config: EngineConfig, project: &Path, positions: &[Timestamp]) -> Result<()> {
    let mut engine = open(config, project)?;
    engine
        .handle_command(Command::StartSlideshow { from_here: false })
        .context("failed to start playback")?;

    let mut pauses = 0_usize;
    for &at in positions {
        if engine.timeline().state() == PlaybackState::Paused {
            engine
                .handle_command(Command::Play)
                .context("failed to resume playback")?;
        }
        engine.timeline_mut().advance_to(at);
        let events = engine
            .handle_command(Command::PositionChanged { at })
            .context("failed to deliver position")?;
        for event in &events {
            if let Event::BreakpointReached { at, position } = event {
                pauses += 1;
                println!(
                    "paused at {} (breakpoint {})",
                    format_timestamp(*position),
                    format_timestamp(*at)
                );
            }
        }
    }

    println!("{pauses} pause(s) over {} position(s)", positions.len());
    Ok(())
}

fn report(events: &[Event]) {
    for event in events {
        match event {
            Event::Warning { message } => warn!("{message}"),
            Event::Error(error) => warn!(kind = ?error.kind, "{}", error.message),
            other => debug!(event = ?other, "engine event"),
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use std::path::PathBuf;

    use super::{Cli, Commands, load_config};

    #[test]
    fn times_accept_clock_and_millisecond_forms() {
        let cli = Cli::try_parse_from(["slideo", "add", "talk.eo", "00:01:02.500", "750"])
            .expect("valid arguments");

        let Commands::Add { times, .. } = cli.command else {
            panic!("expected add command");
        };
        assert_eq!(times, vec![62_500, 750]);
    }

    #[test]
    fn malformed_time_is_rejected_by_the_parser() {
        assert!(Cli::try_parse_from(["slideo", "add", "talk.eo", "1:75"]).is_err());
    }

    #[test]
    fn tolerance_flag_overrides_default() {
        let config = load_config(None, Some(25)).expect("valid tolerance");
        assert_eq!(config.pause_tolerance_ms, 25);
        assert!(load_config(None, Some(0)).is_err());
    }

    #[test]
    fn config_file_values_must_be_positive() {
        let path = temp_config(r#"{ "pause-tolerance-ms": 0 }"#);
        let error = load_config(Some(path.as_path()), None).expect_err("zero tolerance must fail");
        assert!(error.to_string().contains("pause-tolerance-ms"));

        std::fs::write(&path, r#"{ "pause-tolerance-ms": -10 }"#).expect("rewrite config");
        assert!(load_config(Some(path.as_path()), None).is_err());

        std::fs::write(&path, r#"{ "pause-tolerance-ms": 20 }"#).expect("rewrite config");
        let config = load_config(Some(path.as_path()), Some(15)).expect("flag overrides file");
        assert_eq!(config.pause_tolerance_ms, 15);

        std::fs::remove_file(&path).expect("clean up config");
    }

    fn temp_config(text: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "slideo-config-{}-{}.json",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("system clock must be after unix epoch")
                .as_nanos()
        ));
        std::fs::write(&path, text).expect("write config");
        path
    }
}
