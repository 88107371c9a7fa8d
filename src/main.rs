#[macro_use]
extern crate tracing;

use std::cell::Cell;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{anyhow, Context as _};
use clap::Parser;
use overscroll::{
    OffsetUpdate, Options, OverscrollController, PointerEvent, ScrollChild, UpdateSource,
};
use overscroll_config::Config;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug, Parser)]
#[command(about = "Replay a pointer script through the over-scroll controller")]
struct Cli {
    /// KDL config with an `overscroll` section.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// JSON array of pointer events; a built-in pull is used if absent.
    #[arg(long, value_name = "PATH")]
    script: Option<PathBuf>,

    /// Distance pulled by the built-in script.
    #[arg(long, default_value_t = 160.)]
    pull: f64,

    /// Lift the finger while still moving down in the built-in script.
    #[arg(long)]
    fling: bool,

    /// Interval between animation frames.
    #[arg(long, default_value_t = 16, value_name = "MS", value_parser = clap::value_parser!(u64).range(1..))]
    frame_ms: u64,

    /// Height of the header that is scaled with the offset.
    #[arg(long, default_value_t = 300.)]
    header_height: f64,

    /// Print one JSON object per offset update.
    #[arg(long)]
    json: bool,
}

/// A list scrolled to its top with items starting at the top edge.
#[derive(Debug)]
struct ListAtTop;

impl ScrollChild for ListAtTop {
    fn can_scroll_toward_top(&self) -> bool {
        false
    }

    fn first_item_top(&self) -> Option<f64> {
        Some(0.)
    }
}

#[derive(Serialize)]
struct Line {
    time: u64,
    offset: f64,
    source: UpdateSource,
    header_scale: f64,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let directives = env::var("RUST_LOG").unwrap_or_else(|_| "overscroll=debug".to_owned());
    let env_filter = EnvFilter::builder().parse_lossy(directives);
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let options = match &cli.config {
        Some(path) => {
            let config = Config::load(path).map_err(|err| anyhow!("{err:?}"))?;
            Options::from_config(&config.overscroll)
        }
        None => Options::default(),
    };
    debug!("{options:?}");

    let events: Vec<PointerEvent> = match &cli.script {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("error reading {path:?}"))?;
            serde_json::from_str(&text).with_context(|| format!("error parsing {path:?}"))?
        }
        None => builtin_script(cli.pull, cli.fling, cli.frame_ms),
    };

    let mut controller = OverscrollController::new(ListAtTop, options)?;

    let time = Rc::new(Cell::new(0));
    let json = cli.json;
    let header_height = cli.header_height;
    let listener_time = time.clone();
    controller.set_listener(move |update: OffsetUpdate| {
        let line = Line {
            time: listener_time.get(),
            offset: update.offset,
            source: update.source,
            header_scale: (header_height + update.offset) / header_height,
        };
        print_line(&line, json);
    });

    let mut frame_time = events.first().map_or(0, PointerEvent::timestamp);
    for event in &events {
        while controller.are_animations_ongoing() && frame_time <= event.timestamp() {
            time.set(frame_time);
            controller.advance_animations(frame_time);
            frame_time += cli.frame_ms;
        }

        let was_animating = controller.are_animations_ongoing();
        time.set(event.timestamp());
        let consumed = controller.dispatch(event);
        debug!("{:?} at {}: consumed {consumed}", event.kind, event.position());

        if !was_animating && controller.are_animations_ongoing() {
            frame_time = event.timestamp() + cli.frame_ms;
        }
    }

    while controller.are_animations_ongoing() {
        time.set(frame_time);
        controller.advance_animations(frame_time);
        frame_time += cli.frame_ms;
    }

    info!("settled at offset {}", controller.offset());
    Ok(())
}

fn print_line(line: &Line, json: bool) {
    if json {
        match serde_json::to_string(line) {
            Ok(text) => println!("{text}"),
            Err(err) => warn!("error serializing update: {err:?}"),
        }
    } else {
        println!(
            "{:>6} ms  {:<8}  offset {:>8.3}  header scale {:.3}",
            line.time,
            format!("{:?}", line.source),
            line.offset,
            line.header_scale
        );
    }
}

/// Touches at 100, pulls down by `pull` in ten steps, then lifts.
fn builtin_script(pull: f64, fling: bool, step_ms: u64) -> Vec<PointerEvent> {
    const START: f64 = 100.;
    const STEPS: u32 = 10;

    let step = pull / f64::from(STEPS);
    let mut events = vec![PointerEvent::down(START, 0)];

    let mut time = 0;
    for i in 1..=STEPS {
        time += step_ms;
        events.push(PointerEvent::motion(START + step * f64::from(i), time));
    }

    time += step_ms;
    let last = START + pull;
    let release = if fling { last + step } else { last - step };
    events.push(PointerEvent::up(release, time));

    events
}
