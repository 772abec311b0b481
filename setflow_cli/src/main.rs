use clap::{Parser, Subcommand};
use setflow_core::csv_rollup::{cleanup_processed_wals, wal_to_csv_and_archive};
use setflow_core::pairing::PairOutcome;
use setflow_core::protocol::Effect;
use setflow_core::session::StepOutcome;
use setflow_core::store::template_path;
use setflow_core::timer::TickPacer;
use setflow_core::*;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "setflow")]
#[command(about = "Structured resistance-training protocol runner", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Debug-level logging on stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one exercise slot, reading commands from stdin
    ///
    /// Commands: start, rec <weight> <reps> <effort>, mini <reps> <y|n>,
    /// tick [n], stop, status, done
    Run {
        /// standard, myo-reps, drop-set, superset or giant-set
        #[arg(long)]
        method: ProtocolMethod,

        /// Exercise id from the catalog
        #[arg(long)]
        exercise: String,

        /// Superset partner exercise id
        #[arg(long)]
        pair: Option<String>,

        /// Remaining giant-set exercise ids, comma separated
        #[arg(long, value_delimiter = ',')]
        giant: Vec<String>,

        /// Target supersets / circuits, or max drops for a drop set
        #[arg(long)]
        target: Option<u32>,

        /// Take the superset partner from this template's pairing
        #[arg(long)]
        template: Option<String>,

        /// Timers only advance on `tick`, never with wall time
        #[arg(long)]
        manual_clock: bool,
    },

    /// Roll up tracked sets from the WAL to CSV
    Rollup {
        /// Clean up processed WAL files after rollup
        #[arg(long)]
        cleanup: bool,
    },

    /// Show raw and weighted volume per exercise and method
    Volume {
        #[arg(long, default_value_t = 7)]
        days: i64,
    },

    /// List finished protocols from the protocol log
    Protocols {
        #[arg(long, default_value_t = 7)]
        days: i64,
    },

    /// List the exercise catalog
    Exercises,

    /// Author workout templates
    Template {
        /// Template name
        #[arg(long, default_value = "default")]
        name: String,

        #[command(subcommand)]
        action: TemplateAction,
    },
}

#[derive(Subcommand)]
enum TemplateAction {
    /// Append an exercise slot
    Add {
        exercise: String,
        #[arg(long, default_value_t = 3)]
        sets: u32,
        #[arg(long, default_value_t = 90)]
        rest: u32,
    },
    /// Pair a slot with another exercise as a superset
    Pair { slot: String, exercise: String },
    /// Remove a slot's superset pairing
    Unpair { slot: String },
    /// Print the template
    Show,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        setflow_core::logging::init_with_level("debug");
    } else {
        setflow_core::logging::init();
    }

    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());

    match cli.command {
        Commands::Run {
            method,
            exercise,
            pair,
            giant,
            target,
            template,
            manual_clock,
        } => {
            let plan = RunPlan {
                method,
                exercise,
                pair,
                giant,
                target,
                template,
                manual_clock,
            };
            cmd_run(&data_dir, &config, plan)
        }
        Commands::Rollup { cleanup } => cmd_rollup(&data_dir, cleanup),
        Commands::Volume { days } => cmd_volume(&data_dir, days),
        Commands::Protocols { days } => cmd_protocols(&data_dir, days),
        Commands::Exercises => cmd_exercises(),
        Commands::Template { name, action } => cmd_template(&data_dir, &name, action),
    }
}

struct RunPlan {
    method: ProtocolMethod,
    exercise: String,
    pair: Option<String>,
    giant: Vec<String>,
    target: Option<u32>,
    template: Option<String>,
    manual_clock: bool,
}

fn resolve_exercise(id: &str) -> Result<ExerciseRef> {
    let catalog = get_default_catalog();
    let errors = catalog.validate();
    if !errors.is_empty() {
        eprintln!("Catalog validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::CatalogValidation("Invalid catalog".into()));
    }

    catalog.resolve(id).ok_or_else(|| {
        Error::Other(format!(
            "Unknown exercise: {} (run `setflow exercises` for the list)",
            id
        ))
    })
}

fn cmd_run(data_dir: &Path, config: &Config, plan: RunPlan) -> Result<()> {
    let wal_dir = data_dir.join("wal");
    std::fs::create_dir_all(&wal_dir)?;

    let exercise = resolve_exercise(&plan.exercise)?;
    let protocol_log = JsonlLog::new(wal_dir.join("protocol_log.wal"));
    let tracker = JsonlLog::new(wal_dir.join("tracked_sets.wal"));

    let mut session = ProtocolSession::new(
        exercise.clone(),
        config.protocols.clone(),
        protocol_log,
        tracker,
    )
    .with_persistence(config.persistence.clone());

    let mut pacer = if plan.manual_clock {
        session = session.with_clock(ManualClock::default());
        None
    } else {
        Some(TickPacer::per_second(SystemClock))
    };

    session.select_method(plan.method);
    configure(&mut session, data_dir, &exercise, &plan)?;

    println!("{} ({})", exercise.name, plan.method);
    print_status(&session);

    let stdin = io::stdin();
    let interactive = stdin.is_terminal();
    let mut lines = stdin.lock().lines();

    loop {
        if interactive {
            print!("> ");
            io::stdout().flush()?;
        }
        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&command, args)) = words.split_first() else {
            continue;
        };

        if let Some(pacer) = pacer.as_mut() {
            let due = pacer.due_ticks();
            if due > 0 {
                match session.advance(due) {
                    Ok(caught_up) => report(&session, caught_up),
                    Err(rejection) => {
                        tracing::warn!("Could not apply {} elapsed ticks: {}", due, rejection);
                        println!("✗ rejected: {}", rejection);
                    }
                }
            }
        }

        let before = session.phase_name();
        let step = match command {
            "start" => session.start(),
            "rec" => session.record_performance(parse_set(args)),
            "mini" => session.record_performance(parse_mini(args)),
            "tick" => {
                let n = args.first().and_then(|n| n.parse().ok()).unwrap_or(1);
                session.advance(n)
            }
            "stop" => session.force_stop(),
            "status" => {
                print_status(&session);
                continue;
            }
            "done" | "quit" => break,
            other => {
                println!("? unknown command: {}", other);
                continue;
            }
        };

        let finished = match step {
            Ok(outcome) => {
                for effect in &outcome.effects {
                    print_effect(effect);
                }
                if session.phase_name() != before {
                    if let Some(phase) = session.phase_name() {
                        println!("→ {}", phase);
                    }
                }
                match &outcome.completion {
                    Some(report) => {
                        print_completion(report);
                        true
                    }
                    None => false,
                }
            }
            Err(rejection) => {
                println!("✗ rejected: {}", rejection);
                false
            }
        };

        if finished {
            return Ok(());
        }
    }

    if plan.method == ProtocolMethod::Standard {
        let finished = session.finish_standard().inspect_err(|e| {
            println!("✗ standard sets were not tracked: {}", e);
        })?;
        match finished {
            Some(tracked) => println!(
                "✓ Tracked {} standard sets for {} (volume {:.1})",
                tracked.sets.len(),
                tracked.exercise.name,
                tracked.weighted_volume()
            ),
            None => println!("No sets recorded."),
        }
    } else if let Some(phase) = session.phase_name() {
        println!("Input ended in phase {}; nothing was logged.", phase);
    }

    Ok(())
}

/// Print what catching up on wall-clock time produced
fn report<S: ProtocolSink, T: SetTracker>(session: &ProtocolSession<S, T>, step: StepOutcome) {
    for effect in &step.effects {
        print_effect(effect);
    }
    if !step.effects.is_empty() {
        if let Some(phase) = session.phase_name() {
            println!("→ {}", phase);
        }
    }
}

fn configure<S: ProtocolSink, T: SetTracker>(
    session: &mut ProtocolSession<S, T>,
    data_dir: &Path,
    exercise: &ExerciseRef,
    plan: &RunPlan,
) -> Result<()> {
    match plan.method {
        ProtocolMethod::Standard => {}

        ProtocolMethod::MyoReps => {
            if plan.target.is_some() {
                println!("(--target is ignored for myo-reps)");
            }
        }

        ProtocolMethod::DropSet => {
            if let Some(max_drops) = plan.target {
                session.update_config(|config| {
                    if let ProtocolConfig::DropSet(c) = config {
                        c.max_drops = max_drops;
                    }
                })?;
            }
        }

        ProtocolMethod::Superset => {
            let partner = match (&plan.pair, &plan.template) {
                (Some(id), _) => Some(resolve_exercise(id)?),
                (None, Some(name)) => {
                    let template = Template::load(&template_path(data_dir, name))?;
                    template
                        .slot_for_exercise(&exercise.id)
                        .and_then(|slot| template.partner_of(&slot.id))
                        .map(|slot| slot.exercise.clone())
                }
                (None, None) => None,
            };
            let target = plan.target;
            let a = exercise.clone();
            session.update_config(move |config| {
                if let ProtocolConfig::Superset(c) = config {
                    c.exercise_a = Some(a);
                    c.exercise_b = partner;
                    if let Some(target) = target {
                        c.target_supersets = target;
                    }
                }
            })?;
        }

        ProtocolMethod::GiantSet => {
            let mut exercises = vec![exercise.clone()];
            for id in &plan.giant {
                exercises.push(resolve_exercise(id)?);
            }
            let target = plan.target;
            session.update_config(move |config| {
                if let ProtocolConfig::GiantSet(c) = config {
                    c.exercises = exercises.into_iter().map(Some).collect();
                    if let Some(target) = target {
                        c.target_circuits = target;
                    }
                }
            })?;
        }
    }

    if plan.method.is_structured() && !session.can_start() {
        if let Some(Err(reason)) = session.instance().map(|i| i.check_startable()) {
            println!("Start disabled: {}", reason);
        }
    }
    Ok(())
}

fn parse_set(args: &[&str]) -> PerformanceInput {
    PerformanceInput {
        weight: args.first().and_then(|w| w.parse().ok()),
        reps: args.get(1).and_then(|r| r.parse().ok()),
        effort: args.get(2).and_then(|e| e.parse().ok()),
        matched: None,
    }
}

fn parse_mini(args: &[&str]) -> PerformanceInput {
    let matched = args.get(1).and_then(|m| match m.to_lowercase().as_str() {
        "y" | "yes" | "1" | "true" => Some(true),
        "n" | "no" | "0" | "false" => Some(false),
        _ => None,
    });
    PerformanceInput {
        reps: args.first().and_then(|r| r.parse().ok()),
        matched,
        ..PerformanceInput::default()
    }
}

fn print_status<S: ProtocolSink, T: SetTracker>(session: &ProtocolSession<S, T>) {
    let Some(instance) = session.instance() else {
        println!(
            "phase: standard ({} sets recorded)",
            session.standard_entries().len()
        );
        return;
    };

    match instance.timer() {
        Some(timer) => println!(
            "phase: {} ({} remaining)",
            instance.phase_name(),
            timer.remaining()
        ),
        None => println!("phase: {}", instance.phase_name()),
    }
    if let Some(target) = session.target_mini_reps() {
        println!("  mini-set target: {} reps", target);
    }
}

fn print_effect(effect: &Effect) {
    match effect {
        Effect::TimerStarted { kind, duration } => {
            println!("  timer started: {:?} ({})", kind, duration)
        }
        Effect::TimerExpired { kind } => println!("  timer expired: {:?}", kind),
        Effect::TimerDiscarded { kind } => println!("  timer discarded: {:?}", kind),
        Effect::Finished { .. } => {}
    }
}

fn print_completion(report: &CompletionReport) {
    let normalized = &report.normalized;
    println!();
    println!("✓ {} finished: {}", normalized.method, normalized.termination);
    for sets in std::iter::once(&normalized.primary).chain(normalized.companions.iter()) {
        println!(
            "  {}: {} sets, raw volume {:.1}, weighted {:.1} (x{})",
            sets.exercise.name,
            sets.sets.len(),
            sets.raw_volume(),
            normalized.coefficient.apply(sets.raw_volume()),
            normalized.coefficient
        );
    }
    if report.persisted {
        println!("  logged as {}", report.log_entry_id);
    }
    for notification in &report.notifications {
        println!("! {}", notification);
    }
}

fn cmd_rollup(data_dir: &Path, cleanup: bool) -> Result<()> {
    let wal_dir = data_dir.join("wal");
    let wal_path = wal_dir.join("tracked_sets.wal");
    let csv_path = data_dir.join("sets.csv");

    if !wal_path.exists() {
        println!("No WAL file found - nothing to roll up.");
        return Ok(());
    }

    let count = wal_to_csv_and_archive(&wal_path, &csv_path)?;

    println!("✓ Rolled up {} sets to CSV", count);
    println!("  CSV: {}", csv_path.display());

    if cleanup {
        let cleaned = cleanup_processed_wals(&wal_dir)?;
        if cleaned > 0 {
            println!("✓ Cleaned up {} processed WAL files", cleaned);
        }
    }

    Ok(())
}

fn cmd_volume(data_dir: &Path, days: i64) -> Result<()> {
    let wal_path = data_dir.join("wal").join("tracked_sets.wal");
    let csv_path = data_dir.join("sets.csv");

    let batches = load_recent_sets(&wal_path, &csv_path, days)?;
    let summary = volume_summary(&batches);
    if summary.is_empty() {
        println!("No tracked sets in the last {} days.", days);
        return Ok(());
    }

    println!("Volume, last {} days:", days);
    for row in &summary {
        println!(
            "  {:<20} {:<10} {:>3} sets {:>5} reps {:>10.1} raw {:>10.1} weighted",
            row.exercise_id, row.method.as_str(), row.sets, row.reps, row.raw_volume, row.weighted_volume
        );
    }
    let total: f64 = summary.iter().map(|r| r.weighted_volume).sum();
    println!("  total weighted volume: {:.1}", total);
    Ok(())
}

fn cmd_protocols(data_dir: &Path, days: i64) -> Result<()> {
    let log_path = data_dir.join("wal").join("protocol_log.wal");
    let entries = load_recent_protocols(&log_path, days)?;
    if entries.is_empty() {
        println!("No protocols finished in the last {} days.", days);
        return Ok(());
    }

    println!("Protocols, last {} days:", days);
    for entry in &entries {
        println!(
            "  {}  {:<20} {:<10} {}",
            entry.finished_at.format("%Y-%m-%d %H:%M"),
            entry.exercise_id,
            entry.method.as_str(),
            entry.termination
        );
    }
    Ok(())
}

fn cmd_exercises() -> Result<()> {
    for exercise in get_default_catalog().sorted() {
        println!("{:<20} {:<25} {}", exercise.id, exercise.name, exercise.tags.join(", "));
    }
    Ok(())
}

fn cmd_template(data_dir: &Path, name: &str, action: TemplateAction) -> Result<()> {
    let path = template_path(data_dir, name);

    match action {
        TemplateAction::Add {
            exercise,
            sets,
            rest,
        } => {
            let exercise = resolve_exercise(&exercise)?;
            let (_, slot_id) = Template::update(&path, |t| Ok(t.add_slot(exercise, sets, rest)))?;
            println!("✓ Added {}", slot_id);
        }

        TemplateAction::Pair { slot, exercise } => {
            let target = resolve_exercise(&exercise)?;
            let (_, outcome) =
                Template::update(&path, |t| PairingResolver::new(t).pair(&slot, target))?;
            match outcome {
                PairOutcome::Linked { slot_id } => {
                    println!("✓ Paired {} with existing {}", slot, slot_id)
                }
                PairOutcome::Created { slot_id } => {
                    println!("✓ Paired {} with new {}", slot, slot_id)
                }
            }
        }

        TemplateAction::Unpair { slot } => {
            let (_, partner) = Template::update(&path, |t| PairingResolver::new(t).unpair(&slot))?;
            match partner {
                Some(partner) => println!("✓ Unpaired {} from {}", slot, partner),
                None => println!("{} was not paired", slot),
            }
        }

        TemplateAction::Show => {
            let template = Template::load(&path)?;
            println!("Template: {}", template.name);
            if template.slots.is_empty() {
                println!("  (no slots)");
            }
            for slot in &template.slots {
                let paired = template
                    .pairings
                    .partner(&slot.id)
                    .map(|p| format!("  <-> {}", p))
                    .unwrap_or_default();
                println!(
                    "  {:<8} {:<20} {:<10} {}x  rest {}s{}",
                    slot.id, slot.exercise.id, slot.method.as_str(), slot.sets, slot.rest_seconds, paired
                );
            }
        }
    }

    Ok(())
}
