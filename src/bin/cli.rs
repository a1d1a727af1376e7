//! wess CLI: plays the built-in demo module through the software SPU.
//!
//! Usage:
//!   cargo run --bin wess-cli -- [--seq N] [--ticks N] [--realtime] [--config wess.toml]
//!
//! Set `RUST_LOG=wess=debug` to see engine events.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use std::{env, process};
use wess_master::demo::{demo_module, upload_demo_samples, DEMO_MARK, DEMO_MUSIC};
use wess_master::{EngineConfig, Sequencer, SoftSpu};

#[cfg(feature = "alloc_check")]
#[global_allocator]
static A: assert_no_alloc::AllocDisabler = assert_no_alloc::AllocDisabler;

struct Args {
    seq: usize,
    ticks: u64,
    realtime: bool,
    config: Option<String>,
}

fn parse_args() -> Args {
    let args: Vec<String> = env::args().skip(1).collect();
    let value = |flag: &str| {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .cloned()
    };
    let number = |flag: &str, default: u64| match value(flag) {
        Some(v) => v.parse().unwrap_or_else(|_| {
            eprintln!("{flag} expects a number, got {v}");
            process::exit(1);
        }),
        None => default,
    };

    Args {
        seq: number("--seq", DEMO_MUSIC as u64) as usize,
        ticks: number("--ticks", 120 * 10),
        realtime: args.iter().any(|a| a == "--realtime"),
        config: value("--config"),
    }
}

fn main() {
    env_logger::init();
    let args = parse_args();

    let config = match &args.config {
        Some(path) => EngineConfig::load(path).unwrap_or_else(|e| {
            eprintln!("Failed to load {path}: {e}");
            process::exit(1);
        }),
        None => EngineConfig::default(),
    };

    let mut seq = Sequencer::with_config(demo_module(), SoftSpu::new(), &config)
        .unwrap_or_else(|e| {
            eprintln!("Failed to start engine: {e}");
            process::exit(1);
        });

    // counted rather than logged; the callback runs inside the tick
    let marks = Arc::new(AtomicU32::new(0));
    {
        let mut engine = seq.lock();
        upload_demo_samples(&mut engine);
        let seen = marks.clone();
        let registered = engine.register_callback(DEMO_MARK, move |_, _| {
            seen.fetch_add(1, Ordering::Relaxed);
        });
        if let Err(e) = registered {
            log::warn!(target: "wess::cli", "{e}");
        }
    }

    if let Err(e) = seq.trigger(args.seq) {
        eprintln!("Failed to trigger sequence {}: {e}", args.seq);
        process::exit(1);
    }
    println!("Sequence {} playing ({} ticks)", args.seq, args.ticks);

    if args.realtime {
        seq.start();
        while seq.ticks() < args.ticks && seq.active_tracks() > 0 {
            report(&seq);
            std::thread::sleep(Duration::from_millis(250));
        }
        seq.stop_timer();
    } else {
        for n in 0..args.ticks {
            seq.tick();
            if n % 120 == 0 {
                report(&seq);
            }
            if seq.active_tracks() == 0 {
                break;
            }
        }
    }

    let engine = seq.lock();
    println!(
        "Done after {} ticks ({} ms): {} key-ons, {} key-offs, {} loop marks",
        engine.ticks(),
        engine.now_ms(),
        engine.spu().key_on_count(),
        engine.spu().key_off_count(),
        marks.load(Ordering::Relaxed)
    );
}

fn report(seq: &Sequencer<SoftSpu>) {
    let engine = seq.lock();
    println!(
        "tick {:>6} | voices {:>2} | tracks {:>2} | sequences {}",
        engine.ticks(),
        engine.active_voices(),
        engine.active_tracks(),
        engine.active_sequences()
    );
}
