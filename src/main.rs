//! Headless driver: list tablet endpoints, or draw and log strokes until the tablet goes away.
//!
//! Set `RUST_LOG=debug` to watch endpoint selection.

use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use xpboard::{tool::DrawGate, Builder, Whiteboard};

const USAGE: &str = "\
usage: xpboard list
       xpboard run [--gate contact|contact-and-primary] [--any-product]";

struct RunOptions {
    gate: DrawGate,
    any_product: bool,
}

fn parse_run(mut args: impl Iterator<Item = String>) -> Result<RunOptions, String> {
    let mut options = RunOptions {
        gate: DrawGate::default(),
        any_product: false,
    };
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--gate" => {
                let value = args.next().ok_or("--gate needs a value")?;
                options.gate = value
                    .parse()
                    .map_err(|err| format!("bad gate {value:?}: {err}"))?;
            }
            "--any-product" => options.any_product = true,
            other => return Err(format!("unexpected argument {other:?}")),
        }
    }
    Ok(options)
}

#[cfg(hid_backend)]
fn open_board(builder: Builder) -> Option<Whiteboard> {
    builder
        .build_hid()
        .map_err(|err| log::error!("failed to initialize HID: {err}"))
        .ok()
}
#[cfg(not(hid_backend))]
fn open_board(_builder: Builder) -> Option<Whiteboard> {
    log::error!("built without HID support, rebuild with `--features hidapi-backend`");
    None
}

fn list() -> ExitCode {
    let Some(mut board) = open_board(Builder::new()) else {
        return ExitCode::FAILURE;
    };
    match board.list_devices() {
        Ok(devices) if devices.is_empty() => println!("no XP-Pen devices found"),
        Ok(devices) => {
            for device in devices {
                let marker = if device.is_digitizer() { '*' } else { ' ' };
                println!("{marker} {device}");
            }
        }
        Err(err) => {
            log::error!("{err}");
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}

fn run(options: &RunOptions) -> ExitCode {
    let dirty = Arc::new(AtomicBool::new(false));
    let builder = Builder::new()
        .gate(options.gate)
        .any_product(options.any_product)
        .sink({
            let dirty = dirty.clone();
            move || dirty.store(true, Ordering::Release)
        });
    let Some(mut board) = open_board(builder) else {
        return ExitCode::FAILURE;
    };

    match board.connect() {
        Ok(descriptor) => println!("drawing with {descriptor}"),
        Err(err) => {
            // The canvas works without a tablet, there's just nothing to feed it here.
            log::warn!("tablet unavailable: {err}");
            return ExitCode::SUCCESS;
        }
    }
    if let Err(err) = board.start_input() {
        log::error!("{err}");
        return ExitCode::FAILURE;
    }

    let mut committed = 0;
    loop {
        std::thread::sleep(Duration::from_millis(100));
        if dirty.swap(false, Ordering::AcqRel) {
            let snapshot = board.snapshot();
            let completed: Vec<_> = snapshot.iter().filter(|s| s.is_completed()).collect();
            if completed.len() > committed {
                if let Some(last) = completed.last() {
                    log::info!("stroke #{} with {} point(s)", completed.len(), last.len());
                }
            }
            committed = completed.len();
        }
        if let Some(fatal) = board.take_fatal() {
            log::error!("{fatal}");
            break;
        }
    }
    println!("{committed} stroke(s) drawn");
    ExitCode::FAILURE
}

fn main() -> ExitCode {
    env_logger::init();
    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        Some("list") => list(),
        Some("run") => match parse_run(args) {
            Ok(options) => run(&options),
            Err(err) => {
                eprintln!("{err}\n{USAGE}");
                ExitCode::FAILURE
            }
        },
        _ => {
            eprintln!("{USAGE}");
            ExitCode::FAILURE
        }
    }
}
