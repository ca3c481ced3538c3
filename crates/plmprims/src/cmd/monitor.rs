use std::cell::Cell;
use std::fs::OpenOptions;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};

use plmprims_frame::{Address, FrameError, MessageReader, MessageWriter};
use plmprims_state::Thermostat;

use crate::cmd::MonitorArgs;
use crate::exit::{frame_error, io_error, state_error, CliError, CliResult, SUCCESS};
use crate::output::{print_frame, print_update, OutputFormat};

pub fn run(args: MonitorArgs, format: OutputFormat) -> CliResult<i32> {
    let address: Address = args
        .address
        .parse()
        .map_err(|err| CliError::usage(format!("{err}")))?;
    let file = OpenOptions::new()
        .read(true)
        .write(args.refresh)
        .open(&args.input)
        .map_err(|err| io_error("open failed", err))?;

    let (tx, rx) = mpsc::channel();
    let mut thermostat = Thermostat::th2441v(address, tx);

    let updates = Rc::new(Cell::new(0usize));
    let counter = Rc::clone(&updates);
    thermostat.subscribe_all(move |address, name, value| {
        print_update(&address.to_string(), name, &value.to_string(), format);
        counter.set(counter.get() + 1);
    });

    if args.refresh {
        thermostat
            .refresh()
            .map_err(|err| state_error("refresh failed", err))?;
        let out = file
            .try_clone()
            .map_err(|err| io_error("open failed", err))?;
        let mut writer = MessageWriter::new(out);
        for message in rx.try_iter() {
            writer
                .write_message(&message)
                .map_err(|err| frame_error("write failed", err))?;
        }
    }

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut reader = MessageReader::new(file);
    while running.load(Ordering::SeqCst) {
        let frame = match reader.read_frame() {
            Ok(frame) => frame,
            Err(FrameError::ConnectionClosed) => break,
            Err(err) => return Err(frame_error("read failed", err)),
        };

        if args.frames {
            print_frame(&frame, format);
        }
        match frame.message() {
            Ok(message) => {
                thermostat.receive(&message);
            }
            Err(err) => tracing::debug!(error = %err, "skipping modem frame"),
        }

        if let Some(count) = args.count {
            if updates.get() >= count {
                break;
            }
        }
    }

    tracing::info!(
        updates = updates.get(),
        skipped = reader.skipped_bytes(),
        "monitor finished"
    );
    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
