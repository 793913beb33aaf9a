use lc3_vm::config::Config;
use lc3_vm::console::StdConsole;
use lc3_vm::image;
use lc3_vm::vm::Vm;

use std::env;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

fn main() -> ExitCode {
    env_logger::init();

    let config = match Config::parse(env::args().skip(1)) {
        Ok(config) => config,
        Err(usage) => {
            eprintln!("{usage}");
            return ExitCode::from(2);
        }
    };

    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let interrupted = interrupted.clone();
        if let Err(err) = ctrlc::set_handler(move || {
            interrupted.store(true, Ordering::SeqCst);
        }) {
            log::warn!("failed to install interrupt handler: {err}");
        }
    }

    let mut vm = Vm::new(interrupted.clone());

    if let Err(err) = image::load_images(&mut vm, &config.image_paths) {
        eprintln!("{err}");
        return ExitCode::from(1);
    }

    let mut console = match StdConsole::acquire() {
        Ok(console) => console,
        Err(err) => {
            eprintln!("could not put terminal into raw mode: {err}");
            return ExitCode::from(1);
        }
    };

    vm.run(&mut console);
    drop(console);

    if vm.was_interrupted() {
        // -2 has no direct ExitCode representation; use its host equivalent,
        // the low byte of -2 as an exit status.
        ExitCode::from(254)
    } else {
        ExitCode::SUCCESS
    }
}
