use savings_core::{cli::run_cli, init};

fn main() {
    init();

    let memory = std::env::args().skip(1).any(|arg| arg == "--memory");
    if let Err(err) = run_cli(memory) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
