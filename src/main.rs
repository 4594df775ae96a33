use clap::Parser;
use raspinel::{cli::Cli, run, RaspinelError};

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // RUST_LOG 优先
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(format!("raspinel={level}")),
    )
    .format_target(false)
    .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let code = match run(&cli) {
        Ok(code) => code,
        Err(e) => match e.downcast_ref::<RaspinelError>().and_then(RaspinelError::exit_code) {
            Some(code) => code,
            None => {
                eprintln!("Error: {e:#}");
                1
            }
        },
    };

    std::process::exit(code);
}
