use iplogtally::cli::Args;
use iplogtally::core::run;
use iplogtally::logging::init_logging;

fn main() -> std::process::ExitCode {
    let args = Args::parse();
    let settings = args.into_settings();
    init_logging(settings.verbosity);

    match run(&settings) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("iplogtally: {e}");
            std::process::ExitCode::from(2)
        }
    }
}
