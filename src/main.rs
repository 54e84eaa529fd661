use dotenv::dotenv;
use pi_digits::{app, config::Settings, logging};

fn main() {
    dotenv().ok();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("🛑 Invalid settings: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = logging::init(&settings.log_path) {
        eprintln!("🛑 Could not open log file {}: {}", settings.log_path.display(), e);
        std::process::exit(1);
    }

    if let Err(e) = app::run(&settings) {
        eprintln!("🛑 Pi computation failed: {}", e);
        std::process::exit(1);
    }
}
