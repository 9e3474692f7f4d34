use std::env;
use std::fs;

use maquette::app;
use maquette::config::SessionOptions;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let options = match load_options() {
        Ok(options) => options,
        Err(err) => {
            log::error!("{err}");
            std::process::exit(2);
        }
    };

    log::info!("🚀 Maquette scene session");
    log::info!("   Commands on stdin, events on stdout; ESC or close window to exit");

    app::run(options);

    log::info!("👋 Goodbye!");
}

/// Options come from a JSON file named on the command line; with no
/// argument every option takes its default.
fn load_options() -> Result<SessionOptions, String> {
    let Some(path) = env::args().nth(1) else {
        return Ok(SessionOptions::default());
    };
    let text = fs::read_to_string(&path)
        .map_err(|err| format!("failed to read options file '{path}': {err}"))?;
    let options = serde_json::from_str(&text)
        .map_err(|err| format!("invalid options file '{path}': {err}"))?;
    log::info!("loaded options from {path}");
    Ok(options)
}
