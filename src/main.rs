#[macro_use]
extern crate rust_i18n;

i18n!("locales");

use ws_stats::cli;
use ws_stats::error::StatsError;
use ws_stats::init_locale;

fn main() {
    init_locale();

    if let Err(e) = cli::run() {
        let message = e
            .downcast_ref::<StatsError>()
            .map(StatsError::display_localized)
            .unwrap_or_else(|| e.to_string());
        eprintln!("{}", t!("messages.error", error = message));
        std::process::exit(1);
    }
}
