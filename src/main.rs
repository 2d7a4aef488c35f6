//! Anno Reader CLI - reads one screenshot and prints every statistic
//!
//! Usage: `anno-reader <screenshot> [language]`
//!
//! Settings are read from the JSON file named by `ANNO_READER_SETTINGS`,
//! defaults are used otherwise. Set `RUST_LOG=debug` for per-match output.

use std::path::PathBuf;
use std::process::ExitCode;

use anno_reader::{load_catalog, load_settings, open_reader, KeywordDictionary, Screenshot, Statistics};

fn print_statistics(title: &str, statistics: &Statistics, dictionary: &KeywordDictionary) {
    println!("{}:", title);
    if statistics.is_empty() {
        println!("  (none)");
    }
    for (guid, value) in statistics {
        let name = dictionary.name_of(*guid).unwrap_or("?");
        println!("  {:>8}  {:<32} {}", guid, name, value);
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let Some(screenshot_path) = args.next() else {
        eprintln!("Usage: anno-reader <screenshot> [language]");
        return ExitCode::from(2);
    };

    let settings_path = std::env::var_os("ANNO_READER_SETTINGS").map(PathBuf::from);
    let settings = match load_settings(settings_path.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to load settings: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let language = args.next().unwrap_or_else(|| settings.default_language.clone());

    let catalog = match load_catalog(&settings.data_dir) {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("Failed to load catalog from {}: {}", settings.data_dir.display(), e);
            return ExitCode::FAILURE;
        }
    };
    let screenshot = match Screenshot::open(&screenshot_path) {
        Ok(screenshot) => screenshot,
        Err(e) => {
            eprintln!("Failed to open {}: {}", screenshot_path, e);
            return ExitCode::FAILURE;
        }
    };

    let mut reader = open_reader(&catalog, &settings);
    let state = reader.update(&language, &screenshot);
    let dictionary = reader.session().dictionary();

    println!("Screen: {:?}", state);
    println!("Language: {}", reader.session().language());
    println!("Island: {}", reader.selected_island());
    println!();
    print_statistics("Population", &reader.population_amount(), dictionary);
    print_statistics("Productivity", &reader.average_productivities(), dictionary);
    print_statistics("Buildings", &reader.existing_buildings(), dictionary);

    ExitCode::SUCCESS
}
