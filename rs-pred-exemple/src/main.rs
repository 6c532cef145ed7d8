use std::env;
use std::fs::File;
use std::io::{self, BufRead, BufWriter, Write};

use log::info;
use rs_pred_core::{ContentSource, EngineConfig, PredictionEngine};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Corpus and vocabulary paths, overridable from the command line
    let mut args = env::args().skip(1);
    let corpus = args.next().unwrap_or_else(|| "./data/corpus.txt".to_owned());
    let vocabulary = args.next().unwrap_or_else(|| "./data/vocab.txt".to_owned());

    // Strict mode so that malformed input is reported instead of silently ignored
    let mut config = EngineConfig::strict();

    // Reuse data/corpus.bin on the next run if the corpus did not change
    config.binary_cache = true;

    // Show at most 10 completions per keystroke
    config.completion_limit = Some(10);

    // Build the engine on a background thread, as a UI would
    let loading = PredictionEngine::spawn_initialize(
        ContentSource::file(&corpus),
        ContentSource::file(&vocabulary),
        config,
    );
    let mut engine = loading.join().map_err(|_| "engine loader panicked")??;
    info!("{:?}", engine.stats()?);

    println!("Type some text and press enter.");
    println!("End the line with a space to get next-word suggestions.");
    println!(":adjacency <path> and :table <path> dump the model, :quit exits.");

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;

        if let Some(path) = line.strip_prefix(":adjacency ") {
            let writer = BufWriter::new(File::create(path.trim())?);
            engine.successor_model()?.graph().write_adjacency(writer)?;
            println!("Adjacency list written to {}", path.trim());
            continue;
        }
        if let Some(path) = line.strip_prefix(":table ") {
            let writer = BufWriter::new(File::create(path.trim())?);
            engine.successor_model()?.write_table(writer)?;
            println!("Successor table written to {}", path.trim());
            continue;
        }
        if line.trim() == ":quit" {
            break;
        }

        // `lines()` strips the newline, so a trailing space is kept as typed
        match engine.predict(&line) {
            Ok(words) => println!("{words:?}"),
            Err(e) => println!("Error: {e}"),
        }
        io::stdout().flush()?;
    }

    engine.shutdown()?;
    Ok(())
}
