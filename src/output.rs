// src/output.rs
// =============================================================================
// Result emitter: writes the analyzed documents as one JSON array.
//
// Each analyzer renders its own JSON object, so the emitter only joins them:
// "[" + obj + "," + obj + ... + "]". Documents appear in the order the
// registry discovered them. A run with no successful analysis emits "[]".
// =============================================================================

use std::fs::File;
use std::io::{self, BufWriter, Write};
use tracing::info;
use url::Url;

use crate::analyzer::DocumentResults;
use crate::config::OutputSink;
use crate::error::OutputError;

// Writes every recorded result to the configured sink
//
// Parameters:
//   sink: stdout or a file path (the file is created or truncated)
//   urls: registry snapshot, which fixes the output order
//   results: analyzers that completed successfully
//
// Returns: how many objects were written
pub fn emit(sink: &OutputSink, urls: &[Url], results: &DocumentResults) -> Result<usize, OutputError> {
    let written = match sink {
        OutputSink::Stdout => {
            let stdout = io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            write_results(&mut writer, urls, results)?
        }
        OutputSink::File(path) => {
            let file = File::create(path).map_err(|source| OutputError::Create {
                path: path.display().to_string(),
                source,
            })?;
            let mut writer = BufWriter::new(file);
            write_results(&mut writer, urls, results)?
        }
    };

    info!(documents = written, "results written");
    Ok(written)
}

/// Writes the JSON array to any writer and flushes it.
pub fn write_results<W: Write>(
    writer: &mut W,
    urls: &[Url],
    results: &DocumentResults,
) -> Result<usize, OutputError> {
    let mut written = 0;

    writer.write_all(b"[")?;
    for url in urls {
        let Some(json) = results.to_json(url) else {
            continue;
        };
        let json = json?;
        if written > 0 {
            writer.write_all(b",")?;
        }
        writer.write_all(&json)?;
        written += 1;
    }
    writer.write_all(b"]")?;
    writer.flush()?;

    Ok(written)
}
