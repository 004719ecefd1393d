//! Fine-tuning dataset rows built from sample commands.
//!
//! Each usable sample becomes one JSONL conversation: the persona prompt,
//! the sample as the user turn, and the resolved intent as the assistant
//! turn.

use std::io::Write;

use serde::Serialize;
use tracing::{info, warn};

use crate::intent::IntentResolver;
use crate::Result;

/// Header cell of a single-column CSV export, skipped when it is the first line.
const CSV_HEADER: &str = "Input";

#[derive(Serialize)]
struct Conversation<'a> {
    messages: [Message<'a>; 3],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

/// Rows written and samples skipped by [`write_dataset`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DatasetSummary {
    pub written: usize,
    pub skipped: usize,
}

/// Non-empty sample lines, minus a leading `Input` header.
pub fn samples(input: &str) -> impl Iterator<Item = &str> {
    input
        .lines()
        .map(str::trim)
        .enumerate()
        .filter(|&(i, line)| !(i == 0 && line == CSV_HEADER))
        .map(|(_, line)| line)
        .filter(|line| !line.is_empty())
}

/// Resolve every sample and write one conversation per line to `out`.
/// Samples the resolver fails on are logged and skipped.
///
/// # Errors
///
/// Returns error if a row cannot be serialized or written
pub async fn write_dataset<W: Write>(
    resolver: &dyn IntentResolver,
    system_prompt: &str,
    input: &str,
    out: &mut W,
) -> Result<DatasetSummary> {
    let mut summary = DatasetSummary::default();

    for (i, line) in samples(input).enumerate() {
        let intent = match resolver.resolve(line).await {
            Ok(intent) => intent,
            Err(e) => {
                warn!("Skipping sample {i} ({line:?}): {e}");
                summary.skipped += 1;
                continue;
            }
        };

        let assistant = serde_json::to_string(&intent)?;
        let row = Conversation {
            messages: [
                Message {
                    role: "system",
                    content: system_prompt,
                },
                Message {
                    role: "user",
                    content: line,
                },
                Message {
                    role: "assistant",
                    content: &assistant,
                },
            ],
        };
        serde_json::to_writer(&mut *out, &row)?;
        out.write_all(b"\n")?;
        summary.written += 1;
        info!("[{i}] {} ← {line:?}", intent.command);
    }

    out.flush()?;
    Ok(summary)
}
