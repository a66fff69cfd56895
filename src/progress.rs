//! Harvest progress reporting.
//!
//! Reports observable progress during `swh harvest` so users see which
//! source is being probed, how many offerings are left and when the
//! catalog was updated. Progress goes to **stderr** so stdout stays
//! parseable for scripts.

use std::io::Write;

/// A single progress event of a harvest pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HarvestProgressEvent {
    /// Capabilities are being fetched and a connector chosen.
    Discovering { source: String },
    /// Offering `n` of `total` is being walked.
    Harvesting {
        source: String,
        offering: String,
        n: u64,
        total: u64,
    },
    /// The catalog now describes the source.
    Synchronized { source: String, datasets: u64 },
}

/// Reports harvest progress. Implementations write to stderr (human or JSON).
pub trait HarvestProgressReporter: Send + Sync {
    fn report(&self, event: HarvestProgressEvent);
}

/// Human-friendly progress on stderr: "harvest hydro  offering O1  2 / 5".
pub struct StderrProgress;

impl HarvestProgressReporter for StderrProgress {
    fn report(&self, event: HarvestProgressEvent) {
        let line = match &event {
            HarvestProgressEvent::Discovering { source } => {
                format!("harvest {}  discovering...\n", source)
            }
            HarvestProgressEvent::Harvesting {
                source,
                offering,
                n,
                total,
            } => format!(
                "harvest {}  offering {}  {} / {}\n",
                source,
                offering,
                format_number(*n),
                format_number(*total)
            ),
            HarvestProgressEvent::Synchronized { source, datasets } => format!(
                "harvest {}  synchronized  {} datasets\n",
                source,
                format_number(*datasets)
            ),
        };
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(line.as_bytes());
        let _ = stderr.flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl HarvestProgressReporter for JsonProgress {
    fn report(&self, event: HarvestProgressEvent) {
        let obj = match &event {
            HarvestProgressEvent::Discovering { source } => serde_json::json!({
                "event": "progress",
                "source": source,
                "phase": "discovering"
            }),
            HarvestProgressEvent::Harvesting {
                source,
                offering,
                n,
                total,
            } => serde_json::json!({
                "event": "progress",
                "source": source,
                "phase": "harvesting",
                "offering": offering,
                "n": n,
                "total": total
            }),
            HarvestProgressEvent::Synchronized { source, datasets } => serde_json::json!({
                "event": "progress",
                "source": source,
                "phase": "synchronized",
                "datasets": datasets
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(stderr, "{}", line);
            let _ = stderr.flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl HarvestProgressReporter for NoProgress {
    fn report(&self, _event: HarvestProgressEvent) {}
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    let chars: Vec<char> = s.chars().rev().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn HarvestProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_number_comma() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1_234_567), "1,234,567");
    }
}
