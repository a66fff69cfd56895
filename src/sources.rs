use anyhow::Result;
use serde::Serialize;

use crate::config::Config;

/// Configuration status of one source, as shown by `swh sources`.
#[derive(Debug, Clone, Serialize)]
pub struct SourceStatus {
    pub name: String,
    pub url: String,
    /// Configured connector selector, or `auto`.
    pub connector: String,
    pub enabled: bool,
    pub snapshot: &'static str,
}

pub fn get_sources(config: &Config) -> Vec<SourceStatus> {
    config
        .sources
        .values()
        .map(|source| {
            let snapshot = match &source.snapshot {
                Some(path) if path.exists() => "OK",
                Some(_) => "MISSING",
                None => "NONE",
            };
            SourceStatus {
                name: source.item_name.clone(),
                url: source.url.clone(),
                connector: source
                    .connector
                    .clone()
                    .unwrap_or_else(|| "auto".to_string()),
                enabled: source.job.enabled,
                snapshot,
            }
        })
        .collect()
}

pub fn list_sources(config: &Config) -> Result<()> {
    let sources = get_sources(config);
    if sources.is_empty() {
        println!("No sources configured.");
        return Ok(());
    }

    println!(
        "{:<20} {:<14} {:<8} {:<9} URL",
        "SOURCE", "CONNECTOR", "ENABLED", "SNAPSHOT"
    );
    for s in sources {
        println!(
            "{:<20} {:<14} {:<8} {:<9} {}",
            s.name, s.connector, s.enabled, s.snapshot, s.url
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    #[test]
    fn test_status_of_sources() {
        let config = parse_config(
            r#"
[db]
path = "catalog.sqlite"

[server]
external_url = "https://example.org/api/"

[sources.hydro]
url = "https://example.org/sos"
connector = "sos2"
snapshot = "/nonexistent/hydro.json"

[sources.air]
url = "https://air.example.org/sos"
"#,
        )
        .unwrap();

        let sources = get_sources(&config);
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].name, "air");
        assert_eq!(sources[0].connector, "auto");
        assert_eq!(sources[0].snapshot, "NONE");
        assert_eq!(sources[1].connector, "sos2");
        assert_eq!(sources[1].snapshot, "MISSING");
    }
}
