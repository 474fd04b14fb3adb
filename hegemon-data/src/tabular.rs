//! Semicolon-delimited tabular sources: the province definition table and
//! the special adjacency table.
//!
//! Both files are WINDOWS-1252 encoded in the wild, so bytes are decoded
//! before the CSV reader sees them. Rows that fail to parse are logged and
//! skipped; the core's own loaders catch dangling references.

use anyhow::{Context, Result};
use hegemon_core::map::{AdjacencyRecord, ProvinceRecord};
use hegemon_core::Colour;
use std::path::Path;

fn csv_reader(content: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .delimiter(b';')
        .comment(Some(b'#'))
        .flexible(true)
        .has_headers(false)
        .from_reader(content.as_bytes())
}

/// Parse one colour channel; tolerates the stray trailing `.` some tables
/// carry on numeric fields.
fn parse_channel(field: &str) -> Option<u8> {
    field.trim().trim_end_matches('.').parse().ok()
}

/// Parse the province definition table (`province;red;green;blue`).
pub fn parse_definition_records(bytes: &[u8]) -> Vec<ProvinceRecord> {
    let (content, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    let mut records = Vec::new();

    for (row, result) in csv_reader(&content).records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(error) => {
                log::error!("bad province definition row {}: {}", row + 1, error);
                continue;
            }
        };
        let identifier = record.get(0).unwrap_or("").trim();
        if identifier.is_empty() {
            continue;
        }
        if row == 0 && identifier.eq_ignore_ascii_case("province") {
            // Header row; validate its shape and move on.
            let expected = ["province", "red", "green", "blue"];
            let matches = expected.iter().enumerate().all(|(column, &name)| {
                record
                    .get(column)
                    .is_some_and(|value| value.trim().eq_ignore_ascii_case(name))
            });
            if !matches {
                log::warn!("non-standard province definition header: {:?}", record);
            }
            continue;
        }
        let channels = (
            record.get(1).and_then(parse_channel),
            record.get(2).and_then(parse_channel),
            record.get(3).and_then(parse_channel),
        );
        let (Some(r), Some(g), Some(b)) = channels else {
            log::error!("error reading colour in province definition row {}", row + 1);
            continue;
        };
        records.push(ProvinceRecord {
            identifier: identifier.to_owned(),
            colour: Colour::new(r, g, b),
        });
    }

    records
}

/// Load and parse the province definition table from a file.
pub fn load_definition_csv(path: &Path) -> Result<Vec<ProvinceRecord>> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read province definitions from {}", path.display()))?;
    let records = parse_definition_records(&bytes);
    log::info!("loaded {} province definitions from {}", records.len(), path.display());
    Ok(records)
}

/// Parse the adjacency table (`From;To;Type;Through;Data`). `-1` or empty
/// `Through` means none; rows with a `-1` endpoint are terminators.
pub fn parse_adjacency_records(bytes: &[u8]) -> Vec<AdjacencyRecord> {
    let (content, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    let mut records = Vec::new();

    for (row, result) in csv_reader(&content).records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(error) => {
                log::error!("bad adjacency row {}: {}", row + 1, error);
                continue;
            }
        };
        let from = record.get(0).unwrap_or("").trim();
        if from.is_empty() || from == "-1" {
            continue;
        }
        if row == 0 && from.eq_ignore_ascii_case("from") {
            continue;
        }
        let to = record.get(1).unwrap_or("").trim();
        if to.is_empty() || to == "-1" {
            continue;
        }
        let kind = record.get(2).unwrap_or("").trim().to_ascii_lowercase();
        let through = record.get(3).map(str::trim).filter(|value| {
            !value.is_empty() && *value != "-1"
        });
        let data = match record.get(4).map(str::trim) {
            None | Some("") => 0,
            Some(field) => match field.parse() {
                Ok(data) => data,
                Err(_) => {
                    log::error!("invalid adjacency data {:?} in row {}", field, row + 1);
                    continue;
                }
            },
        };
        records.push(AdjacencyRecord {
            from: from.to_owned(),
            to: to.to_owned(),
            kind,
            through: through.map(str::to_owned),
            data,
        });
    }

    records
}

/// Load and parse the adjacency table from a file.
pub fn load_adjacencies_csv(path: &Path) -> Result<Vec<AdjacencyRecord>> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read adjacencies from {}", path.display()))?;
    let records = parse_adjacency_records(&bytes);
    log::info!("loaded {} adjacency entries from {}", records.len(), path.display());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn definition_rows_parse_with_header() {
        let bytes = b"province;red;green;blue\nfarmland_1;255;0;0\nfarmland_2;0;255.;0\n";
        let records = parse_definition_records(bytes);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].identifier, "farmland_1");
        assert_eq!(records[0].colour, Colour::new(255, 0, 0));
        // A trailing dot on a channel value still parses.
        assert_eq!(records[1].colour, Colour::new(0, 255, 0));
    }

    #[test]
    fn bad_colour_rows_are_skipped() {
        let bytes = b"province;red;green;blue\ngood;1;2;3\nbad;256;0;0\n";
        let records = parse_definition_records(bytes);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].identifier, "good");
    }

    #[test]
    fn windows_1252_identifiers_survive() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("definition.csv");
        // 0xE5 is 'å' in WINDOWS-1252.
        let bytes = b"province;red;green;blue\nsk\xE5ne;0;36;128\n";
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(bytes).unwrap();

        let records = load_definition_csv(&path).unwrap();
        assert_eq!(records[0].identifier, "sk\u{e5}ne");
        assert_eq!(records[0].colour, Colour::new(0, 36, 128));
    }

    #[test]
    fn adjacency_rows_parse() {
        let bytes = b"From;To;Type;Through;Data\nalpha;beta;sea;gamma;0\ndelta;epsilon;canal;zeta;2\n-1;-1;;;\n";
        let records = parse_adjacency_records(bytes);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].from, "alpha");
        assert_eq!(records[0].kind, "sea");
        assert_eq!(records[0].through.as_deref(), Some("gamma"));
        assert_eq!(records[1].kind, "canal");
        assert_eq!(records[1].data, 2);
    }

    #[test]
    fn missing_through_becomes_none() {
        let bytes = b"From;To;Type;Through;Data\nalpha;beta;land;-1;0\n";
        let records = parse_adjacency_records(bytes);
        assert_eq!(records[0].through, None);
    }
}
