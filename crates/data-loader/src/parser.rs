//! Parser for the JSON dataset files.
//!
//! A dataset directory holds four files:
//! - ads.json: `[Ad]`
//! - playback.json: `[InteractionRecord]`
//! - ad_clicks.json: `[AdClickRecord]`
//! - category_mappings.json: `{ movie_category: { ad_category: weight } }`
//!
//! Each parser reads the whole file and decodes it with serde_json.
//! Blank fields are rejected here so the index never holds them.

use crate::error::{DataLoadError, Result};
use crate::types::*;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Read a JSON file and decode it into `T`
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => DataLoadError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => DataLoadError::IoError(e),
    })?;

    serde_json::from_str(&content).map_err(|source| DataLoadError::ParseError {
        file: file_name(path),
        source,
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn require_non_blank(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DataLoadError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Parse the ads.json file
pub fn parse_ads(path: &Path) -> Result<Vec<Ad>> {
    let ads: Vec<Ad> = read_json(path)?;
    for ad in &ads {
        require_non_blank("ad_id", &ad.ad_id)?;
        require_non_blank("category", &ad.category)?;
    }
    Ok(ads)
}

/// Parse the playback.json file
pub fn parse_playback(path: &Path) -> Result<Vec<InteractionRecord>> {
    let records: Vec<InteractionRecord> = read_json(path)?;
    for record in &records {
        require_non_blank("user_id", &record.user_id)?;
    }
    Ok(records)
}

/// Parse the ad_clicks.json file
pub fn parse_clicks(path: &Path) -> Result<Vec<AdClickRecord>> {
    let records: Vec<AdClickRecord> = read_json(path)?;
    for record in &records {
        require_non_blank("user_id", &record.user_id)?;
        require_non_blank("ad_id", &record.ad_id)?;
    }
    Ok(records)
}

/// Parse the category_mappings.json file
///
/// Weights must be finite and non-negative.
pub fn parse_category_mappings(path: &Path) -> Result<Vec<CategoryMapping>> {
    let raw: HashMap<String, HashMap<String, f32>> = read_json(path)?;

    let mut mappings = Vec::with_capacity(raw.len());
    for (movie_category, ad_categories) in raw {
        require_non_blank("movie_category", &movie_category)?;
        for (ad_category, weight) in &ad_categories {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(DataLoadError::InvalidValue {
                    field: format!("weight[{movie_category} -> {ad_category}]"),
                    value: weight.to_string(),
                });
            }
        }
        mappings.push(CategoryMapping {
            movie_category,
            ad_categories,
        });
    }
    Ok(mappings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_parse_ads() {
        let file = write_temp(
            r#"[
                {"ad_id": "ad1", "category": "Tech", "description": "Latest gadgets",
                 "keywords": ["tech", "gadgets"], "target_audience": ["developers"]},
                {"ad_id": "ad2", "category": "Travel", "description": "Beach holidays"}
            ]"#,
        );

        let ads = parse_ads(file.path()).unwrap();
        assert_eq!(ads.len(), 2);
        assert_eq!(ads[0].ad_id, "ad1");
        assert!(ads[0].keywords.contains("gadgets"));
        assert!(ads[1].keywords.is_empty());
        assert!(ads[1].created_at.is_none());
    }

    #[test]
    fn test_parse_ads_rejects_blank_id() {
        let file = write_temp(r#"[{"ad_id": " ", "category": "Tech", "description": "x"}]"#);
        let result = parse_ads(file.path());
        assert!(matches!(result, Err(DataLoadError::InvalidValue { .. })));
    }

    #[test]
    fn test_parse_playback() {
        let file = write_temp(
            r#"[{"user_id": "u1", "category": "Action", "timestamp": "2024-01-02T10:00:00Z"}]"#,
        );
        let records = parse_playback(file.path()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].category, "Action");
    }

    #[test]
    fn test_parse_category_mappings_rejects_negative_weight() {
        let file = write_temp(r#"{"Action": {"Sports": -0.5}}"#);
        let result = parse_category_mappings(file.path());
        assert!(matches!(result, Err(DataLoadError::InvalidValue { .. })));
    }

    #[test]
    fn test_parse_malformed_json() {
        let file = write_temp("not json");
        let result = parse_clicks(file.path());
        assert!(matches!(result, Err(DataLoadError::ParseError { .. })));
    }

    #[test]
    fn test_missing_file() {
        let result = parse_ads(Path::new("/definitely/not/here/ads.json"));
        assert!(matches!(result, Err(DataLoadError::FileNotFound { .. })));
    }
}
