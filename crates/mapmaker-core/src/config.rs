// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Run configuration, loaded from JSON with named presets.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{MapmakerError, Result};
use crate::types::{BorderSpec, OutputMode, OverlapSpec, PageRange, PaperSize};

/// Settings for one extraction or tiling run.
///
/// Every field has a default, so a config file only needs the keys it wants
/// to change. An empty JSON object is a valid configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Paper used in tiled mode, as written (`"A4"`, `"a3"`). Resolved by
    /// [`MapConfig::paper_size`], so an unknown token only matters when
    /// tiling.
    pub paper: String,
    /// Per-page margins (portrait orientation), mm.
    pub border: BorderSpec,
    /// Interior overlap between adjacent pages, mm.
    pub overlap: OverlapSpec,
    /// Tiled or single-page output.
    pub mode: OutputMode,
    /// Filters applied to images pulled out of a source document.
    pub extraction: ExtractionFilter,
    /// Source pages to scan during extraction.
    pub pages: PageRange,
    /// Named overrides, applied with [`MapConfig::with_preset`].
    pub presets: BTreeMap<String, Preset>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            paper: PaperSize::A4.name().to_string(),
            border: BorderSpec::default(),
            overlap: OverlapSpec::default(),
            mode: OutputMode::Tiled,
            extraction: ExtractionFilter::default(),
            pages: PageRange::all(),
            presets: BTreeMap::new(),
        }
    }
}

/// Minimum-size filters for extracted images. Images at exactly the
/// threshold pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionFilter {
    pub min_width: u32,
    pub min_height: u32,
    /// Minimum length of the embedded (still encoded) image stream.
    pub min_bytes: usize,
}

impl Default for ExtractionFilter {
    fn default() -> Self {
        Self {
            min_width: 100,
            min_height: 100,
            min_bytes: 0,
        }
    }
}

impl ExtractionFilter {
    /// Whether an image of the given size, decoded from `encoded_len` bytes,
    /// is large enough to keep.
    pub fn accepts(&self, width: u32, height: u32, encoded_len: usize) -> bool {
        width >= self.min_width && height >= self.min_height && encoded_len >= self.min_bytes
    }
}

/// A named bundle of overrides. Unset fields leave the base value alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preset {
    pub paper: Option<String>,
    pub border: Option<BorderSpec>,
    pub overlap: Option<OverlapSpec>,
    pub mode: Option<OutputMode>,
}

impl MapConfig {
    /// Parse a configuration from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        debug!(
            paper = %config.paper,
            mode = ?config.mode,
            presets = config.presets.len(),
            "Configuration parsed"
        );
        Ok(config)
    }

    /// Load a configuration file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// The configured paper, parsed.
    pub fn paper_size(&self) -> Result<PaperSize> {
        self.paper.parse()
    }

    /// Return a copy of this configuration with the named preset applied.
    pub fn with_preset(&self, name: &str) -> Result<Self> {
        let preset = self
            .presets
            .get(name)
            .ok_or_else(|| MapmakerError::UnknownPreset(name.to_string()))?;

        info!(preset = name, "Applying preset");

        let mut config = self.clone();
        if let Some(paper) = &preset.paper {
            config.paper = paper.clone();
        }
        if let Some(border) = preset.border {
            config.border = border;
        }
        if let Some(overlap) = preset.overlap {
            config.overlap = overlap;
        }
        if let Some(mode) = preset.mode {
            config.mode = mode;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_all_defaults() {
        let config = MapConfig::from_json_str("{}").unwrap();
        assert_eq!(config.paper_size().unwrap(), PaperSize::A4);
        assert_eq!(config.border, BorderSpec::uniform(5.0));
        assert_eq!(config.overlap, OverlapSpec::uniform(3.0));
        assert_eq!(config.mode, OutputMode::Tiled);
        assert_eq!(config.extraction.min_width, 100);
        assert_eq!(config.extraction.min_height, 100);
        assert_eq!(config.pages, PageRange::all());
    }

    #[test]
    fn partial_config_overrides_only_given_keys() {
        let config = MapConfig::from_json_str(
            r#"{ "paper": "a3", "mode": "single", "extraction": { "min_width": 300 } }"#,
        )
        .unwrap();
        assert_eq!(config.paper_size().unwrap(), PaperSize::A3);
        assert_eq!(config.mode, OutputMode::Single);
        assert_eq!(config.extraction.min_width, 300);
        assert_eq!(config.extraction.min_height, 100);
    }

    #[test]
    fn unknown_paper_is_reported_when_resolved() {
        // Loading succeeds; only a tiled run asks for the paper.
        let config = MapConfig::from_json_str(r#"{ "paper": "Letter", "mode": "single" }"#).unwrap();
        assert_eq!(config.mode, OutputMode::Single);

        let err = config.paper_size().unwrap_err();
        assert!(matches!(err, MapmakerError::UnknownPaperSize(ref t) if t == "Letter"));
    }

    #[test]
    fn preset_overrides_base() {
        let config = MapConfig::from_json_str(
            r#"{
                "presets": {
                    "printshop": {
                        "paper": "A0",
                        "overlap": { "east": 10.0, "south": 10.0 },
                        "mode": "single"
                    }
                }
            }"#,
        )
        .unwrap();

        let applied = config.with_preset("printshop").unwrap();
        assert_eq!(applied.paper_size().unwrap(), PaperSize::A0);
        assert_eq!(applied.overlap, OverlapSpec::uniform(10.0));
        assert_eq!(applied.mode, OutputMode::Single);
        // Untouched by the preset.
        assert_eq!(applied.border, BorderSpec::uniform(5.0));
    }

    #[test]
    fn unknown_preset_is_an_error() {
        let err = MapConfig::default().with_preset("nope").unwrap_err();
        assert!(matches!(err, MapmakerError::UnknownPreset(ref name) if name == "nope"));
    }

    #[test]
    fn filter_threshold_is_inclusive() {
        let filter = ExtractionFilter {
            min_width: 100,
            min_height: 50,
            min_bytes: 10,
        };
        assert!(filter.accepts(100, 50, 10));
        assert!(!filter.accepts(99, 50, 10));
        assert!(!filter.accepts(100, 49, 10));
        assert!(!filter.accepts(100, 50, 9));
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mapmaker.json");
        std::fs::write(&path, r#"{ "border": { "north": 1, "east": 2, "south": 3, "west": 4 } }"#)
            .unwrap();

        let config = MapConfig::load(&path).unwrap();
        assert_eq!(config.border.east, 2.0);
        assert_eq!(config.border.west, 4.0);
    }
}
