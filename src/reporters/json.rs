use crate::error::AnalysisError;
use crate::types::ResultBundle;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes the bundle as pretty-printed JSON. The key layout is the export
/// contract — absent stages are omitted entirely, never null-filled.
pub fn export_bundle(bundle: &ResultBundle, path: &Path) -> Result<(), AnalysisError> {
    let file = File::create(path).map_err(|e| AnalysisError::Export {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, bundle).map_err(|e| AnalysisError::Export {
        path: path.to_path_buf(),
        source: e.into(),
    })?;
    writer.write_all(b"\n").map_err(|e| AnalysisError::Export {
        path: path.to_path_buf(),
        source: e,
    })?;
    eprintln!("✓ JSON report written to {}", path.display());
    Ok(())
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ComplexityTier, CostEstimate};
    use std::fs;
    use tempfile::TempDir;

    fn make_bundle() -> ResultBundle {
        ResultBundle {
            project_name: "demo".to_string(),
            project_path: "/tmp/demo".to_string(),
            analysis_type: "integrated".to_string(),
            generated_at: "2024-01-01T00:00:00Z".to_string(),
            cocomo: CostEstimate {
                kloc: 10.0,
                effort_person_months: 26.92,
                duration_months: 8.72,
                headcount: 3.08,
                maintenance_headcount: 0.55,
                expansion_headcount: 0.92,
                productivity: 371.4,
                cost: 403_800.0,
                complexity: ComplexityTier::Low,
            },
            git: None,
            integrated: None,
            security: None,
            ai_insights: None,
        }
    }

    #[test]
    fn test_round_trip_preserves_cocomo_values() {
        let dir = TempDir::new().expect("tempdir should be created");
        let path = dir.path().join("report.json");
        let bundle = make_bundle();

        export_bundle(&bundle, &path).expect("export should succeed");

        let text = fs::read_to_string(&path).expect("file should be readable");
        let parsed: ResultBundle =
            serde_json::from_str(&text).expect("exported JSON should parse back");
        assert_eq!(
            parsed.cocomo, bundle.cocomo,
            "re-parsed cocomo section must be field-for-field identical"
        );
        assert_eq!(parsed.project_name, "demo");
    }

    #[test]
    fn test_absent_sections_are_omitted_not_null() {
        let dir = TempDir::new().expect("tempdir should be created");
        let path = dir.path().join("report.json");

        export_bundle(&make_bundle(), &path).expect("export should succeed");

        let text = fs::read_to_string(&path).expect("file should be readable");
        assert!(!text.contains("\"git\":"), "absent git must not appear");
        assert!(!text.contains("\"integrated\":"));
        assert!(!text.contains("\"security\":"));
        assert!(!text.contains("\"ai_insights\":"));
        assert!(!text.contains("null"), "no section may be null-filled");
        assert!(text.ends_with('\n'), "export must end with a newline");
    }

    #[test]
    fn test_unwritable_path_is_an_export_error() {
        let result = export_bundle(&make_bundle(), Path::new("/nonexistent/dir/report.json"));
        assert!(matches!(result, Err(AnalysisError::Export { .. })));
    }
}
