use serde_derive::Deserialize;
use serde_derive::Serialize;

/// Which part of an analysis narrative a line is being filed under.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Section {
    Summary,
    Optimizations,
    Warnings,
    Recommendations,
}

impl Section {
    /// Returns the section a line switches to, if it names one. Checks run in
    /// priority order so "optimize" beats "warning" beats "recommend".
    pub fn detect(line: &str) -> Option<Section> {
        let lower = line.to_lowercase();

        if lower.contains("optimization") || lower.contains("optimize") {
            return Some(Section::Optimizations);
        }
        if lower.contains("warning") || lower.contains("caution") {
            return Some(Section::Warnings);
        }
        if lower.contains("recommend") || lower.contains("suggest") {
            return Some(Section::Recommendations);
        }

        return None;
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSections {
    pub summary: String,
    pub optimizations: Vec<String>,
    pub warnings: Vec<String>,
    pub recommendations: Vec<String>,
}

impl AnalysisSections {
    pub fn is_structured(&self) -> bool {
        return !self.optimizations.is_empty()
            || !self.warnings.is_empty()
            || !self.recommendations.is_empty();
    }

    pub fn list_mut(&mut self, section: Section) -> Option<&mut Vec<String>> {
        match section {
            Section::Summary => return None,
            Section::Optimizations => return Some(&mut self.optimizations),
            Section::Warnings => return Some(&mut self.warnings),
            Section::Recommendations => return Some(&mut self.recommendations),
        }
    }
}
