#[cfg(test)]
#[path = "narrative_test.rs"]
mod tests;

use crate::domain::models::AnalysisSections;
use crate::domain::models::Section;

const BULLET_GLYPHS: [char; 12] = ['•', '◦', '▪', '▫', '‣', '∙', '●', '○', '■', '□', '⁃', '–'];

/// Strips a leading "- " or "• "-style bullet. Only list glyphs count, so an
/// emoji or an accented word at the start of a line is left alone.
fn strip_bullet(line: &str) -> Option<&str> {
    if let Some(rest) = line.strip_prefix("- ") {
        return Some(rest);
    }

    let mut chars = line.chars();
    let first = chars.next()?;
    if BULLET_GLYPHS.contains(&first) && chars.next() == Some(' ') {
        return Some(&line[first.len_utf8() + 1..]);
    }

    return None;
}

/// Files an assistant narrative into summary, optimization, warning and
/// recommendation sections. Never fails: when nothing can be classified the
/// whole input comes back as the summary.
pub fn classify(narrative: &str) -> AnalysisSections {
    let (mut sections, summary_parts, _) = narrative
        .lines()
        .map(|line| return line.trim())
        .filter(|line| return !line.is_empty())
        .fold(
            (AnalysisSections::default(), Vec::<&str>::new(), Section::Summary),
            |(mut sections, mut summary_parts, cursor), line| {
                let cursor = Section::detect(line).unwrap_or(cursor);

                if let Some(item) = strip_bullet(line) {
                    // Bullets before any section heading have nowhere to go.
                    if let Some(list) = sections.list_mut(cursor) {
                        list.push(item.to_string());
                    }
                } else if cursor == Section::Summary {
                    summary_parts.push(line);
                }

                return (sections, summary_parts, cursor);
            },
        );

    if sections.is_structured() {
        sections.summary = summary_parts.join(" ");
    } else {
        sections.summary = narrative.to_string();
    }

    return sections;
}
