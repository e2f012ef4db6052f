//! Text summary of a tissue patch.

use gut_core::Census;
use gut_world::GridSnapshot;
use std::fmt::Write;

/// Subpopulation breakdown followed by the patch rows
pub fn render_patch(census: &Census, snapshot: &GridSnapshot) -> String {
    let mut out = String::from("Subpop breakdown:\n|");
    for (label, count) in census.iter() {
        let _ = write!(out, " {}: {} |", label, count);
    }
    out.push_str("\n\nTissue patch:\n");

    for row in &snapshot.rows {
        let cells: Vec<String> = row.iter().map(|label| label.to_string()).collect();
        let _ = writeln!(out, "[{}]", cells.join(", "));
    }

    out
}

/// Occupied-cell counts for the last `tail` steps of a run
pub fn render_timeline(timeline: &[Census], tail: usize) -> String {
    let start = timeline.len().saturating_sub(tail);
    let mut out = String::new();

    for (step, census) in timeline.iter().enumerate().skip(start) {
        let counts: Vec<String> = census.iter().map(|(_, count)| count.to_string()).collect();
        let _ = writeln!(out, "step {:>5}: {}", step, counts.join(" "));
    }

    out
}
