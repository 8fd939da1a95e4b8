use super::tracker::ProgressTracker;

/// Render the end-of-run report: a progress header, then every step in
/// catalog order with its status icon and any strategy or error line.
///
/// ```text
/// Progress: 1/3 steps (33%)
/// ✅ Step 1: Open the registration form
///    Strategy: text:Nuevo trámite
/// ❌ Step 2: Select the company
///    Error: Resolution failed for target 'click': all 2 strategies failed
/// ⏳ Step 3: Submit
/// ```
pub fn format_summary(tracker: &ProgressTracker) -> String {
    let progress = tracker.progress();
    let mut output = format!(
        "Progress: {}/{} steps ({}%)\n",
        progress.completed, progress.total, progress.percentage
    );

    for record in tracker.records() {
        output.push_str(&format!(
            "{} Step {}: {}",
            record.status.icon(),
            record.number,
            record.label()
        ));
        if let Some(elapsed) = record.elapsed() {
            output.push_str(&format!(" ({:.1}s)", elapsed.as_secs_f64()));
        }
        output.push('\n');

        if let Some(strategy) = &record.strategy {
            output.push_str(&format!("   Strategy: {}\n", strategy));
        }
        if let Some(error) = &record.error {
            output.push_str(&format!("   Error: {}\n", error));
        }
    }

    output
}

impl ProgressTracker {
    pub fn summary(&self) -> String {
        format_summary(self)
    }
}
