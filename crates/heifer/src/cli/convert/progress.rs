//! Progress bar observer and the end-of-batch summary.

use console::Style;
use heifer_core::pipeline::failure_line;
use heifer_core::{BatchSummary, ConversionResult, ProgressObserver, ProgressReport};
use indicatif::{ProgressBar, ProgressStyle};

/// Shows progress on an `indicatif` bar instead of log lines.
///
/// The length is set from the first report, since the file count is only
/// known once discovery has run inside the batch.
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new() -> anyhow::Result<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
                )?
                .progress_chars("##-"),
        );
        bar.set_message("starting...");
        Ok(Self { bar })
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressObserver for BarProgress {
    fn on_progress(&mut self, report: &ProgressReport) {
        self.bar.set_length(report.total as u64);
        self.bar.set_position(report.processed as u64);
        self.bar.set_message(report.file_name.clone());
    }

    fn on_failure(&mut self, result: &ConversionResult) {
        let red = Style::new().for_stderr().red();
        self.bar
            .println(red.apply_to(failure_line(result)).to_string());
    }
}

/// Print the summary table and the failed files to stderr.
pub fn print_summary(summary: &BatchSummary) {
    eprintln!();
    for line in render_summary(summary) {
        eprintln!("{line}");
    }
}

fn render_summary(summary: &BatchSummary) -> Vec<String> {
    let green = Style::new().for_stderr().green();
    let red = Style::new().for_stderr().red();
    let yellow = Style::new().for_stderr().yellow();
    let bold = Style::new().for_stderr().bold();
    let mb_written = summary.output_bytes as f64 / 1_000_000.0;

    let mut lines = vec![
        "  ====================================".to_string(),
        format!("               {}", bold.apply_to("Summary")),
        "  ====================================".to_string(),
        format!(
            "    Converted:    {}",
            green.apply_to(format!("{:>8}", summary.converted))
        ),
    ];
    if summary.failed > 0 {
        lines.push(format!(
            "    Failed:       {}",
            red.apply_to(format!("{:>8}", summary.failed))
        ));
    }
    if summary.cancelled > 0 {
        lines.push(format!(
            "    Cancelled:    {}",
            yellow.apply_to(format!("{:>8}", summary.cancelled))
        ));
    }
    lines.push("  ------------------------------------".to_string());
    lines.push(format!("    Total:        {:>8}", summary.total));
    lines.push(format!(
        "    Duration:     {:>7.1}s",
        summary.elapsed.as_secs_f64()
    ));
    lines.push(format!("    Rate:         {:>7.1} img/sec", summary.rate()));
    lines.push(format!("    Written:      {:>7.1} MB", mb_written));
    lines.push("  ====================================".to_string());

    if !summary.failures.is_empty() {
        lines.push(String::new());
        lines.push(format!("  {}", bold.apply_to("Failed files:")));
        for failure in &summary.failures {
            lines.push(format!(
                "    {} {}: {}",
                red.apply_to("x"),
                failure.file_name,
                failure.reason
            ));
        }
    }

    lines
}
