//! Plain-text renderer for the view controller's commands.

use std::io::Write;

use weather_core::render::{ChartSpec, Field, RenderCommand, Renderer, View};

const BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

pub struct TerminalRenderer<W: Write + Send> {
    out: W,
    /// Echo search-form chrome (chip, spinner) as well as results.
    chatty: bool,
}

impl<W: Write + Send> TerminalRenderer<W> {
    pub fn new(out: W, chatty: bool) -> Self {
        Self { out, chatty }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        // Nothing sensible to do if stdout is gone.
        let _ = writeln!(self.out, "{text}");
    }

    fn field(&mut self, field: Field, text: &str) {
        let label = match field {
            Field::City => {
                self.line("");
                self.line(text);
                self.line(&"─".repeat(text.chars().count()));
                return;
            }
            Field::CurrentTemp => "Now",
            Field::MaxTemp => "High",
            Field::MinTemp => "Low",
            Field::FeelsLike => "Feels like",
            Field::Uv => "UV index",
            Field::Condition => "Sky",
            Field::Sunrise | Field::Sunset | Field::MoonPhase | Field::Aqi => {
                self.line(&format!("  {text}"));
                return;
            }
        };
        self.line(&format!("  {label:<11}{text}"));
    }

    fn chart(&mut self, spec: &ChartSpec) {
        self.line("");
        if let (Some(first), Some(last)) = (spec.labels.first(), spec.labels.last()) {
            self.line(&format!("  {:<16} {first} … {last}", ""));
        }
        for series in &spec.series {
            let (lo, hi) = bounds(&series.data);
            self.line(&format!(
                "  {:<16} {}  {lo}{suffix}–{hi}{suffix}",
                series.label,
                sparkline(&series.data),
                suffix = spec.y_suffix,
            ));
        }
    }
}

fn bounds(data: &[f64]) -> (f64, f64) {
    data.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}

pub fn sparkline(data: &[f64]) -> String {
    let (lo, hi) = bounds(data);
    let span = hi - lo;
    data.iter()
        .map(|&v| {
            if span <= f64::EPSILON {
                return BARS[0];
            }
            let idx = ((v - lo) / span * (BARS.len() - 1) as f64).round() as usize;
            BARS[idx.min(BARS.len() - 1)]
        })
        .collect()
}

impl<W: Write + Send> Renderer for TerminalRenderer<W> {
    fn apply(&mut self, command: RenderCommand) {
        match command {
            RenderCommand::SetText { field, text } => self.field(field, &text),
            RenderCommand::SetIcon { src, .. } if !src.is_empty() && self.chatty => {
                self.line(&format!("  Icon       {src}"));
            }
            RenderCommand::DrawChart(spec) => self.chart(&spec),
            RenderCommand::ShowError(message) => self.line(&format!("✗ {message}")),
            RenderCommand::SetSpinner(true) if self.chatty => self.line("Searching…"),
            RenderCommand::SetLastChip(Some(label)) if self.chatty => {
                self.line(&format!("Last: {label}"));
            }
            RenderCommand::ShowView(View::Search) if self.chatty => self.line(""),
            _ => {}
        }
        let _ = self.out.flush();
    }
}
