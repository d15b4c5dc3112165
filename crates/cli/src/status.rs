//! The status line shown above a run's output.
//!
//! Layout, left to right: power icon and script name, position in the
//! history, a running or failed marker, then (pushed to the right edge) the
//! repeat count, how long ago the run started and how long it took. When the
//! terminal is too narrow the name goes first, then the repeat count, then
//! the time since the run.

use std::time::Duration;

use chrono::{DateTime, Local};
use crossterm::style::{style, Color, StyledContent, Stylize};
use itertools::Itertools;
use watchout_core::orchestrator::StatusView;
use watchout_core::run::RunResult;

const POWER_ICON: &str = "⏻";
const FAILED_ICON: &str = "❌";
const RUNNING_ICON: &str = "⬤";
const SEPARATOR_LEFT: &str = "  ⟫  ";
const SEPARATOR_RIGHT: &str = "  ⟪  ";

/// Smallest gap kept between the left and right halves.
const MIN_GAP: usize = 2;

/// Runs younger than this don't show a "time ago" part.
const AGO_THRESHOLD: Duration = Duration::from_secs(2);

type Segment = StyledContent<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PartKind {
    Position,
    Running,
    Failed,
    Took,
    Ago,
    Repeats,
}

struct Part {
    kind: PartKind,
    segments: Vec<Segment>,
}

impl Part {
    fn new(kind: PartKind, segments: Vec<Segment>) -> Self {
        Self { kind, segments }
    }
}

fn paint(text: impl Into<String>, color: Color, bold: bool, dim: bool) -> Segment {
    let mut content = style(text.into()).with(color);
    if bold {
        content = content.bold();
    }
    if dim {
        content = content.dim();
    }
    content
}

/// Terminal columns taken by `text`. The failure icon is drawn double width.
fn display_width(text: &str) -> usize {
    text.chars().count() + text.matches(FAILED_ICON).count()
}

fn width_of(segments: &[Segment]) -> usize {
    segments
        .iter()
        .map(|segment| display_width(segment.content()))
        .sum()
}

#[derive(Debug, Clone, Copy)]
enum Unit {
    Day,
    Hour,
    Minute,
    Second,
    Millisecond,
}

impl Unit {
    fn format(self, value: u128, verbose: bool) -> String {
        let (long, short) = match self {
            Unit::Day => ("day", "d"),
            Unit::Hour => ("hour", "h"),
            Unit::Minute => ("minute", "min"),
            Unit::Second => ("second", "s"),
            Unit::Millisecond => ("millisecond", "ms"),
        };

        if !verbose {
            return format!("{value} {short}");
        }

        let plural = if value == 1 { "" } else { "s" };
        format!("{value} {long}{plural}")
    }
}

/// Precise duration down to the millisecond, e.g. `1 s and 500 ms`.
pub fn format_duration(duration: Duration, verbose: bool) -> String {
    let total = duration.as_millis();
    let units = [
        (total / 3_600_000, Unit::Hour),
        (total / 60_000 % 60, Unit::Minute),
        (total / 1000 % 60, Unit::Second),
        (total % 1000, Unit::Millisecond),
    ];

    let parts: Vec<String> = units
        .iter()
        .filter(|(value, _)| *value > 0)
        .map(|(value, unit)| unit.format(*value, verbose))
        .collect();

    match parts.as_slice() {
        [] => Unit::Millisecond.format(0, verbose),
        [only] => only.clone(),
        [init @ .., last] => format!("{} and {}", init.iter().join(", "), last),
    }
}

/// Coarse elapsed time in its largest unit, e.g. `5 min`.
pub fn format_elapsed(elapsed: Duration, verbose: bool) -> String {
    let seconds = u128::from(elapsed.as_secs());
    let (value, unit) = match seconds {
        0 => (elapsed.as_millis(), Unit::Millisecond),
        1..=59 => (seconds, Unit::Second),
        60..=3599 => (seconds / 60, Unit::Minute),
        3600..=86_399 => (seconds / 3600, Unit::Hour),
        _ => (seconds / 86_400, Unit::Day),
    };
    unit.format(value, verbose)
}

/// A rendered status line, with and without ANSI styling.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub plain: String,
    pub styled: String,
}

impl Rendered {
    fn from_segments(segments: &[Segment]) -> Self {
        Self {
            plain: segments.iter().map(StyledContent::content).join(""),
            styled: segments.iter().map(ToString::to_string).join(""),
        }
    }
}

/// Builds status lines for one session.
pub struct StatusBar {
    name: String,
    verbose: bool,
}

impl StatusBar {
    pub fn new(name: impl Into<String>, verbose: bool) -> Self {
        Self {
            name: name.into(),
            verbose,
        }
    }

    /// Renders the line for `view`, fitted to `width` columns.
    pub fn render(&self, view: &StatusView<'_>, now: DateTime<Local>, width: usize) -> Rendered {
        let mut line = self.line(view, now);
        line.fit(width);
        line.render(width)
    }

    fn line(&self, view: &StatusView<'_>, now: DateTime<Local>) -> StatusLine {
        // Everything is dimmed unless an older run is being looked at.
        let dim = !(view.position != view.total && view.entry.is_some());

        let mut left = Vec::new();
        if let Some(position) = position_part(view) {
            left.push(position);
        }

        let Some(entry) = view.entry else {
            if view.is_running {
                left.push(Part::new(
                    PartKind::Running,
                    vec![paint(RUNNING_ICON, Color::Yellow, true, false)],
                ));
            }
            return StatusLine {
                name: Some(self.name.clone()),
                dim,
                left,
                right: Vec::new(),
                has_entry: false,
            };
        };

        if entry.failed {
            left.push(Part::new(
                PartKind::Failed,
                vec![paint(FAILED_ICON, Color::Red, true, false)],
            ));
        }

        StatusLine {
            name: Some(self.name.clone()),
            dim,
            left,
            right: self.right_parts(entry, now, dim),
            has_entry: true,
        }
    }

    /// Right-hand parts in display order.
    fn right_parts(&self, entry: &RunResult, now: DateTime<Local>, dim: bool) -> Vec<Part> {
        let mut parts = Vec::new();

        let took = format_duration(entry.duration, self.verbose);
        parts.push(Part::new(
            PartKind::Took,
            vec![
                paint("took ", Color::White, false, dim),
                paint(took.clone(), Color::White, true, dim),
            ],
        ));

        let elapsed = (now - entry.started_at).to_std().unwrap_or_default();
        let ago = format_elapsed(elapsed, self.verbose);
        if elapsed > AGO_THRESHOLD && ago != took {
            let mut segments = Vec::new();
            if self.verbose {
                let prefix = if entry.repeats > 0 { "last ran " } else { "ran " };
                segments.push(paint(prefix, Color::White, false, dim));
            }
            segments.push(paint(ago, Color::White, true, dim));
            segments.push(paint(" ago", Color::White, false, dim));
            parts.push(Part::new(PartKind::Ago, segments));
        }

        if entry.repeats > 0 {
            let prefix = if self.verbose { "repeated " } else { "" };
            parts.push(Part::new(
                PartKind::Repeats,
                vec![paint(
                    format!("{prefix}{}x", entry.repeats + 1),
                    Color::White,
                    false,
                    dim,
                )],
            ));
        }

        parts.reverse();
        parts
    }
}

fn position_part(view: &StatusView<'_>) -> Option<Part> {
    let (position, total) = (view.position, view.total);

    let segments = if position == 0 && total == 0 {
        return None;
    } else if position == total {
        vec![paint(position.to_string(), Color::Magenta, true, true)]
    } else if view.entry.is_none() {
        vec![
            paint(position.to_string(), Color::Yellow, true, true),
            paint(format!(" / {total}"), Color::White, true, true),
        ]
    } else {
        vec![
            paint(position.to_string(), Color::Cyan, true, false),
            paint(format!(" / {total}"), Color::Magenta, false, false),
        ]
    };

    Some(Part::new(PartKind::Position, segments))
}

struct StatusLine {
    name: Option<String>,
    dim: bool,
    left: Vec<Part>,
    right: Vec<Part>,
    has_entry: bool,
}

impl StatusLine {
    fn left_segments(&self) -> Vec<Segment> {
        let title = match &self.name {
            Some(name) => format!("{POWER_ICON}  {name}"),
            None => POWER_ICON.to_string(),
        };

        let mut segments = vec![paint(title, Color::Magenta, true, self.dim)];
        for part in &self.left {
            segments.push(paint(SEPARATOR_LEFT, Color::White, false, true));
            segments.extend(part.segments.iter().cloned());
        }
        segments
    }

    fn right_segments(&self) -> Vec<Segment> {
        let mut segments = Vec::new();
        for (index, part) in self.right.iter().enumerate() {
            if index > 0 {
                segments.push(paint(SEPARATOR_RIGHT, Color::White, false, true));
            }
            segments.extend(part.segments.iter().cloned());
        }
        if !segments.is_empty() {
            segments.push(style(" ".to_string()));
        }
        segments
    }

    fn used_width(&self) -> usize {
        width_of(&self.left_segments()) + width_of(&self.right_segments())
    }

    /// Drops optional parts until both halves fit with a minimal gap.
    fn fit(&mut self, width: usize) {
        if !self.has_entry {
            return;
        }

        while self.used_width() + MIN_GAP > width {
            if !self.truncate() {
                break;
            }
        }
    }

    fn truncate(&mut self) -> bool {
        if self.name.take().is_some() {
            return true;
        }

        for kind in [PartKind::Repeats, PartKind::Ago] {
            if let Some(index) = self.right.iter().position(|part| part.kind == kind) {
                self.right.remove(index);
                return true;
            }
        }

        false
    }

    fn render(&self, width: usize) -> Rendered {
        let mut segments = self.left_segments();
        if !self.has_entry {
            return Rendered::from_segments(&segments);
        }

        let right = self.right_segments();
        let gap = width
            .saturating_sub(width_of(&segments) + width_of(&right))
            .max(MIN_GAP);

        segments.push(style(" ".repeat(gap)));
        segments.extend(right);
        Rendered::from_segments(&segments)
    }
}
