//! Recording and replaying reactor events as JSON lines.
//!
//! Replayed events drive the headless display: a recorded window appearing
//! creates a headless surface, a recorded output change reconfigures its
//! outputs.

use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use super::{Command, Event};
use crate::sys::geometry::Rect;
use crate::sys::headless::HeadlessDisplay;
use crate::sys::screen::OutputInfo;
use crate::sys::surface::WindowId;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReplayEvent {
    WindowAppeared {
        id: WindowId,
        geometry: Rect,
        #[serde(default)]
        class: Vec<String>,
        #[serde(default)]
        title: String,
    },
    WindowGone(WindowId),
    /// The window dies without a window-gone notification.
    WindowKilled(WindowId),
    WindowFocused(WindowId),
    Outputs(Vec<OutputInfo>),
    ScreenParametersChanged,
    Command(Command),
}

impl ReplayEvent {
    pub fn from_event(event: &Event) -> Self {
        match event {
            Event::WindowAppeared { surface, class, title } => ReplayEvent::WindowAppeared {
                id: surface.id(),
                geometry: surface.geometry().unwrap_or_default(),
                class: class.clone(),
                title: title.clone(),
            },
            Event::WindowGone(id) => ReplayEvent::WindowGone(*id),
            Event::WindowFocused(id) => ReplayEvent::WindowFocused(*id),
            Event::ScreenParametersChanged => ReplayEvent::ScreenParametersChanged,
            Event::Command(cmd) => ReplayEvent::Command(cmd.clone()),
        }
    }

    /// Applies the change to `display` and returns the event the reactor
    /// should see, if any.
    pub fn apply(self, display: &HeadlessDisplay) -> Option<Event> {
        match self {
            ReplayEvent::WindowAppeared { id, geometry, class, title } => Some(Event::WindowAppeared {
                surface: display.create_surface(id, geometry),
                class,
                title,
            }),
            ReplayEvent::WindowGone(id) => Some(Event::WindowGone(id)),
            ReplayEvent::WindowKilled(id) => {
                if !display.kill(id) {
                    warn!(window = %id, "replay killed an unknown window");
                }
                None
            }
            ReplayEvent::WindowFocused(id) => Some(Event::WindowFocused(id)),
            ReplayEvent::Outputs(outputs) => {
                display.set_outputs(outputs);
                Some(Event::ScreenParametersChanged)
            }
            ReplayEvent::ScreenParametersChanged => Some(Event::ScreenParametersChanged),
            ReplayEvent::Command(cmd) => Some(Event::Command(cmd)),
        }
    }
}

/// Parses JSON lines. Blank lines and lines starting with `#` are skipped.
pub fn read_events(reader: impl BufRead) -> impl Iterator<Item = anyhow::Result<ReplayEvent>> {
    reader.lines().enumerate().filter_map(|(number, line)| {
        let line = match line {
            Ok(line) => line,
            Err(e) => return Some(Err(e.into())),
        };
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return None;
        }
        Some(
            serde_json::from_str(trimmed)
                .map_err(|e| anyhow::anyhow!("line {}: {}", number + 1, e)),
        )
    })
}

/// Writes every handled event to a file, when enabled.
pub struct Record {
    file: Option<BufWriter<File>>,
}

impl Record {
    pub fn new(path: Option<&Path>) -> Self {
        let file = path.and_then(|path| match File::create(path) {
            Ok(file) => Some(BufWriter::new(file)),
            Err(e) => {
                error!(path = %path.display(), %e, "could not open record file");
                None
            }
        });
        Self { file }
    }

    pub fn disabled() -> Self { Self { file: None } }

    pub fn is_enabled(&self) -> bool { self.file.is_some() }

    pub fn on_event(&mut self, event: &Event) {
        let Some(file) = &mut self.file else {
            return;
        };
        let line = ReplayEvent::from_event(event);
        let result = serde_json::to_writer(&mut *file, &line)
            .map_err(std::io::Error::from)
            .and_then(|_| writeln!(file))
            .and_then(|_| file.flush());
        if let Err(e) = result {
            error!(%e, "failed to record event, recording stopped");
            self.file = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parses_lines_and_skips_comments() {
        let input = r#"
# two windows, then a layout change
{"window_appeared":{"id":1,"geometry":{"x":0,"y":0,"width":10,"height":10},"class":["xterm"]}}

{"command":"next_layout"}
{"command":{"switch_workspace":2}}
"screen_parameters_changed"
"#;
        let events: Vec<_> = read_events(Cursor::new(input)).collect::<anyhow::Result<_>>().unwrap();
        assert_eq!(
            events,
            vec![
                ReplayEvent::WindowAppeared {
                    id: WindowId::new(1),
                    geometry: Rect::new(0, 0, 10, 10),
                    class: vec!["xterm".into()],
                    title: String::new(),
                },
                ReplayEvent::Command(Command::NextLayout),
                ReplayEvent::Command(Command::SwitchWorkspace(2)),
                ReplayEvent::ScreenParametersChanged,
            ]
        );
    }

    #[test]
    fn reports_the_bad_line() {
        let err = read_events(Cursor::new("\"screen_parameters_changed\"\n{oops}\n"))
            .collect::<anyhow::Result<Vec<_>>>()
            .unwrap_err();
        assert!(err.to_string().starts_with("line 2:"), "{err}");
    }

    #[test]
    fn recorded_events_can_be_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let display = HeadlessDisplay::new(Rect::new(0, 0, 100, 100));

        let mut record = Record::new(Some(&path));
        assert!(record.is_enabled());
        record.on_event(&Event::WindowAppeared {
            surface: display.create_surface(WindowId::new(3), Rect::new(1, 2, 3, 4)),
            class: vec![],
            title: "t".into(),
        });
        record.on_event(&Event::Command(Command::ToggleScratchpad("term1".into())));
        drop(record);

        let file = std::io::BufReader::new(File::open(&path).unwrap());
        let events: Vec<_> = read_events(file).collect::<anyhow::Result<_>>().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[0],
            ReplayEvent::WindowAppeared {
                id: WindowId::new(3),
                geometry: Rect::new(1, 2, 3, 4),
                class: vec![],
                title: "t".into(),
            }
        );
    }

    #[test]
    fn killed_windows_produce_no_event() {
        let display = HeadlessDisplay::new(Rect::new(0, 0, 100, 100));
        display.create_surface(WindowId::new(1), Rect::default());
        assert!(ReplayEvent::WindowKilled(WindowId::new(1)).apply(&display).is_none());
        assert!(!display.surface(WindowId::new(1)).unwrap().state().alive);
    }
}
