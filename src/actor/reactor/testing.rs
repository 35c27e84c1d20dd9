pub use crate::sys::headless::HeadlessDisplay;

use super::{Command, Event, Reactor, ReactorError, Record};
use crate::common::config::{Config, WorkspaceSettings};
use crate::layout_engine::ScratchpadSpec;
use crate::layout_engine::scratchpad::WindowMatch;
use crate::sys::geometry::Rect;
use crate::sys::screen::OutputInfo;
use crate::sys::spawn::SpawnCommand;
use crate::sys::surface::WindowId;

pub fn config(names: &[&str], layouts: &[&str]) -> Config {
    Config {
        settings: Default::default(),
        workspaces: WorkspaceSettings {
            names: names.iter().map(|n| n.to_string()).collect(),
            layouts: layouts.iter().map(|l| l.to_string()).collect(),
        },
        scratchpads: Vec::new(),
    }
}

pub fn with_scratchpad(mut config: Config, identifier: &str, class: &str) -> Config {
    config.scratchpads.push(ScratchpadSpec {
        identifier: identifier.to_string(),
        command: SpawnCommand::Line(format!("xterm -class {class}")),
        matcher: Some(WindowMatch {
            class: Some(class.to_string()),
            title: None,
        }),
        geometry: None,
        floating: true,
    });
    config
}

/// Two 1000x800 outputs side by side.
pub fn dual_display() -> HeadlessDisplay {
    let display = HeadlessDisplay::new(Rect::new(0, 0, 2000, 800));
    display.set_outputs(vec![
        OutputInfo::new("left", Rect::new(0, 0, 1000, 800)),
        OutputInfo::new("right", Rect::new(1000, 0, 1000, 800)),
    ]);
    display
}

pub fn reactor_on(config: Config, display: &HeadlessDisplay) -> Reactor {
    Reactor::new(
        &config,
        Box::new(display.clone()),
        Box::new(display.clone()),
        Record::disabled(),
    )
}

pub struct Harness {
    pub reactor: Reactor,
    pub display: HeadlessDisplay,
}

impl Harness {
    pub fn new(config: Config) -> Self {
        Self::with_display(config, HeadlessDisplay::new(Rect::new(0, 0, 1000, 800)))
    }

    pub fn with_display(config: Config, display: HeadlessDisplay) -> Self {
        Self {
            reactor: reactor_on(config, &display),
            display,
        }
    }

    fn appear(&mut self, id: u32, geometry: Rect, class: Vec<String>) -> WindowId {
        let id = WindowId::new(id);
        let surface = self.display.create_surface(id, geometry);
        self.reactor
            .handle_event(Event::WindowAppeared { surface, class, title: format!("window {id}") })
            .unwrap();
        id
    }

    pub fn open(&mut self, id: u32) -> WindowId { self.appear(id, Rect::default(), vec![]) }

    pub fn open_at(&mut self, id: u32, geometry: Rect) -> WindowId {
        self.appear(id, geometry, vec![])
    }

    pub fn open_with_class(&mut self, id: u32, class: &str) -> WindowId {
        self.appear(id, Rect::default(), vec!["xterm".into(), class.to_string()])
    }

    pub fn command(&mut self, cmd: Command) -> Result<(), ReactorError> {
        self.reactor.handle_event(Event::Command(cmd))
    }

    pub fn frame(&self, id: WindowId) -> Rect {
        self.display.surface(id).expect("surface exists").frame()
    }

    pub fn visible(&self, id: WindowId) -> bool {
        self.display.surface(id).expect("surface exists").is_visible()
    }
}
