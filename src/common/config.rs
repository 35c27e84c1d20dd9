use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::common::collections::HashSet;
use crate::layout_engine::{LayoutKind, ScratchpadSpec};

const MAX_WORKSPACES: usize = 32;
const MAX_LAYOUT_CONSTANT: i32 = 4096;

pub fn config_dir() -> PathBuf {
    dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join("weft")
}
pub fn config_file() -> PathBuf { config_dir().join("weft.toml") }

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub workspaces: WorkspaceSettings,
    #[serde(default)]
    pub scratchpads: Vec<ScratchpadSpec>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Border width handed to every geometry command.
    #[serde(default = "default_border_width")]
    pub border_width: u32,
    /// Hide the windows of the workspace being left on a switch.
    #[serde(default = "yes")]
    pub hide_inactive_workspaces: bool,
    #[serde(default)]
    pub layout: LayoutSettings,
    /// Commands to run on startup
    #[serde(default)]
    pub run_on_start: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            border_width: default_border_width(),
            hide_inactive_workspaces: true,
            layout: LayoutSettings::default(),
            run_on_start: Vec::new(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
#[serde(deny_unknown_fields)]
pub struct LayoutSettings {
    /// Distance under which a floating window snaps to a monitor edge.
    #[serde(default = "default_layout_constant")]
    pub snap_threshold: i32,
    /// Cascade step of the stacking layout.
    #[serde(default = "default_layout_constant")]
    pub stack_offset: i32,
    /// Height of the tab strip of the tabbed layout.
    #[serde(default = "default_layout_constant")]
    pub tab_bar_height: i32,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            snap_threshold: default_layout_constant(),
            stack_offset: default_layout_constant(),
            tab_bar_height: default_layout_constant(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct WorkspaceSettings {
    #[serde(default = "default_workspace_names")]
    pub names: Vec<String>,
    /// Initial layout of each workspace, by index. Missing entries use
    /// `tile`.
    #[serde(default)]
    pub layouts: Vec<String>,
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        Self {
            names: default_workspace_names(),
            layouts: Vec::new(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Vec<String> { self.layout.validate() }

    pub fn auto_fix_values(&mut self) -> usize { self.layout.auto_fix_values() }
}

impl LayoutSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        for (name, value) in self.named_values() {
            if value < 0 {
                issues.push(format!("{name} must be non-negative, got {value}"));
            } else if value > MAX_LAYOUT_CONSTANT {
                issues.push(format!("{name} must be at most {MAX_LAYOUT_CONSTANT}, got {value}"));
            }
        }

        issues
    }

    pub fn auto_fix_values(&mut self) -> usize {
        let mut fixes = 0;

        for value in [&mut self.snap_threshold, &mut self.stack_offset, &mut self.tab_bar_height] {
            if *value < 0 {
                *value = default_layout_constant();
                fixes += 1;
            } else if *value > MAX_LAYOUT_CONSTANT {
                *value = MAX_LAYOUT_CONSTANT;
                fixes += 1;
            }
        }

        fixes
    }

    fn named_values(&self) -> [(&'static str, i32); 3] {
        [
            ("snap_threshold", self.snap_threshold),
            ("stack_offset", self.stack_offset),
            ("tab_bar_height", self.tab_bar_height),
        ]
    }
}

impl WorkspaceSettings {
    /// The configured initial layout of workspace `index`. Unknown names are
    /// reported and replaced by `tile`.
    pub fn layout_for(&self, index: usize) -> LayoutKind {
        let Some(name) = self.layouts.get(index) else {
            return LayoutKind::default();
        };
        LayoutKind::from_str(name).unwrap_or_else(|_| {
            warn!(workspace = index, layout = %name, "unknown layout, using tile");
            LayoutKind::default()
        })
    }

    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.names.is_empty() {
            issues.push("at least one workspace name is required".to_string());
        }
        if self.names.len() > MAX_WORKSPACES {
            issues.push(format!(
                "workspace count should not exceed {}, got {}",
                MAX_WORKSPACES,
                self.names.len()
            ));
        }
        if self.layouts.len() > self.names.len() {
            issues.push("More workspace layouts provided than workspace names".to_string());
        }

        for (index, name) in self.layouts.iter().enumerate() {
            if LayoutKind::from_str(name).is_err() {
                issues.push(format!("Workspace {} has unknown layout '{}'", index, name));
            }
        }

        issues
    }

    pub fn auto_fix_values(&mut self) -> usize {
        let mut fixes = 0;

        if self.names.is_empty() {
            self.names = default_workspace_names();
            fixes += 1;
        }
        if self.names.len() > MAX_WORKSPACES {
            self.names.truncate(MAX_WORKSPACES);
            fixes += 1;
        }
        if self.layouts.len() > self.names.len() {
            self.layouts.truncate(self.names.len());
            fixes += 1;
        }

        for name in &mut self.layouts {
            if LayoutKind::from_str(name).is_err() {
                *name = LayoutKind::default().name().to_string();
                fixes += 1;
            }
        }

        fixes
    }
}

fn validate_scratchpads(scratchpads: &[ScratchpadSpec]) -> Vec<String> {
    let mut issues = Vec::new();
    let mut seen = HashSet::default();

    for (index, pad) in scratchpads.iter().enumerate() {
        if pad.identifier.is_empty() {
            issues.push(format!("Scratchpad {} has no identifier", index));
        } else if !seen.insert(pad.identifier.as_str()) {
            issues.push(format!(
                "Duplicate scratchpad identifier '{}' in entry {}",
                pad.identifier, index
            ));
        }

        if pad.command.is_empty() {
            issues.push(format!("Scratchpad {} has an empty command", index));
        }

        if pad.matcher.as_ref().is_none_or(|m| m.is_empty()) {
            issues.push(format!(
                "Scratchpad '{}' has no match rule; its windows will be tiled",
                pad.identifier
            ));
        }

        if let Some(geometry) = pad.geometry {
            if geometry.is_degenerate() {
                issues.push(format!(
                    "Scratchpad '{}' has an empty geometry {}",
                    pad.identifier, geometry
                ));
            }
        }
    }

    issues
}

fn fix_scratchpads(scratchpads: &mut Vec<ScratchpadSpec>) -> usize {
    let mut fixes = 0;

    for pad in scratchpads.iter_mut() {
        if pad.geometry.is_some_and(|g| g.is_degenerate()) {
            pad.geometry = None;
            fixes += 1;
        }
    }

    let initial = scratchpads.len();
    let mut seen = HashSet::default();
    scratchpads.retain(|pad| {
        !pad.identifier.is_empty() && !pad.command.is_empty() && seen.insert(pad.identifier.clone())
    });
    fixes += initial - scratchpads.len();

    fixes
}

fn yes() -> bool { true }

fn default_border_width() -> u32 { 2 }

fn default_layout_constant() -> i32 { 20 }

fn default_workspace_names() -> Vec<String> { (1..=9).map(|i| i.to_string()).collect() }

impl Config {
    pub fn read(path: &Path) -> anyhow::Result<Config> {
        let buf = std::fs::read_to_string(path)?;
        Self::parse(&buf)
    }

    pub fn default() -> Config {
        Self::parse(include_str!("../../weft.default.toml")).expect("bundled config parses")
    }

    pub fn parse(buf: &str) -> anyhow::Result<Config> { Ok(toml::from_str(buf)?) }

    /// Validates the entire configuration and returns a list of issues found.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        issues.extend(self.settings.validate());
        issues.extend(self.workspaces.validate());
        issues.extend(validate_scratchpads(&self.scratchpads));

        issues
    }

    /// Attempts to fix configuration values automatically.
    /// Returns the number of fixes applied.
    pub fn auto_fix_values(&mut self) -> usize {
        let mut fixes = 0;

        fixes += self.settings.auto_fix_values();
        fixes += self.workspaces.auto_fix_values();
        fixes += fix_scratchpads(&mut self.scratchpads);

        fixes
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::sys::geometry::Rect;
    use crate::sys::spawn::SpawnCommand;

    #[test]
    fn default_config_parses() {
        let config = Config::default();
        assert_eq!(config.workspaces.names.len(), 9);
        assert_eq!(config.workspaces.layout_for(0), LayoutKind::Monocle);
        assert_eq!(config.workspaces.layout_for(1), LayoutKind::Tile);
        assert_eq!(config.scratchpads.len(), 3);
        assert_eq!(config.settings.border_width, 2);
        assert!(config.validate().is_empty(), "{:?}", config.validate());
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.settings, Settings::default());
        assert_eq!(config.workspaces.names, default_workspace_names());
        assert_eq!(config.workspaces.layout_for(4), LayoutKind::Tile);
        assert!(config.scratchpads.is_empty());
    }

    #[test]
    fn scratchpad_entries() {
        let config = Config::parse(
            r#"
            [[scratchpads]]
            identifier = "notes"
            command = ["alacritty", "--title", "Notes"]
            match = { title = "Notes" }
            geometry = { x = 10, y = 20, width = 300, height = 200 }

            [[scratchpads]]
            identifier = "term"
            command = "xterm -class scratch"
            floating = false
            match = { class = "scratch" }
            "#,
        )
        .unwrap();

        let notes = &config.scratchpads[0];
        assert_eq!(
            notes.command,
            SpawnCommand::Argv(vec!["alacritty".into(), "--title".into(), "Notes".into()])
        );
        assert_eq!(notes.geometry, Some(Rect::new(10, 20, 300, 200)));
        assert!(notes.floating);
        assert_eq!(config.scratchpads[1].command, SpawnCommand::Line("xterm -class scratch".into()));
        assert!(!config.scratchpads[1].floating);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(Config::parse("[settings]\nanimate = true\n").is_err());
        assert!(Config::parse("[workspaces]\ncount = 3\n").is_err());
    }

    #[test]
    fn unknown_layout_falls_back_to_tile() {
        let config = Config::parse("[workspaces]\nnames = [\"a\"]\nlayouts = [\"spiral\"]\n").unwrap();
        assert_eq!(config.workspaces.layout_for(0), LayoutKind::Tile);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        config.settings.layout.stack_offset = -10;
        let issues = config.validate();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("stack_offset must be non-negative"));

        let fixes = config.auto_fix_values();
        assert_eq!(fixes, 1);
        assert_eq!(config.settings.layout.stack_offset, 20);

        config.settings.layout.tab_bar_height = i32::MAX;
        let issues = config.validate();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("tab_bar_height must be at most"));
        assert_eq!(config.auto_fix_values(), 1);
        assert_eq!(config.settings.layout.tab_bar_height, MAX_LAYOUT_CONSTANT);

        config.workspaces.layouts[2] = "spiral".into();
        config.workspaces.names = (0..40).map(|i| i.to_string()).collect();
        assert_eq!(config.validate().len(), 2);
        assert_eq!(config.auto_fix_values(), 2);
        assert_eq!(config.workspaces.names.len(), MAX_WORKSPACES);
        assert_eq!(config.workspaces.layouts[2], "tile");
        assert!(config.validate().is_empty());
    }

    #[test]
    fn bad_scratchpads_are_dropped() {
        let mut config = Config::default();
        let mut dup = config.scratchpads[0].clone();
        dup.command = SpawnCommand::Line("other".into());
        config.scratchpads.push(dup);
        let mut empty = config.scratchpads[1].clone();
        empty.identifier = "empty".into();
        empty.command = SpawnCommand::Argv(vec![]);
        config.scratchpads.push(empty);

        assert_eq!(config.validate().len(), 2);
        assert_eq!(config.auto_fix_values(), 2);
        assert_eq!(config.scratchpads.len(), 3);
        assert_eq!(config.scratchpads[0].command, Config::default().scratchpads[0].command);
    }
}
