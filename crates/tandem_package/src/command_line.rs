//! Process command line
//!
//! Switches (`--name` or `--name=value`) are kept apart from positional
//! arguments so the startup hook can add either without reordering the
//! other. `--` ends switch parsing.

use std::ffi::OsStr;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandLine {
    program: String,
    switches: Vec<(String, Option<String>)>,
    args: Vec<String>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    /// Parse a full argument vector, program name first.
    pub fn parse<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut argv = argv
            .into_iter()
            .map(|arg| arg.as_ref().to_string_lossy().into_owned());
        let mut line = Self::new(argv.next().unwrap_or_default());

        let mut positional_only = false;
        for arg in argv {
            if positional_only {
                line.args.push(arg);
                continue;
            }
            if arg == "--" {
                positional_only = true;
                continue;
            }
            match arg.strip_prefix("--") {
                Some(switch) => match switch.split_once('=') {
                    Some((name, value)) => line.append_switch_value(name, value),
                    None => line.append_switch(switch),
                },
                None => line.args.push(arg),
            }
        }
        line
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Add a valueless switch. An existing switch of the same name loses its value.
    pub fn append_switch(&mut self, name: &str) {
        self.put_switch(name, None);
    }

    pub fn append_switch_value(&mut self, name: &str, value: &str) {
        self.put_switch(name, Some(value.to_owned()));
    }

    fn put_switch(&mut self, name: &str, value: Option<String>) {
        match self.switches.iter_mut().find(|(existing, _)| existing == name) {
            Some((_, slot)) => *slot = value,
            None => self.switches.push((name.to_owned(), value)),
        }
    }

    pub fn has_switch(&self, name: &str) -> bool {
        self.switches.iter().any(|(existing, _)| existing == name)
    }

    pub fn switch_value(&self, name: &str) -> Option<&str> {
        self.switches
            .iter()
            .find(|(existing, _)| existing == name)
            .and_then(|(_, value)| value.as_deref())
    }

    pub fn append_arg_path(&mut self, path: &Path) {
        self.args.push(path.to_string_lossy().into_owned());
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The full argument vector: program, switches, then positional
    /// arguments behind a `--` when any of them looks like a switch.
    pub fn argv(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(1 + self.switches.len() + self.args.len());
        argv.push(self.program.clone());
        for (name, value) in &self.switches {
            argv.push(match value {
                Some(value) => format!("--{name}={value}"),
                None => format!("--{name}"),
            });
        }
        if self.args.iter().any(|arg| arg.starts_with("--")) {
            argv.push("--".to_owned());
        }
        argv.extend(self.args.iter().cloned());
        argv
    }
}
