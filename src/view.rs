use crate::controls::{Controls, Status};

/// One line describing the status and which triggers are live
pub fn render(status: Status, controls: Controls) -> String {
    let buttons = [
        ("r:record", controls.record),
        ("s:stop", controls.stop_record),
        ("p:play", controls.play),
        ("x:stop-play", controls.stop_play),
    ];

    let enabled: Vec<&str> = buttons
        .iter()
        .filter(|(_, enabled)| *enabled)
        .map(|(name, _)| *name)
        .collect();

    format!("[{}] {}", status, enabled.join("  "))
}

/// Prints the status display and short-lived notices to stdout
#[derive(Default)]
pub struct TerminalView {
    last: Option<String>,
}

impl TerminalView {
    pub fn show(&mut self, status: Status, controls: Controls) {
        let line = render(status, controls);
        if self.last.as_deref() != Some(line.as_str()) {
            println!("{}", line);
            self.last = Some(line);
        }
    }

    pub fn notice(&self, message: impl std::fmt::Display) {
        println!("! {}", message);
    }

    pub fn help(&self) {
        println!("{}", crate::input::HELP);
    }
}
