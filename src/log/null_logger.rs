//! Stands in for the `log4rs` backend when the `logging` feature is off. Nothing is output,
//! but the level still gates the `log` macros.

use crate::log::LogSettings;

impl LogSettings {
    pub(in crate::log) fn apply(&mut self) {
        log::set_max_level(self.level);
    }
}
