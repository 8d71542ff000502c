use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::Config;

use crate::log::LogSettings;

// ISO 8601 timestamp, highlighted level, module path.
const LINE_PATTERN: &str = "{d(%Y-%m-%dT%H:%M:%SZ)} {h({l})} {t} - {m}{n}";
const STDERR: &str = "stderr";

impl LogSettings {
    fn build_config(&self) -> Result<Config, log4rs::config::runtime::ConfigErrors> {
        // stdout carries the run summary.
        let console = ConsoleAppender::builder()
            .target(Target::Stderr)
            .encoder(Box::new(PatternEncoder::new(LINE_PATTERN)))
            .build();
        let loggers = self
            .module_levels
            .iter()
            .map(|(module, level)| Logger::builder().build(module.clone(), *level));
        Config::builder()
            .appender(Appender::builder().build(STDERR, Box::new(console)))
            .loggers(loggers)
            .build(Root::builder().appender(STDERR).build(self.level))
    }

    /// Installs the `log4rs` console logger on first use and reconfigures it afterwards.
    pub(in crate::log) fn apply(&mut self) {
        let config = match self.build_config() {
            Ok(config) => config,
            Err(e) => {
                eprintln!("invalid log configuration: {e}");
                return;
            }
        };
        if let Some(handle) = &self.handle {
            handle.set_config(config);
            return;
        }
        match log4rs::init_config(config) {
            Ok(handle) => self.handle = Some(handle),
            // Someone else installed a logger first.
            Err(e) => eprintln!("could not install logger: {e}"),
        }
    }
}
