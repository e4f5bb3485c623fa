mod settings;

pub use settings::{Command, Config, OutputSettings, Settings};
