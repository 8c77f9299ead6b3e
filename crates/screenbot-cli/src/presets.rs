use clap::ValueEnum;
use std::fmt;

/// Built-in sequences for the two dialog layouts
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    Horizontal,
    Vertical,
}

const HORIZONTAL: &str = "\
click text x20 2
# IF_FAIL_THEN click text x5o 2
click text ok 1
wait 3
click 1800 1000
wait 1
click 1800 300
wait 3
click text close 1
wait 4
click text cancel 1
# STOP_ON_FAIL
# LOOP_IF_SUCCESS 1
";

const VERTICAL: &str = "\
click text x20 2
# IF_FAIL_THEN click text x5o 2
click text ok 1
wait 3
click 900 1030
wait 1
click 900 700
wait 3
click text close 1
wait 4
click text cancel 1
# STOP_ON_FAIL
# LOOP_IF_SUCCESS 1
";

impl Preset {
    pub fn script(&self) -> &'static str {
        match self {
            Preset::Horizontal => HORIZONTAL,
            Preset::Vertical => VERTICAL,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "horizontal" => Some(Preset::Horizontal),
            "vertical" => Some(Preset::Vertical),
            _ => None,
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Preset::Horizontal => write!(f, "horizontal"),
            Preset::Vertical => write!(f, "vertical"),
        }
    }
}
