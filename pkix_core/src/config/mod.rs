pub mod path;
pub mod retry;
pub mod settings;

use snafu::{Location, Snafu};

pub use path::PathConfig;
pub use settings::{Setting, Settings};

#[derive(Snafu, Debug)]
#[snafu(visibility(pub))]
pub enum ConfigError {
    #[snafu(display("Setting {parameter} could not be decoded: {message}"))]
    MalformedSetting {
        parameter: String,
        message: String,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Invalid value {value:?} for {parameter}: {explanation}"))]
    InvalidParameterValue {
        parameter: String,
        value: String,
        explanation: String,
        #[snafu(implicit)]
        location: Location,
    },
}
