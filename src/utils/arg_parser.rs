// Parse command line arguments for the iogen binary

use clap::error::ErrorKind;
use clap::{Arg, ArgAction, value_parser};
use std::path::PathBuf;

use crate::config::{DaxConfig, DEFAULT_DEVICE};
use crate::error::DaxError;
use crate::fill::FillMode;


#[derive(Debug)]
pub struct ArgParser {
    program_name: String,
    about: String,
    pub config: DaxConfig,
}

impl ArgParser {

    pub fn new(program_name: &str, about: &str) -> Self {
        Self {
            program_name: program_name.to_string(),
            about: about.to_string(),
            config: DaxConfig::default(),
        }
    }

    fn command(&self) -> clap::Command {
        clap::Command::new(&self.program_name)
            .version("1.0")
            .about(&self.about)
            .arg(
                Arg::new("device")
                    .help("Name of the device-DAX node under /dev")
                    .default_value(DEFAULT_DEVICE)
                    .value_parser(value_parser!(String)),
            )
            .arg(
                Arg::new("config")
                    .short('C')
                    .long("config")
                    .help("Path to a TOML config file. Mutually exclusive with all other arguments")
                    .value_parser(value_parser!(String)),
            )
            .arg(
                Arg::new("step")
                    .short('s')
                    .long("step")
                    .help("Distance between two pattern writes (in bytes, multiple of 64)")
                    .value_parser(value_parser!(usize)),
            )
            .arg(
                Arg::new("full")
                    .long("full")
                    .help("Fill the whole mapped region instead of stopping at capacity / step")
                    .action(ArgAction::SetTrue),
            )
            .arg(
                Arg::new("sysfs_root")
                    .long("sysfs-root")
                    .help("Directory holding the <device>/size attributes")
                    .value_parser(value_parser!(PathBuf)),
            )
            .arg(
                Arg::new("dev_root")
                    .long("dev-root")
                    .help("Directory holding the device nodes")
                    .value_parser(value_parser!(PathBuf)),
            )
            // anything after the device name is accepted and ignored
            .arg(
                Arg::new("ignored")
                    .hide(true)
                    .num_args(1..)
                    .action(ArgAction::Append)
                    .value_parser(value_parser!(String)),
            )
    }

    /// Parse the process arguments into `self.config`. Only --help and
    /// --version end the process here; every other error is returned.
    pub fn parse(&mut self) -> Result<(), DaxError> {
        self.parse_from(std::env::args_os())
    }

    /// Same as parse() but from an explicit argument list.
    pub fn parse_from<I, T>(&mut self, args: I) -> Result<(), DaxError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let matches = match self.command().try_get_matches_from(args) {
            Ok(matches) => matches,
            Err(e) => match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => e.exit(),
                _ => return Err(DaxError::Config(e.to_string().trim_end().to_string())),
            },
        };
        self.apply(matches)
    }

    fn apply(&mut self, mut matches: clap::ArgMatches) -> Result<(), DaxError> {
        if let Some(device) = matches.remove_one::<String>("device") {
            self.config.device = device;
        }
        if let Some(step) = matches.remove_one::<usize>("step") {
            self.config.step_size = step;
        }
        if matches.get_flag("full") {
            self.config.fill_mode = FillMode::Full;
        }
        if let Some(root) = matches.remove_one::<PathBuf>("sysfs_root") {
            self.config.sysfs_root = root;
        }
        if let Some(root) = matches.remove_one::<PathBuf>("dev_root") {
            self.config.dev_root = root;
        }
        if let Some(ref path) = matches.remove_one::<String>("config") {
            println!("Config file provided, ignoring other CLI arguments");
            // overwrite other args
            self.config = DaxConfig::from_file(path)?;
        }

        self.config.validate()
    }

}
