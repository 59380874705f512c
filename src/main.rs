// memory-map a device-DAX node and write the test pattern into it
use dax_fill::utils::arg_parser::ArgParser;
use log::{error, info};

fn main() {
    // Initialize the logger
    if let Err(e) = simple_logger::init_with_level(log::Level::Info) {
        eprintln!("Failed to initialize logger: {}", e);
    }

    let mut parser = ArgParser::new("iogen", "Write a test pattern into a memory-mapped CXL/DAX device");
    let report = parser.parse().and_then(|_| dax_fill::run(&parser.config));

    match report {
        Ok(report) => {
            info!(
                "{} pattern writes into {} bytes",
                report.writes, report.capacity
            );
        }
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}
