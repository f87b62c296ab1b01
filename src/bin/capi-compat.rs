//! capi-compat report tool
//!
//! Prints how every catalogue operation is provided for a runtime release:
//! the release the crate was built for, or one given on the command line.

use capi_compat::gate::{self, Provision};
use capi_compat::{RuntimeVersion, TARGET};

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    let target = if args.len() > 1 {
        match RuntimeVersion::parse(&args[1]) {
            Ok(v) => v,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        TARGET
    };

    tracing::debug!(%target, built_for = %TARGET, "reporting catalogue");
    report(target);
}

fn report(target: RuntimeVersion) {
    println!("target runtime: {}", target);
    #[cfg(feature = "dump")]
    println!("packed version: 0x{:08X}", target.hex());
    println!();

    let mut polyfilled = 0;
    let mut unavailable = 0;
    for entry in gate::catalogue(target) {
        match entry.provision {
            Provision::Polyfill => polyfilled += 1,
            Provision::Unavailable => unavailable += 1,
            Provision::Native => {}
        }

        #[cfg(feature = "dump")]
        println!(
            "{:<30} {:<10} {:<12} 0x{:08X} {}",
            entry.operation.name(),
            entry.native_since.to_string(),
            entry.provision.as_str(),
            entry.native_since.hex(),
            entry.operation.cfg_name(),
        );
        #[cfg(not(feature = "dump"))]
        println!(
            "{:<30} {:<10} {}",
            entry.operation.name(),
            entry.native_since.to_string(),
            entry.provision.as_str(),
        );
    }

    println!();
    println!(
        "{} operations: {} native, {} polyfilled, {} unavailable",
        gate::Operation::ALL.len(),
        gate::Operation::ALL.len() - polyfilled - unavailable,
        polyfilled,
        unavailable
    );
}
