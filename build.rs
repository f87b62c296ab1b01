//! Selects the target runtime release and emits the gate's cfg flags
//!
//! `HOST_RUNTIME_VERSION` names the runtime release the crate is built for
//! (`3.8.10`, `3.9.0a4`, `0x030900A4`, ...). For every catalogue operation the
//! runtime already exports, a `rustc-cfg` flag is set so `compat` re-exports
//! the native symbol instead of compiling its polyfill.

#![allow(dead_code)]

#[path = "src/version.rs"]
mod version;

#[path = "src/gate.rs"]
mod gate;

use std::env;
use std::fs;
use std::path::PathBuf;

use version::RuntimeVersion;

const VERSION_ENV: &str = "HOST_RUNTIME_VERSION";
const DEFAULT_VERSION: &str = "3.8.10";

fn main() {
    println!("cargo:rerun-if-env-changed={}", VERSION_ENV);
    println!("cargo:rerun-if-changed=src/version.rs");
    println!("cargo:rerun-if-changed=src/gate.rs");

    let text = env::var(VERSION_ENV).unwrap_or_else(|_| DEFAULT_VERSION.to_string());
    let target = match RuntimeVersion::parse(&text) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("{}: {}", VERSION_ENV, e);
            std::process::exit(1);
        }
    };

    for name in gate::all_cfg_names() {
        println!("cargo:rustc-check-cfg=cfg({})", name);
    }
    for name in gate::enabled_cfg_names(target) {
        println!("cargo:rustc-cfg={}", name);
    }

    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));
    let source = format!(
        "crate::version::RuntimeVersion::new({}, {}, {}, crate::version::ReleaseLevel::{:?}, {})\n",
        target.major, target.minor, target.micro, target.level, target.serial
    );
    if let Err(e) = fs::write(out_dir.join("target_version.rs"), source) {
        eprintln!("cannot write target version: {}", e);
        std::process::exit(1);
    }
}
