// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let out_dir = std::env::var("OUT_DIR")?;
    let path = std::path::Path::new(&out_dir).join("env_vars.rs");
    let mut f = std::fs::File::create(path)?;

    let vars = [
        ("SOMNA_DATA_DIR", "SOMNA_DATA_DIR"),
        ("XDG_DATA_HOME", "XDG_DATA_HOME"),
        ("SOMNA_LOG", "SOMNA_LOG"),
        ("SOMNA_OFFLINE", "SOMNA_OFFLINE"),
    ];

    for (const_name, env_name) in &vars {
        writeln!(f, "pub const {const_name}: &str = \"{env_name}\";")?;
    }

    Ok(())
}
