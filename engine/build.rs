use std::{env, fs::File, io::Write, path::Path};

fn main() {
    // write build time info
    built::write_built_file().expect("Failed to acquire build-time information");

    // the following lines allow overriding the witness search limits through env vars.
    // If the env var is set, we write its value to a file in OUT_DIR and enable a cfg.
    // `algo::contraction_hierarchy::params` then includes the file instead of using the default.
    let out_dir = env::var("OUT_DIR").unwrap();

    for (var, cfg) in [
        ("CH_SIMULATION_SEARCH_SPACE", "override_ch_simulation_search_space"),
        ("CH_CONTRACTION_SEARCH_SPACE", "override_ch_contraction_search_space"),
    ] {
        println!("cargo:rustc-check-cfg=cfg({})", cfg);
        if let Ok(val) = env::var(var) {
            let val: usize = val.trim().parse().unwrap_or_else(|_| panic!("{} has to be a positive integer", var));
            let dest_path = Path::new(&out_dir).join(var);
            let mut f = File::create(&dest_path).unwrap();
            f.write_all(val.to_string().as_bytes()).unwrap();
            println!("cargo:rustc-cfg={}", cfg);
        }
        println!("cargo:rerun-if-env-changed={}", var);
    }
}
