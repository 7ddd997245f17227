use std::{env, fs::File, io::Write, path::Path};

fn main() {
    // write build time info
    built::write_built_file().expect("Failed to acquire build-time information");

    println!("cargo:rustc-check-cfg=cfg(override_ch_witness_settle_limit)");

    // Preprocessing params can be overridden through env vars.
    // If the env var is set, we write its value to a file in OUT_DIR and enable a cfg flag.
    // The module using the param then includes that file instead of its default.
    let out_dir = env::var("OUT_DIR").unwrap();

    if let Ok(val) = env::var("CH_WITNESS_SETTLE_LIMIT") {
        let dest_path = Path::new(&out_dir).join("CH_WITNESS_SETTLE_LIMIT");
        let mut f = File::create(&dest_path).unwrap();
        f.write_all(val.trim().as_bytes()).unwrap();
        println!("cargo:rustc-cfg=override_ch_witness_settle_limit");
    }
    println!("cargo:rerun-if-env-changed=CH_WITNESS_SETTLE_LIMIT");
}
