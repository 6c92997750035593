use std::{env, fs, path::PathBuf};

// Places settings.json next to the built binary so `cargo run` finds it.
fn main() {
    println!("cargo:rerun-if-changed=settings.json");

    let Ok(out_dir) = env::var("OUT_DIR") else {
        return;
    };
    let out_dir = PathBuf::from(out_dir);
    let Some(target_dir) = out_dir.ancestors().nth(3) else {
        println!("cargo:warning=cannot locate target directory from {}", out_dir.display());
        return;
    };

    if let Err(e) = fs::copy("settings.json", target_dir.join("settings.json")) {
        println!("cargo:warning=failed to copy settings.json: {e}");
    }
}
