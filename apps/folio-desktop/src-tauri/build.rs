use std::env;
use std::error::Error;
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

fn main() {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());

    ensure_icon(&manifest_dir).expect("failed to prepare app icon");
    note_unstaged_worker(&manifest_dir);

    tauri_build::try_build(
        tauri_build::Attributes::new().plugin(
            "folio",
            tauri_build::InlinedPlugin::new()
                .commands(&["open_plot_window", "open_rebalance_window"])
                .default_permission(tauri_build::DefaultPermissionRule::AllowAllCommands),
        ),
    )
    .expect("failed to run tauri-build");
}

fn ensure_icon(manifest_dir: &Path) -> Result<(), Box<dyn Error>> {
    let icon_png = manifest_dir.join("icons").join("icon.png");
    if icon_png.exists() {
        return Ok(());
    }
    fs::create_dir_all(icon_png.parent().unwrap())?;
    let file = fs::File::create(&icon_png)?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), 1, 1);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&[255, 255, 255, 255])?;
    Ok(())
}

// Bundling needs the portable R tree and the worker sources staged next to
// this manifest; plain builds do not.
fn note_unstaged_worker(manifest_dir: &Path) {
    for dir in ["R-Portable", "app"] {
        if !manifest_dir.join(dir).exists() {
            eprintln!("note: {dir}/ not staged; place it next to Cargo.toml before bundling");
        }
    }
}
