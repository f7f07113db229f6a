//! Interactive showroom viewer.
//!
//! Usage:
//!   showroom_3d [manifest.json]
//!   showroom_3d [manifest.json] --snapshots [output_dir]
//!
//! Without arguments the viewer loads `assets/showroom.json`, falling
//! back to the built-in demo layout when that file is absent. The
//! `--snapshots` flag renders a sequence of daylight stills instead of
//! running interactively.

use showroom_core::{DaylightSnapshots, ShowroomApp};

fn main() {
    let mut manifest_path = String::from("assets/showroom.json");
    let mut snapshot_dir: Option<String> = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--snapshots" {
            snapshot_dir = Some(
                args.next()
                    .unwrap_or_else(|| String::from("snapshots/daylight")),
            );
        } else {
            manifest_path = arg;
        }
    }

    let mut app = ShowroomApp::new("Showroom").with_manifest_file(manifest_path);
    if let Some(dir) = snapshot_dir {
        app = app
            .with_simulated_clock(12.0, 0.0)
            .with_snapshots(DaylightSnapshots::key_hours(dir));
    }
    app.run();
}
