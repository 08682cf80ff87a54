/// Example: Load a model and print a few animation frames
///
/// Usage: cargo run --example load_model -- path/to/model.glb [--orbit]
use nalgebra::Point3;
use orbview_core::{loader, PointerOffset, Viewer, ViewerConfig};
use std::env;

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    let Some(path) = args.get(1) else {
        anyhow::bail!("Usage: {} <model-file> [--orbit]", args[0]);
    };

    let mesh = loader::load_model(path)?;
    println!("Loaded {} triangles", mesh.triangle_count());
    if let Some(bounds) = mesh.bounds() {
        let c = bounds.center();
        let e = bounds.extent();
        println!("Center ({:.3}, {:.3}, {:.3})", c.x, c.y, c.z);
        println!("Extent ({:.3}, {:.3}, {:.3})", e.x, e.y, e.z);
    }

    let mut config = ViewerConfig::new(path.as_str());
    config.enable_orbiting_sphere = args.iter().any(|a| a == "--orbit");
    let mut viewer = Viewer::new(config, mesh);
    viewer.set_pointer(PointerOffset::new(0.5, -0.25));

    for step in 0..5 {
        let elapsed = step as f32 * 0.25;
        let frame = viewer.frame(elapsed);
        let p = frame.object.position;
        let r = frame.object.rotation;
        print!(
            "t={:.2} position=({:.3}, {:.3}, {:.3}) pitch={:.4} yaw={:.4}",
            elapsed, p.x, p.y, p.z, r.pitch, r.yaw
        );
        if let Some(satellite) = &frame.satellite {
            let s: Point3<f32> = satellite.position;
            print!(" satellite=({:.3}, {:.3}, {:.3})", s.x, s.y, s.z);
        }
        println!();
    }

    viewer.teardown();
    Ok(())
}
