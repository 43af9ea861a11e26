//! Dirty Propagation Demo
//!
//! Builds a small scene on the headless backend, animates one branch with a
//! component and prints what each frame actually costs: nodes cleaned,
//! partial uploads, programs compiled and draw calls.
//!
//! Run with `RUST_LOG=debug cargo run --example cleaning` to see the cache
//! and lifecycle logs.

use anyhow::Result;
use easel::renderer::protocol::Brush;
use easel::{Component, ComponentContext, Engine, RecordingBackend, RendererSettings};
use glam::{Vec3, Vec4};

/// Spins its node a little every update and finishes after `frames` updates.
struct Spin {
    frames: u32,
}

impl Component for Spin {
    fn update(&mut self, ctx: &mut ComponentContext<'_>) -> bool {
        if ctx.tree.rotate(ctx.node, Vec3::new(0.0, 0.0, 0.1)).is_err() {
            return true;
        }
        self.frames = self.frames.saturating_sub(1);
        self.frames == 0
    }

    fn destroy(&mut self, ctx: &mut ComponentContext<'_>) {
        log::info!("Spin on {:?} finished", ctx.node);
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = RendererSettings::from_json(r#"{ "initial_width": 64, "initial_height": 48 }"#)?;
    let mut engine = Engine::new(settings, RecordingBackend::new());
    engine.init()?;

    let root = engine.tree.root();
    let panel = engine.tree.create_child(root)?;
    let color = engine.renderer.painter(Brush::Color);
    engine
        .tree
        .entity(panel)
        .with_painter(color)
        .set_foreground_color(Vec4::new(0.2, 0.2, 0.25, 1.0))
        .set_width(40.0)
        .set_height(30.0);

    let mut icons = Vec::new();
    for i in 0..4 {
        let icon = engine.tree.create_child(panel)?;
        let painter = engine.renderer.painter(Brush::Texture);
        engine.tree.entity(icon).with_painter(painter).set_x(i as f32 * 0.25);
        icons.push(icon);
    }
    engine.tree.add_component(icons[1], Spin { frames: 3 })?;

    for frame in 0..6 {
        if frame == 4 {
            engine.tree.kill(icons[3])?;
        }
        let stats = engine.frame()?;
        println!(
            "frame {frame}: cleaned {:>2}, uploads {:>2}, compiles {}, draws {}, released {}",
            stats.clean.visited,
            stats.uploads,
            engine.backend.compile_count(),
            engine.backend.draw_count(),
            stats.released_drawers,
        );
        engine.backend.clear_calls();
    }

    let id = engine.tree.entity_id(icons[0]);
    engine.backend.write_id(10, 10, id)?;
    engine.set_pointer(Some((10, 10)));
    engine.frame()?;
    println!("hovered: {:?}", engine.renderer.hovered());

    engine.shutdown()?;
    println!(
        "after shutdown: {} buffers, {} programs",
        engine.backend.live_buffers(),
        engine.backend.live_programs()
    );
    Ok(())
}
