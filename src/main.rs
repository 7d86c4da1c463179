use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use winit::{
    dpi::{PhysicalPosition, PhysicalSize},
    event::{Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};

use stereo_cubes::RenderSession;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Render-target resolution multiplier relative to the device baseline
    #[arg(long, default_value_t = 1.0)]
    pixel_density: f32,

    /// Window title
    #[arg(long, default_value = "Stereo Cube Demo")]
    title: String,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(args.title)
            .with_position(PhysicalPosition::new(0, 0))
            .with_inner_size(PhysicalSize::new(1920, 1080))
            .build(&event_loop)?,
    );

    let mut session = RenderSession::new(window, args.pixel_density)?;

    event_loop.run(move |event, window_target| {
        // Free-run: the only pacing is the blocking present inside frame
        // submission.
        window_target.set_control_flow(ControlFlow::Poll);

        match event {
            Event::WindowEvent { window_id, event } if window_id == session.window().id() => {
                match event {
                    WindowEvent::CloseRequested => {
                        // Frames render atomically in their own event turn,
                        // so exiting here never abandons an in-flight frame.
                        window_target.exit();
                    }
                    WindowEvent::RedrawRequested => {
                        session.render_frame();
                    }
                    _ => {}
                }
            }
            Event::AboutToWait => {
                session.window().request_redraw();
            }
            _ => {}
        }
    })?;

    Ok(())
}
