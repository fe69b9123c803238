//! Effect lifecycle: mount, run, and deterministic teardown.
//!
//! [`Effect::launch`] spawns a dedicated render thread that owns every
//! other component (window, GPU state, pointer tracker, frame scheduler)
//! for exactly one mount. The caller keeps only a proxy and a join handle;
//! [`Effect::stop`] (and `Drop`) send a shutdown command and join, so
//! cancellation is synchronous before any resource is released.
//!
//! Teardown ordering inside the loop: the scheduler stops first (no further
//! draw can be issued), GPU resources are disposed, then the event loop
//! exits and the window drops. Event callbacks that still fire during this
//! window hit a stopped scheduler or a disposed GPU state and are no-ops.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use anyhow::{anyhow, Result};
use crossbeam_channel::{bounded, Sender};
use winit::dpi::PhysicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoopBuilder, EventLoopProxy};
use winit::window::WindowBuilder;

use crate::gpu::GpuState;
use crate::pointer::PointerTracker;
use crate::runtime::{FrameScheduler, NOMINAL_FRAME_STEP};
use crate::types::{clamped_pixel_ratio, presentation_size, EffectConfig, EffectError};

#[derive(Debug, Clone, Copy)]
enum EffectCommand {
    Shutdown,
}

type ReadySender = Sender<Result<EventLoopProxy<EffectCommand>, EffectError>>;

/// A running mount of the metaball effect.
///
/// The value is the lifecycle: constructing it starts the effect, consuming
/// it with [`Effect::stop`] (or dropping it) tears the effect down. A
/// stopped effect is never restarted; launch a new one instead.
pub struct Effect {
    proxy: EventLoopProxy<EffectCommand>,
    join_handle: Option<JoinHandle<Result<()>>>,
}

impl Effect {
    /// Starts the effect on its own render thread and waits for the mount
    /// to complete. Mount-time failures (window, GPU surface, shader) are
    /// fatal and reported here; nothing keeps running afterwards.
    pub fn launch(config: EffectConfig) -> Result<Self, EffectError> {
        let (ready_tx, ready_rx) = bounded(1);
        let handle = thread::Builder::new()
            .name("blobfield-render".into())
            .spawn(move || run_render_thread(config, ready_tx))
            .map_err(|err| EffectError::Thread(anyhow!("failed to spawn render thread: {err}")))?;

        match ready_rx.recv() {
            Ok(Ok(proxy)) => Ok(Self {
                proxy,
                join_handle: Some(handle),
            }),
            Ok(Err(error)) => {
                let _ = handle.join();
                Err(error)
            }
            Err(_) => {
                let detail = match handle.join() {
                    Ok(Ok(())) => anyhow!("render thread exited before initialisation completed"),
                    Ok(Err(err)) => err,
                    Err(panic) => anyhow!("render thread panicked: {panic:?}"),
                };
                Err(EffectError::Thread(detail))
            }
        }
    }

    /// Stops the effect and waits for teardown to finish.
    pub fn stop(mut self) -> Result<()> {
        self.shutdown()
    }

    /// Blocks until the effect ends on its own (window closed or a fatal
    /// runtime error degraded it to absence).
    pub fn wait(mut self) -> Result<()> {
        if let Some(handle) = self.join_handle.take() {
            handle
                .join()
                .map_err(|err| anyhow!("render thread panicked: {err:?}"))??;
        }
        Ok(())
    }

    fn shutdown(&mut self) -> Result<()> {
        if let Some(handle) = self.join_handle.take() {
            let _ = self.proxy.send_event(EffectCommand::Shutdown);
            handle
                .join()
                .map_err(|err| anyhow!("render thread panicked: {err:?}"))??;
        }
        Ok(())
    }
}

impl Drop for Effect {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            tracing::warn!(error = %format!("{err:#}"), "effect teardown reported an error");
        }
    }
}

fn run_render_thread(config: EffectConfig, ready_tx: ReadySender) -> Result<()> {
    let mut builder = EventLoopBuilder::<EffectCommand>::with_user_event();
    #[cfg(target_os = "linux")]
    {
        use winit::platform::wayland::EventLoopBuilderExtWayland;
        use winit::platform::x11::EventLoopBuilderExtX11;
        EventLoopBuilderExtWayland::with_any_thread(&mut builder, true);
        EventLoopBuilderExtX11::with_any_thread(&mut builder, true);
    }
    let event_loop = match builder.build() {
        Ok(event_loop) => event_loop,
        Err(err) => {
            let wrapped = anyhow!("failed to create event loop: {err}");
            let _ = ready_tx.send(Err(EffectError::Window(anyhow!("{wrapped:#}"))));
            return Err(wrapped);
        }
    };

    let window_size = PhysicalSize::new(
        config.surface_size.0.max(1),
        config.surface_size.1.max(1),
    );
    let window = match WindowBuilder::new()
        .with_title("Blobfield")
        .with_inner_size(window_size)
        .build(&event_loop)
    {
        Ok(window) => Arc::new(window),
        Err(err) => {
            let wrapped = anyhow!("failed to create effect window: {err}");
            let _ = ready_tx.send(Err(EffectError::Window(anyhow!("{wrapped:#}"))));
            return Err(wrapped);
        }
    };

    let scale_factor = window.scale_factor();
    let initial_size = presentation_size(window.inner_size(), scale_factor);
    let mut gpu = match GpuState::new(
        window.as_ref(),
        initial_size,
        clamped_pixel_ratio(scale_factor),
        &config,
    ) {
        Ok(gpu) => gpu,
        Err(err) => {
            let _ = ready_tx.send(Err(EffectError::Gpu(anyhow!("{err:#}"))));
            return Err(err);
        }
    };

    let mut pointer = PointerTracker::new(config.lerp_factor);
    let mut scheduler = FrameScheduler::new(NOMINAL_FRAME_STEP, config.target_fps);
    scheduler.start();

    let proxy = event_loop.create_proxy();
    let _ = ready_tx.send(Ok(proxy));

    tracing::info!(
        width = initial_size.width,
        height = initial_size.height,
        fps = ?config.target_fps,
        "effect mounted"
    );
    window.request_redraw();

    let run_result = event_loop.run(move |event, elwt| {
        match event {
            Event::UserEvent(EffectCommand::Shutdown) => {
                // Halt the scheduler before touching resources so no draw
                // can land on a freed surface, then dispose while the
                // window is still alive.
                scheduler.stop();
                gpu.dispose();
                elwt.exit();
            }
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                    scheduler.stop();
                    gpu.dispose();
                    elwt.exit();
                }
                WindowEvent::CursorMoved { position, .. } => {
                    pointer.handle_cursor_moved(position, window.inner_size());
                }
                WindowEvent::CursorLeft { .. } => {
                    pointer.handle_cursor_left();
                }
                WindowEvent::Resized(new_size) => {
                    let scale_factor = window.scale_factor();
                    gpu.resize(
                        presentation_size(new_size, scale_factor),
                        clamped_pixel_ratio(scale_factor),
                    );
                }
                WindowEvent::ScaleFactorChanged {
                    mut inner_size_writer,
                    ..
                } => {
                    // Keep the current logical size; the follow-up Resized
                    // event reapplies the capped pixel ratio.
                    let _ = inner_size_writer.request_inner_size(gpu.size());
                }
                WindowEvent::RedrawRequested => {
                    let Some(sample) = scheduler.tick() else {
                        return;
                    };
                    pointer.tick();
                    match gpu.render_frame(sample, pointer.as_uniform()) {
                        Ok(()) => scheduler.mark_rendered(Instant::now()),
                        Err(wgpu::SurfaceError::Timeout) => {
                            tracing::warn!("surface timeout; retrying next frame");
                        }
                        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                            let scale_factor = window.scale_factor();
                            tracing::warn!("surface lost; reconfiguring");
                            gpu.resize(gpu.size(), clamped_pixel_ratio(scale_factor));
                        }
                        Err(err @ (wgpu::SurfaceError::OutOfMemory | wgpu::SurfaceError::Other)) => {
                            // Decorative subsystem: degrade to absence
                            // instead of taking the host down.
                            tracing::error!(error = ?err, "fatal surface error; stopping effect");
                            scheduler.stop();
                            gpu.dispose();
                            elwt.exit();
                        }
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                let now = Instant::now();
                if scheduler.ready_for_frame(now) {
                    window.request_redraw();
                    elwt.set_control_flow(ControlFlow::Wait);
                } else if let Some(deadline) = scheduler.next_deadline() {
                    elwt.set_control_flow(ControlFlow::WaitUntil(deadline));
                } else {
                    elwt.set_control_flow(ControlFlow::Wait);
                }
            }
            _ => {}
        }
    });

    run_result.map_err(|err| anyhow!("event loop error: {err}"))
}
