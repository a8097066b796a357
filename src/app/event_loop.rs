use anyhow::Result;
use wgpu::SurfaceError;
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget};
use winit::keyboard::{KeyCode, PhysicalKey};

use super::AppState;

pub fn run_event_loop(mut app: AppState, event_loop: EventLoop<()>) -> Result<()> {
    event_loop.run(move |event, target| {
        target.set_control_flow(ControlFlow::Poll);
        handle_event(&mut app, event, target);
    })?;

    Ok(())
}

fn handle_event(app: &mut AppState, event: Event<()>, target: &EventLoopWindowTarget<()>) {
    match event {
        Event::WindowEvent { window_id, event } if window_id == app.window.id() => {
            app.process_window_event(&event);

            match event {
                WindowEvent::CloseRequested => target.exit(),
                WindowEvent::KeyboardInput {
                    event:
                        KeyEvent {
                            state: ElementState::Pressed,
                            physical_key: PhysicalKey::Code(code),
                            ..
                        },
                    ..
                } => match code {
                    KeyCode::BracketLeft => app.scale_density(0.5),
                    KeyCode::BracketRight => app.scale_density(2.0),
                    #[cfg(not(target_arch = "wasm32"))]
                    KeyCode::Escape => target.exit(),
                    _ => {}
                },
                WindowEvent::Resized(size) => app.resize(size),
                WindowEvent::RedrawRequested => {
                    app.update();
                    match app.render() {
                        Ok(()) => {}
                        Err(SurfaceError::Lost) => app.gpu.reconfigure(),
                        Err(SurfaceError::OutOfMemory) => {
                            log::error!("out of GPU memory");
                            target.exit();
                        }
                        Err(SurfaceError::Timeout | SurfaceError::Outdated) => {}
                        Err(e) => {
                            log::error!("surface error: {e}");
                        }
                    }
                }
                _ => {}
            }
        }
        Event::AboutToWait => {
            app.window.request_redraw();
        }
        _ => {}
    }
}

#[cfg(target_arch = "wasm32")]
pub fn run_event_loop_web(window: &'static winit::window::Window, event_loop: EventLoop<()>) {
    use std::cell::RefCell;
    use std::rc::Rc;
    use winit::platform::web::EventLoopExtWebSys;

    let app: Rc<RefCell<Option<AppState>>> = Rc::new(RefCell::new(None));
    let init_started = Rc::new(RefCell::new(false));

    let app_for_loop = Rc::clone(&app);
    let init_started_for_loop = Rc::clone(&init_started);

    event_loop.spawn(move |event, target| {
        target.set_control_flow(ControlFlow::Poll);

        // GPU init is async on the web; start it on the first Resumed event.
        if matches!(event, Event::Resumed) && !*init_started_for_loop.borrow() {
            *init_started_for_loop.borrow_mut() = true;
            let app_ref = Rc::clone(&app_for_loop);
            wasm_bindgen_futures::spawn_local(async move {
                match AppState::new_web(window).await {
                    Ok(state) => {
                        *app_ref.borrow_mut() = Some(state);
                        log::info!("GPU initialized");
                    }
                    Err(e) => {
                        log::error!("failed to init: {e}");
                    }
                }
            });
            return;
        }

        let mut app_borrow = app_for_loop.borrow_mut();
        let Some(app) = app_borrow.as_mut() else {
            return;
        };

        handle_event(app, event, target);
    });
}
