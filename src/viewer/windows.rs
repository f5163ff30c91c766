use super::{fade_opacity, fit_rect, shortcut, ViewerEvent};
use crate::{capture::Surface, focuser, keys::Modifiers, screengrab::Image};

use custom_error::custom_error;
use glium::{
    self,
    backend::glutin::DisplayCreationError,
    glutin::{
        dpi::LogicalSize, os::windows::WindowExt, ContextBuilder, ElementState, Event, EventsLoop,
        KeyboardInput, MouseButton, VirtualKeyCode, WindowBuilder, WindowEvent,
    },
    implement_vertex,
    index::{BufferCreationError as IboCreationError, IndexBuffer, PrimitiveType},
    program,
    program::{Program, ProgramChooserCreationError},
    texture::{RawImage2d, SrgbTexture2d},
    uniform,
    vertex::{BufferCreationError as VboCreationError, VertexBuffer},
    Blend, Display, DrawError, DrawParameters, Surface as _, SwapBuffersError,
};
use std::{
    mem, thread,
    time::{Duration, Instant},
};
use winapi::shared::windef::HWND;

const TITLE: &str = "ScreenDrop";
const DOUBLE_CLICK: Duration = Duration::from_millis(500);

// custom error type
custom_error! { pub ViewerError
    DisplayCreation{source: DisplayCreationError} = "cannot create display: {source:?}",
    Swap{source: SwapBuffersError} = "cannot swap buffers: {source:?}",
    VboCreation{source: VboCreationError} = "cannot create vbo: {source:?}",
    IndexBufferCreation{source: IboCreationError} = "cannot create index buffer: {source:?}",
    ProgramCreation{source: ProgramChooserCreationError} = "cannot create program: {source:?}",
    Draw{source: DrawError} = "error when drawing: {source:?}",
}

// vertex buffer type
#[derive(Debug, Copy, Clone)]
struct Vertex {
    pos: [f32; 2],
}

implement_vertex!(Vertex, pos);

// the capture currently on display
struct Presented {
    tex: SrgbTexture2d,
    dimensions: (u32, u32),
    since: Instant,
}

pub struct Viewer {
    events_loop: EventsLoop,
    display: Display,

    vbo: VertexBuffer<Vertex>,
    index_buffer: IndexBuffer<u16>,
    program: Program,

    capture: Option<Presented>,
    events: Vec<ViewerEvent>,
    last_click: Option<Instant>,
    hidden: bool,
}

impl Viewer {
    pub fn new(top_most: bool) -> Result<Viewer, ViewerError> {
        let events_loop = EventsLoop::new();

        let display = Display::new(
            WindowBuilder::new()
                .with_title(TITLE)
                .with_always_on_top(top_most)
                .with_dimensions(LogicalSize::new(640.0, 400.0)),
            ContextBuilder::new().with_vsync(true),
            &events_loop,
        )?;

        // unit quad, placed by the vertex shader
        let vbo = VertexBuffer::new(
            &display,
            &[
                Vertex { pos: [0.0, 0.0] },
                Vertex { pos: [1.0, 0.0] },
                Vertex { pos: [0.0, 1.0] },
                Vertex { pos: [1.0, 1.0] },
            ],
        )?;

        let index_buffer =
            IndexBuffer::new(&display, PrimitiveType::TriangleStrip, &[0 as u16, 1, 2, 3])?;

        let program = program!(&display,
            140 => {
                vertex: include_str!("shaders/capture/140.vs"),
                fragment: include_str!("shaders/capture/140.fs"),
            }
        )?;

        Ok(Viewer {
            events_loop,
            display,
            vbo,
            index_buffer,
            program,
            capture: None,
            events: Vec::new(),
            last_click: None,
            hidden: false,
        })
    }

    pub fn set_title(&self, status: &str) {
        let title = format!("{} - {}", TITLE, status);
        self.display.gl_window().window().set_title(&title);
    }

    pub fn set_always_on_top(&self, top_most: bool) {
        self.display.gl_window().window().set_always_on_top(top_most);
    }

    /// Drops the displayed capture.
    pub fn clear(&mut self) {
        self.capture = None;
    }

    /// Handles pending window events and returns what the user asked for.
    pub fn pump(&mut self) -> Vec<ViewerEvent> {
        self.poll_window();
        mem::take(&mut self.events)
    }

    pub fn render(&mut self) -> Result<(), ViewerError> {
        if self.hidden {
            // nothing to present, and no vsync to pace the loop
            thread::sleep(Duration::from_millis(16));
            return Ok(());
        }

        // create a frame
        let mut frame = self.display.draw();

        // store the result of the render
        let render_result = self.draw(&mut frame);

        // finish the frame first
        frame.finish()?;

        // then we can check the result
        render_result
    }

    fn draw(&self, frame: &mut glium::Frame) -> Result<(), ViewerError> {
        frame.clear_color(0.1, 0.1, 0.1, 1.0);

        if let Some(capture) = &self.capture {
            let uniforms = uniform! {
                tex: &capture.tex,
                opacity: fade_opacity(capture.since.elapsed()),
                rect: fit_rect(capture.dimensions, frame.get_dimensions()),
            };

            let draw_params = DrawParameters {
                blend: Blend::alpha_blending(),
                ..Default::default()
            };

            frame.draw(
                &self.vbo,
                &self.index_buffer,
                &self.program,
                &uniforms,
                &draw_params,
            )?;
        }

        Ok(())
    }

    fn poll_window(&mut self) {
        let events = &mut self.events;
        let last_click = &mut self.last_click;

        self.events_loop.poll_events(|e| {
            if let Event::WindowEvent { event, .. } = e {
                match event {
                    WindowEvent::CloseRequested => events.push(ViewerEvent::CloseRequested),

                    WindowEvent::KeyboardInput {
                        input:
                            KeyboardInput {
                                state: ElementState::Pressed,
                                virtual_keycode: Some(key),
                                modifiers,
                                ..
                            },
                        ..
                    } => {
                        let modifiers = Modifiers {
                            control: modifiers.ctrl,
                            alt: modifiers.alt,
                            shift: modifiers.shift,
                        };

                        let event = key_name(key).and_then(|name| shortcut(name, modifiers));
                        events.extend(event);
                    }

                    // double click opens the capture
                    WindowEvent::MouseInput {
                        state: ElementState::Pressed,
                        button: MouseButton::Left,
                        ..
                    } => {
                        let now = Instant::now();

                        match last_click.take() {
                            Some(prev) if now.duration_since(prev) < DOUBLE_CLICK => {
                                events.push(ViewerEvent::OpenRequested)
                            }
                            _ => *last_click = Some(now),
                        }
                    }

                    _ => (),
                }
            }
        });
    }

    fn hwnd(&self) -> HWND {
        self.display.gl_window().window().get_hwnd() as HWND
    }
}

impl Surface for Viewer {
    fn hide(&mut self) {
        self.display.gl_window().window().hide();
        self.hidden = true;
    }

    fn wait_hidden(&mut self, timeout: Duration) -> bool {
        let hwnd = self.hwnd();
        let deadline = Instant::now() + timeout;

        loop {
            self.poll_window();

            if !focuser::is_visible(hwnd) {
                // let the compositor drop the last frame of the window
                focuser::wait_for_compositor();
                return true;
            }

            if Instant::now() >= deadline {
                return false;
            }

            focuser::wait_for_compositor();
        }
    }

    fn present(&mut self, image: &Image) {
        let raw = RawImage2d::from_raw_rgb(image.data.clone(), image.dimensions);

        match SrgbTexture2d::new(&self.display, raw) {
            Ok(tex) => {
                self.capture = Some(Presented {
                    tex,
                    dimensions: image.dimensions,
                    since: Instant::now(),
                })
            }
            Err(e) => tracing::error!(error = ?e, "cannot upload capture to the viewer"),
        }
    }

    // visible again, but focus stays wherever the user left it
    fn show(&mut self) {
        self.display.gl_window().window().show();
        self.hidden = false;
    }
}

// names understood by `keys::key_code`
fn key_name(key: VirtualKeyCode) -> Option<&'static str> {
    use VirtualKeyCode::*;

    let name = match key {
        A => "A",
        B => "B",
        C => "C",
        D => "D",
        E => "E",
        F => "F",
        G => "G",
        H => "H",
        I => "I",
        J => "J",
        K => "K",
        L => "L",
        M => "M",
        N => "N",
        O => "O",
        P => "P",
        Q => "Q",
        R => "R",
        S => "S",
        T => "T",
        U => "U",
        V => "V",
        W => "W",
        X => "X",
        Y => "Y",
        Z => "Z",
        Key0 => "0",
        Key1 => "1",
        Key2 => "2",
        Key3 => "3",
        Key4 => "4",
        Key5 => "5",
        Key6 => "6",
        Key7 => "7",
        Key8 => "8",
        Key9 => "9",
        F1 => "F1",
        F2 => "F2",
        F3 => "F3",
        F4 => "F4",
        F5 => "F5",
        F6 => "F6",
        F7 => "F7",
        F8 => "F8",
        F9 => "F9",
        F10 => "F10",
        F11 => "F11",
        F12 => "F12",
        Numpad0 => "NumPad0",
        Numpad1 => "NumPad1",
        Numpad2 => "NumPad2",
        Numpad3 => "NumPad3",
        Numpad4 => "NumPad4",
        Numpad5 => "NumPad5",
        Numpad6 => "NumPad6",
        Numpad7 => "NumPad7",
        Numpad8 => "NumPad8",
        Numpad9 => "NumPad9",
        Return => "Enter",
        Space => "Space",
        Snapshot => "PrintScreen",
        Pause => "Pause",
        Insert => "Insert",
        Delete => "Delete",
        Home => "Home",
        End => "End",
        PageUp => "PageUp",
        PageDown => "PageDown",
        _ => return None,
    };

    Some(name)
}
