//! Window-backed [`Frame`] built on winit and wgpu.
//!
//! The event loop is pumped rather than run, so the slideshow stays a plain
//! blocking loop on one thread: fades and dwells pump window events while
//! they wait, and key presses queue up until the next poll.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow, bail};
use tracing::{debug, error, info, warn};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{Key, NamedKey},
    platform::pump_events::{EventLoopExtPumpEvents, PumpStatus},
    window::{Fullscreen, Window, WindowAttributes, WindowId},
};

use crate::config::{DisplayMode, FadeMode, ScreenMode};
use crate::photo::Photo;
use crate::render::gpu::Renderer;
use crate::slideshow::{Command, FadeFrame, Frame, fade_schedule};

const STARTUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Weights that show only the photo currently on screen.
const SETTLED: FadeFrame = FadeFrame {
    outgoing: 255,
    incoming: 0,
};

/// Translate a key press into a slideshow command.
///
/// Letters are matched on the character the layout produces, ignoring case.
#[must_use]
pub fn command_for_key(key: &Key) -> Command {
    let Key::Character(text) = key else {
        return Command::Quit;
    };
    match text.to_lowercase().as_str() {
        "l" => Command::Show(DisplayMode::Landscape),
        "p" => Command::Show(DisplayMode::Portrait),
        "a" => Command::Show(DisplayMode::All),
        "m" => Command::Fade(FadeMode::Merge),
        "b" => Command::Fade(FadeMode::Black),
        _ => Command::Quit,
    }
}

struct FrameApp {
    screen_mode: ScreenMode,
    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,
    weights: FadeFrame,
    pending: VecDeque<Command>,
    init_error: Option<anyhow::Error>,
    torn_down: bool,
}

impl FrameApp {
    const fn new(screen_mode: ScreenMode) -> Self {
        Self {
            screen_mode,
            window: None,
            renderer: None,
            weights: SETTLED,
            pending: VecDeque::new(),
            init_error: None,
            torn_down: false,
        }
    }

    fn window_attributes(&self, event_loop: &ActiveEventLoop) -> WindowAttributes {
        let attrs = WindowAttributes::default().with_title("Picture Frame");
        match self.screen_mode {
            ScreenMode::Full => attrs.with_fullscreen(Some(Fullscreen::Borderless(None))),
            ScreenMode::Half => {
                let monitor = event_loop
                    .primary_monitor()
                    .or_else(|| event_loop.available_monitors().next());
                match monitor {
                    Some(monitor) => {
                        let PhysicalSize { width, height } = monitor.size();
                        attrs.with_inner_size(PhysicalSize::new(
                            (width / 2).max(1),
                            (height / 2).max(1),
                        ))
                    }
                    None => attrs,
                }
            }
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = self.window_attributes(event_loop);
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create frame window")?,
        );
        window.set_cursor_visible(false);
        let renderer = Renderer::new(window.clone())?;
        let (width, height) = renderer.size();
        info!(width, height, mode = ?self.screen_mode, "detected display resolution");
        self.window = Some(window);
        self.renderer = Some(renderer);
        Ok(())
    }

    fn redraw(&mut self) {
        if let Some(renderer) = self.renderer.as_mut()
            && let Err(err) = renderer.draw(self.weights)
        {
            warn!(error = %err, "redraw failed");
        }
    }
}

impl ApplicationHandler for FrameApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.torn_down {
            return;
        }
        if let Err(err) = self.init(event_loop) {
            error!(error = ?err, "failed to initialize display");
            self.init_error = Some(err);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, _el: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(window) = &self.window else { return };
        if window.id() != window_id {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                info!("frame window close requested");
                self.pending.push_back(Command::Quit);
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed && !event.repeat {
                    let command = command_for_key(&event.logical_key);
                    debug!(key = ?event.logical_key, ?command, "key pressed");
                    self.pending.push_back(command);
                }
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.resize(width, height);
                }
                window.request_redraw();
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }
}

/// A fullscreen (or half-screen) window that shows photos.
pub struct WinitFrame {
    event_loop: EventLoop<()>,
    app: FrameApp,
    exited: bool,
}

impl WinitFrame {
    /// Create the window, hide the cursor and bring up the GPU.
    ///
    /// # Errors
    /// Returns an error if no display, window or GPU adapter is available.
    pub fn open(screen_mode: ScreenMode) -> Result<Self> {
        let event_loop = EventLoop::new().context("failed to build frame event loop")?;
        let mut frame = Self {
            event_loop,
            app: FrameApp::new(screen_mode),
            exited: false,
        };
        let started = Instant::now();
        while frame.app.renderer.is_none() {
            if !frame.pump(Some(Duration::from_millis(20))) {
                return Err(frame
                    .app
                    .init_error
                    .take()
                    .unwrap_or_else(|| anyhow!("event loop exited during startup")));
            }
            if started.elapsed() > STARTUP_TIMEOUT {
                bail!("display did not become ready within {STARTUP_TIMEOUT:?}");
            }
        }
        Ok(frame)
    }

    /// Dispatch pending window events, waiting at most `timeout` for one.
    /// Returns `false` once the event loop has exited.
    fn pump(&mut self, timeout: Option<Duration>) -> bool {
        if self.exited {
            return false;
        }
        match self.event_loop.pump_app_events(timeout, &mut self.app) {
            PumpStatus::Continue => true,
            PumpStatus::Exit(code) => {
                debug!(code, "frame event loop exited");
                self.exited = true;
                self.app.pending.push_back(Command::Quit);
                false
            }
        }
    }

    fn renderer(&mut self) -> Result<&mut Renderer> {
        self.app
            .renderer
            .as_mut()
            .context("display is not initialized")
    }
}

impl Frame for WinitFrame {
    fn size(&self) -> (u32, u32) {
        self.app
            .renderer
            .as_ref()
            .map_or((1, 1), Renderer::size)
    }

    fn present(&mut self, photo: &Photo, fade: FadeMode) -> Result<()> {
        self.renderer()?.upload_incoming(photo);
        for weights in fade_schedule(fade) {
            self.app.weights = weights;
            self.renderer()?.draw(weights)?;
            self.pump(Some(Duration::ZERO));
        }
        self.renderer()?.promote();
        self.app.weights = SETTLED;
        Ok(())
    }

    fn dwell(&mut self, duration: Duration) -> Result<()> {
        let deadline = Instant::now() + duration;
        loop {
            let now = Instant::now();
            if now >= deadline || !self.pump(Some(deadline - now)) {
                return Ok(());
            }
        }
    }

    fn poll(&mut self) -> Option<Command> {
        self.pump(Some(Duration::ZERO));
        let command = self.app.pending.pop_front();
        // Only one key is honoured per iteration; the rest are dropped.
        self.app.pending.clear();
        command
    }

    fn teardown(&mut self) {
        if self.app.torn_down {
            return;
        }
        self.app.torn_down = true;
        if let Some(window) = &self.app.window {
            window.set_cursor_visible(true);
        }
        self.app.renderer = None;
        self.app.window = None;
        self.pump(Some(Duration::ZERO));
        info!("display released");
    }
}

impl Drop for WinitFrame {
    fn drop(&mut self) {
        self.teardown();
    }
}

struct ResetApp {
    result: Option<Result<()>>,
}

impl ApplicationHandler for ResetApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.result.is_some() {
            return;
        }
        let attrs = WindowAttributes::default()
            .with_title("Picture Frame")
            .with_visible(false);
        self.result = Some(match event_loop.create_window(attrs) {
            Ok(window) => {
                window.set_cursor_visible(true);
                Ok(())
            }
            Err(err) => Err(anyhow!("failed to open display: {err}")),
        });
        event_loop.exit();
    }

    fn window_event(&mut self, _el: &ActiveEventLoop, _id: WindowId, _event: WindowEvent) {}
}

/// Connect to the display, make the cursor visible and release everything.
///
/// # Errors
/// Returns an error if the display cannot be opened.
pub fn reset_display() -> Result<()> {
    let event_loop = EventLoop::new().context("failed to build event loop")?;
    let mut app = ResetApp { result: None };
    event_loop
        .run_app(&mut app)
        .context("reset event loop failed")?;
    app.result
        .unwrap_or_else(|| Err(anyhow!("display never became available")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn char_key(c: &str) -> Key {
        Key::Character(c.into())
    }

    #[test]
    fn letter_keys_switch_modes() {
        assert_eq!(command_for_key(&char_key("l")), Command::Show(DisplayMode::Landscape));
        assert_eq!(command_for_key(&char_key("p")), Command::Show(DisplayMode::Portrait));
        assert_eq!(command_for_key(&char_key("a")), Command::Show(DisplayMode::All));
        assert_eq!(command_for_key(&char_key("m")), Command::Fade(FadeMode::Merge));
        assert_eq!(command_for_key(&char_key("b")), Command::Fade(FadeMode::Black));
    }

    #[test]
    fn shifted_letters_map_like_lowercase() {
        assert_eq!(command_for_key(&char_key("L")), Command::Show(DisplayMode::Landscape));
        assert_eq!(command_for_key(&char_key("B")), Command::Fade(FadeMode::Black));
    }

    #[test]
    fn any_other_key_quits() {
        assert_eq!(command_for_key(&Key::Named(NamedKey::Escape)), Command::Quit);
        assert_eq!(command_for_key(&Key::Named(NamedKey::Space)), Command::Quit);
        assert_eq!(command_for_key(&char_key("q")), Command::Quit);
        assert_eq!(command_for_key(&char_key("ll")), Command::Quit);
    }
}
