#![forbid(unsafe_code)]
#![doc = "Host boundary traits for the Vorple runtime."]
#![doc = ""]
#![doc = "This crate defines the boundary between the Vorple session and whatever"]
#![doc = "actually runs the story (a wasm interpreter, a JS shim, a test harness)"]
#![doc = "and whatever actually shows the output (the DOM via `vorple-web`)."]

use vorple_core::KeyCode;

/// Input half of the boundary: delivers player input to the story engine.
///
/// The runtime never talks to an interpreter directly. Lines and keys reach
/// the engine only through this trait, and only once the session has decided
/// they should (after filters, hooks, and any deferred hook results).
pub trait EngineBridge {
    /// Deliver a full line of input. The engine answers with a turn.
    fn send_line(&mut self, line: &str);

    /// Deliver a single keypress in response to a character request.
    fn send_char(&mut self, code: KeyCode);
}

/// Output half of the boundary: the windows that flushed text lands in.
///
/// Text handed to [`OutputSurface::append`] is already HTML-encoded and
/// already styled by the runtime.
pub trait OutputSurface {
    /// Whether the window exists. Output to a missing window is dropped.
    fn has_window(&self, window: usize) -> bool;

    /// Append HTML to the end of a window.
    fn append(&mut self, window: usize, html: &str);
}

/// Unified host combining the engine bridge and the output surface.
///
/// `Session` is generic over this trait. Concrete implementations:
/// - `vorple-web`: DOM-facing host with window model and transcript.
/// - [`HeadlessHost`]: in-memory host for tests and tooling.
pub trait Host {
    /// Engine implementation.
    type Engine: EngineBridge;

    /// Surface implementation.
    type Surface: OutputSurface;

    /// Access the engine bridge.
    fn engine(&mut self) -> &mut Self::Engine;

    /// Access the output surface.
    fn surface(&mut self) -> &mut Self::Surface;
}

/// One call made into a [`RecordingEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Line(String),
    Char(KeyCode),
}

/// Engine that records everything it is sent.
#[derive(Debug, Default, Clone)]
pub struct RecordingEngine {
    calls: Vec<EngineCall>,
}

impl RecordingEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call, oldest first.
    #[must_use]
    pub fn calls(&self) -> &[EngineCall] {
        &self.calls
    }

    /// Only the lines, oldest first.
    #[must_use]
    pub fn lines(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                EngineCall::Line(line) => Some(line.as_str()),
                EngineCall::Char(_) => None,
            })
            .collect()
    }

    /// Only the key codes, oldest first.
    #[must_use]
    pub fn chars(&self) -> Vec<KeyCode> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                EngineCall::Char(code) => Some(*code),
                EngineCall::Line(_) => None,
            })
            .collect()
    }

    /// Drain the recorded calls.
    pub fn take_calls(&mut self) -> Vec<EngineCall> {
        std::mem::take(&mut self.calls)
    }
}

impl EngineBridge for RecordingEngine {
    fn send_line(&mut self, line: &str) {
        self.calls.push(EngineCall::Line(line.to_owned()));
    }

    fn send_char(&mut self, code: KeyCode) {
        self.calls.push(EngineCall::Char(code));
    }
}

/// Surface holding each window's HTML in memory.
#[derive(Debug, Clone)]
pub struct MemorySurface {
    windows: Vec<String>,
}

impl Default for MemorySurface {
    /// Main window and status line.
    fn default() -> Self {
        Self::with_windows(2)
    }
}

impl MemorySurface {
    /// A surface with windows `0..count`.
    #[must_use]
    pub fn with_windows(count: usize) -> Self {
        Self {
            windows: vec![String::new(); count],
        }
    }

    /// Contents of a window, or `None` if it doesn't exist.
    #[must_use]
    pub fn window(&self, window: usize) -> Option<&str> {
        self.windows.get(window).map(String::as_str)
    }

    /// Clear a window's contents.
    pub fn clear(&mut self, window: usize) {
        if let Some(contents) = self.windows.get_mut(window) {
            contents.clear();
        }
    }
}

impl OutputSurface for MemorySurface {
    fn has_window(&self, window: usize) -> bool {
        window < self.windows.len()
    }

    fn append(&mut self, window: usize, html: &str) {
        if let Some(contents) = self.windows.get_mut(window) {
            contents.push_str(html);
        }
    }
}

/// In-memory host pairing a [`RecordingEngine`] with a [`MemorySurface`].
#[derive(Debug, Default, Clone)]
pub struct HeadlessHost {
    pub engine: RecordingEngine,
    pub surface: MemorySurface,
}

impl HeadlessHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Host for HeadlessHost {
    type Engine = RecordingEngine;
    type Surface = MemorySurface;

    fn engine(&mut self) -> &mut Self::Engine {
        &mut self.engine
    }

    fn surface(&mut self) -> &mut Self::Surface {
        &mut self.surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_engine_keeps_call_order() {
        let mut engine = RecordingEngine::new();
        engine.send_line("look");
        engine.send_char(KeyCode::SPACE);
        engine.send_line("wait");

        assert_eq!(
            engine.calls(),
            &[
                EngineCall::Line("look".into()),
                EngineCall::Char(KeyCode::SPACE),
                EngineCall::Line("wait".into()),
            ]
        );
        assert_eq!(engine.lines(), vec!["look", "wait"]);
        assert_eq!(engine.chars(), vec![KeyCode::SPACE]);
    }

    #[test]
    fn take_calls_drains() {
        let mut engine = RecordingEngine::new();
        engine.send_line("x");
        assert_eq!(engine.take_calls().len(), 1);
        assert!(engine.calls().is_empty());
    }

    #[test]
    fn memory_surface_ignores_missing_windows() {
        let mut surface = MemorySurface::with_windows(1);
        assert!(surface.has_window(0));
        assert!(!surface.has_window(1));

        surface.append(0, "a&amp;b");
        surface.append(1, "lost");
        assert_eq!(surface.window(0), Some("a&amp;b"));
        assert_eq!(surface.window(1), None);
    }

    #[test]
    fn memory_surface_clear() {
        let mut surface = MemorySurface::default();
        surface.append(1, "Score: 0");
        surface.clear(1);
        assert_eq!(surface.window(1), Some(""));
    }

    #[test]
    fn headless_host_exposes_both_halves() {
        let mut host = HeadlessHost::new();
        host.engine().send_line("north");
        host.surface().append(0, "You go north.");
        assert_eq!(host.engine.lines(), vec!["north"]);
        assert_eq!(host.surface.window(0), Some("You go north."));
    }
}
