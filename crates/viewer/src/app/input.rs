use compositor::Vec2;
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta};
use winit::keyboard::{KeyCode, PhysicalKey};

use super::demo_world::MoveIntent;

/// Press edge for a key or button: fires once per press, not while held.
#[derive(Debug, Default, Clone, Copy)]
struct EdgeKey {
    is_down: bool,
    pressed_edge: bool,
}

impl EdgeKey {
    fn handle(&mut self, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if !self.is_down {
                    self.pressed_edge = true;
                }
                self.is_down = true;
            }
            ElementState::Released => self.is_down = false,
        }
    }

    fn take(&mut self) -> bool {
        let was_pressed = self.pressed_edge;
        self.pressed_edge = false;
        was_pressed
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct HeldKeys {
    up: bool,
    down: bool,
    left: bool,
    right: bool,
    run: bool,
}

/// One-shot requests gathered since the previous frame.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FrameActions {
    pub(crate) toggle_statics: bool,
    pub(crate) toggle_asset_tiles: bool,
    pub(crate) screenshot: bool,
    pub(crate) select: bool,
    pub(crate) zoom_steps: i32,
}

#[derive(Debug, Default)]
pub(crate) struct InputCollector {
    quit_requested: bool,
    held: HeldKeys,
    statics_toggle: EdgeKey,
    asset_tiles_toggle: EdgeKey,
    screenshot: EdgeKey,
    zoom_in: EdgeKey,
    zoom_out: EdgeKey,
    left_mouse: EdgeKey,
    pending_zoom_steps: i32,
    cursor_position_px: Option<Vec2>,
}

impl InputCollector {
    pub(crate) fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub(crate) fn mark_quit_requested(&mut self) {
        self.quit_requested = true;
    }

    pub(crate) fn cursor_position_px(&self) -> Option<Vec2> {
        self.cursor_position_px
    }

    pub(crate) fn handle_keyboard_input(&mut self, key_event: &KeyEvent) {
        self.handle_physical_key(key_event.physical_key, key_event.state);
    }

    fn handle_physical_key(&mut self, key: PhysicalKey, state: ElementState) {
        let is_pressed = state == ElementState::Pressed;
        let PhysicalKey::Code(code) = key else {
            return;
        };
        match code {
            KeyCode::KeyW | KeyCode::ArrowUp => self.held.up = is_pressed,
            KeyCode::KeyS | KeyCode::ArrowDown => self.held.down = is_pressed,
            KeyCode::KeyA | KeyCode::ArrowLeft => self.held.left = is_pressed,
            KeyCode::KeyD | KeyCode::ArrowRight => self.held.right = is_pressed,
            KeyCode::ShiftLeft | KeyCode::ShiftRight => self.held.run = is_pressed,
            KeyCode::F1 => self.statics_toggle.handle(state),
            KeyCode::F2 => self.asset_tiles_toggle.handle(state),
            KeyCode::F12 => self.screenshot.handle(state),
            KeyCode::Equal | KeyCode::NumpadAdd => {
                self.zoom_in.handle(state);
                if self.zoom_in.take() {
                    self.pending_zoom_steps = self.pending_zoom_steps.saturating_add(1);
                }
            }
            KeyCode::Minus | KeyCode::NumpadSubtract => {
                self.zoom_out.handle(state);
                if self.zoom_out.take() {
                    self.pending_zoom_steps = self.pending_zoom_steps.saturating_sub(1);
                }
            }
            KeyCode::Escape => {
                if is_pressed {
                    self.mark_quit_requested();
                }
            }
            _ => {}
        }
    }

    pub(crate) fn set_cursor_position_px(&mut self, x: f32, y: f32) {
        self.cursor_position_px = Some(Vec2::new(x, y));
    }

    pub(crate) fn clear_cursor_position(&mut self) {
        self.cursor_position_px = None;
    }

    pub(crate) fn handle_mouse_wheel(&mut self, delta: MouseScrollDelta) {
        let steps = zoom_steps_from_scroll_delta(delta);
        self.pending_zoom_steps = self.pending_zoom_steps.saturating_add(steps);
    }

    pub(crate) fn handle_mouse_input(&mut self, button: MouseButton, state: ElementState) {
        if button == MouseButton::Left {
            self.left_mouse.handle(state);
        }
    }

    /// Held movement keys as a screen-space step request.
    pub(crate) fn move_intent(&self) -> MoveIntent {
        let axis = |negative: bool, positive: bool| positive as i32 - negative as i32;
        MoveIntent {
            screen_x: axis(self.held.left, self.held.right),
            screen_y: axis(self.held.up, self.held.down),
            run: self.held.run,
        }
    }

    pub(crate) fn take_frame_actions(&mut self) -> FrameActions {
        let actions = FrameActions {
            toggle_statics: self.statics_toggle.take(),
            toggle_asset_tiles: self.asset_tiles_toggle.take(),
            screenshot: self.screenshot.take(),
            select: self.left_mouse.take(),
            zoom_steps: self.pending_zoom_steps,
        };
        self.pending_zoom_steps = 0;
        actions
    }
}

fn zoom_steps_from_scroll_delta(delta: MouseScrollDelta) -> i32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => y.round() as i32,
        MouseScrollDelta::PixelDelta(position) => {
            if position.y > 0.0 {
                1
            } else if position.y < 0.0 {
                -1
            } else {
                0
            }
        }
    }
}
