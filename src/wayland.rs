// Wayland integration module
// Hosts the pet, its speech bubble and right-click menu as layer-shell overlays using smithay-client-toolkit

use crate::dialog::{bubble_origin, Anchor as BubbleAnchor, BUBBLE_MAX_TEXT_WIDTH};
use crate::image_loader::Frame;
use crate::menu::{self, MenuAction, MenuEntry, MenuPage};
use crate::pet::{Pet, ShellCommand, VOLUME_STEP};
use crate::render::{self, TextRenderer};
use anyhow::{anyhow, Context, Result};
use log::{debug, error, info};
use smithay_client_toolkit::{
    compositor::{CompositorHandler, CompositorState},
    delegate_compositor, delegate_keyboard, delegate_layer, delegate_output, delegate_pointer,
    delegate_registry, delegate_seat, delegate_shm,
    output::{OutputHandler, OutputState},
    reexports::{calloop::EventLoop, calloop_wayland_source::WaylandSource},
    registry::{ProvidesRegistryState, RegistryState},
    registry_handlers,
    seat::{
        keyboard::{KeyEvent, KeyboardHandler, Keysym, Modifiers},
        pointer::{PointerEvent, PointerEventKind, PointerHandler},
        Capability, SeatHandler, SeatState,
    },
    shell::{
        wlr_layer::{
            Anchor, KeyboardInteractivity, Layer, LayerShell, LayerShellHandler, LayerSurface,
            LayerSurfaceConfigure,
        },
        WaylandSurface,
    },
    shm::{
        slot::{Buffer, SlotPool},
        Shm, ShmHandler,
    },
};
use std::sync::Arc;
use std::time::Instant;
use wayland_client::{
    globals::registry_queue_init,
    protocol::{wl_keyboard, wl_output, wl_pointer, wl_seat, wl_shm, wl_surface},
    Connection, QueueHandle,
};

/// Mouse button constants
const BTN_LEFT: u32 = 272;
const BTN_RIGHT: u32 = 273;

/// Maximum surface size to prevent buffer allocation failures
const MAX_SIZE: u32 = 4096;

/// Maximum buffer size (64MB to avoid Wayland buffer issues)
const MAX_BUFFER_SIZE: usize = 64 * 1024 * 1024;

/// One layer-shell surface and its shm buffers
struct Overlay {
    layer: LayerSurface,
    pool: Option<SlotPool>,
    buffer: Option<Buffer>,
    width: u32,
    height: u32,
    /// Top-left corner in screen coordinates (layer margins)
    position: (i32, i32),
    configured: bool,
    needs_redraw: bool,
}

impl Overlay {
    fn new(
        compositor: &CompositorState,
        layer_shell: &LayerShell,
        qh: &QueueHandle<PetShell>,
        namespace: &str,
        position: (i32, i32),
        size: (u32, u32),
        keyboard: KeyboardInteractivity,
    ) -> Self {
        let surface = compositor.create_surface(qh);
        let layer = layer_shell.create_layer_surface(qh, surface, Layer::Overlay, Some(namespace), None);

        // Anchor top-left and position through margins, ignoring panels' exclusive zones
        layer.set_anchor(Anchor::TOP | Anchor::LEFT);
        layer.set_exclusive_zone(-1);
        layer.set_margin(position.1, 0, 0, position.0);
        layer.set_size(size.0, size.1);
        layer.set_keyboard_interactivity(keyboard);

        // Commit the surface to trigger configure
        layer.commit();

        Self {
            layer,
            pool: None,
            buffer: None,
            width: size.0,
            height: size.1,
            position,
            configured: false,
            needs_redraw: true,
        }
    }

    fn owns(&self, surface: &wl_surface::WlSurface) -> bool {
        self.layer.wl_surface() == surface
    }

    /// Update window position using layer shell margins
    fn move_to(&mut self, x: i32, y: i32) {
        if self.position == (x, y) {
            return;
        }
        self.position = (x, y);
        self.layer.set_margin(y, 0, 0, x);
        self.layer.commit();
    }

    fn resize(&mut self, width: u32, height: u32) {
        let width = width.clamp(1, MAX_SIZE);
        let height = height.clamp(1, MAX_SIZE);
        if (width, height) == (self.width, self.height) {
            return;
        }
        self.width = width;
        self.height = height;
        self.layer.set_size(width, height);
        self.layer.commit();
        // Reset pool to force buffer recreation
        self.pool = None;
        self.needs_redraw = true;
    }

    fn configure(&mut self, configure: &LayerSurfaceConfigure) {
        debug!("Layer surface configured: {:?}", configure);
        if configure.new_size.0 > 0 {
            self.width = configure.new_size.0;
        }
        if configure.new_size.1 > 0 {
            self.height = configure.new_size.1;
        }
        self.configured = true;
        self.needs_redraw = true;
    }

    /// Paint a fresh shm buffer and commit it
    fn present(&mut self, shm: &Shm, paint: impl FnOnce(&mut [u8], u32, u32)) {
        if !self.configured {
            return;
        }

        let width = self.width.clamp(1, MAX_SIZE);
        let height = self.height.clamp(1, MAX_SIZE);

        // Calculate buffer size (4 bytes per pixel for ARGB)
        let stride = width as i32 * 4;
        let buffer_size = stride as usize * height as usize;
        if buffer_size > MAX_BUFFER_SIZE {
            error!("Buffer size too large: {} bytes, max: {} bytes", buffer_size, MAX_BUFFER_SIZE);
            return;
        }

        // Double-buffered
        if self.pool.is_none() {
            match SlotPool::new(buffer_size * 2, shm) {
                Ok(pool) => self.pool = Some(pool),
                Err(e) => {
                    error!("Failed to create slot pool: {}. Buffer size: {} bytes", e, buffer_size);
                    return;
                }
            }
        }
        let Some(pool) = self.pool.as_mut() else {
            return;
        };

        let (buffer, canvas) =
            match pool.create_buffer(width as i32, height as i32, stride, wl_shm::Format::Argb8888) {
                Ok(buf) => buf,
                Err(e) => {
                    error!("Failed to create buffer {}x{}: {}", width, height, e);
                    return;
                }
            };

        paint(canvas, width, height);

        let surface = self.layer.wl_surface();
        if let Err(e) = buffer.attach_to(surface) {
            error!("Failed to attach buffer: {:?}", e);
            return;
        }
        surface.damage_buffer(0, 0, width as i32, height as i32);
        surface.commit();

        self.buffer = Some(buffer);
        self.needs_redraw = false;
    }
}

struct Bubble {
    overlay: Overlay,
    text: String,
}

struct Menu {
    overlay: Overlay,
    page: MenuPage,
    entries: Vec<MenuEntry>,
    hover: Option<usize>,
}

/// Main Wayland application state
struct PetShell {
    registry_state: RegistryState,
    seat_state: SeatState,
    output_state: OutputState,
    shm: Shm,
    layer_shell: LayerShell,
    compositor_state: CompositorState,
    qh: QueueHandle<PetShell>,

    pet: Pet,
    window: Overlay,
    frame: Option<Arc<Frame>>,
    bubble: Option<Bubble>,
    menu: Option<Menu>,
    text: TextRenderer,

    // Display dimensions of the primary output
    screen: (u32, u32),
    should_exit: bool,
}

impl PetShell {
    /// Screen coordinates of a point on the pet surface
    fn to_screen(&self, local: (f64, f64)) -> (i32, i32) {
        (
            self.window.position.0 + local.0 as i32,
            self.window.position.1 + local.1 as i32,
        )
    }

    /// Carry out everything the pet asked for, then repaint what changed
    fn apply_commands(&mut self) {
        for command in self.pet.take_commands() {
            match command {
                ShellCommand::Render(frame) => {
                    self.frame = Some(frame);
                    self.window.needs_redraw = true;
                }
                ShellCommand::MoveWindow { x, y } => {
                    self.window.move_to(x, y);
                    self.follow_bubble();
                }
                ShellCommand::ShowBubble { text, anchor } => self.show_bubble(text, anchor),
                ShellCommand::HideBubble => self.bubble = None,
                ShellCommand::Resize { width, height } => {
                    self.window.resize(width, height);
                    self.follow_bubble();
                }
                ShellCommand::SetVisible(visible) => {
                    if !visible {
                        self.close_menu();
                    }
                    self.window.needs_redraw = true;
                }
                ShellCommand::Quit => self.should_exit = true,
            }
        }
        self.redraw();
    }

    fn redraw(&mut self) {
        if self.window.needs_redraw {
            let visible = self.pet.is_visible();
            let frame = self.frame.clone();
            self.window.present(&self.shm, |canvas, width, height| {
                if !visible {
                    render::render_hidden_marks(canvas, width, height);
                } else if let Some(frame) = frame.as_deref() {
                    render::blit_frame(canvas, width, height, frame);
                } else {
                    render::clear(canvas);
                }
            });
        }

        if let Some(Bubble { overlay, text: line }) = self.bubble.as_mut() {
            if overlay.needs_redraw {
                let line = line.as_str();
                let text = &mut self.text;
                overlay.present(&self.shm, |canvas, width, height| {
                    render::render_bubble(canvas, width, height, line, BUBBLE_MAX_TEXT_WIDTH, text);
                });
            }
        }

        if let Some(menu) = self.menu.as_mut() {
            if menu.overlay.needs_redraw {
                let labels: Vec<&str> = menu.entries.iter().map(|e| e.label.as_str()).collect();
                let hover = menu.hover;
                let text = &mut self.text;
                menu.overlay.present(&self.shm, |canvas, width, height| {
                    render::render_menu(canvas, width, height, &labels, hover, text);
                });
            }
        }
    }

    fn show_bubble(&mut self, line: String, anchor: BubbleAnchor) {
        let (width, height) = render::bubble_size(&mut self.text, &line, BUBBLE_MAX_TEXT_WIDTH);
        let (x, y) = bubble_origin(anchor, width, height);

        match self.bubble.as_mut() {
            Some(bubble) => {
                bubble.text = line;
                bubble.overlay.resize(width, height);
                bubble.overlay.move_to(x, y);
                bubble.overlay.needs_redraw = true;
            }
            None => {
                let overlay = Overlay::new(
                    &self.compositor_state,
                    &self.layer_shell,
                    &self.qh,
                    "rpet-bubble",
                    (x, y),
                    (width, height),
                    KeyboardInteractivity::None,
                );
                self.bubble = Some(Bubble { overlay, text: line });
            }
        }
    }

    /// Keep the bubble attached to the pet as it moves
    fn follow_bubble(&mut self) {
        let Some(bubble) = self.bubble.as_mut() else {
            return;
        };
        let anchor = BubbleAnchor {
            x: self.window.position.0,
            y: self.window.position.1,
            width: self.window.width,
            height: self.window.height,
        };
        let (x, y) = bubble_origin(anchor, bubble.overlay.width, bubble.overlay.height);
        bubble.overlay.move_to(x, y);
    }

    /// Show `page` of the menu with its top-left corner near `at`
    fn open_menu(&mut self, page: MenuPage, at: (i32, i32)) {
        let entries = menu::entries(page, &self.pet);
        let (width, height) = render::menu_size(entries.len());

        // Adjust menu position to stay on screen
        let x = at.0.min(self.screen.0 as i32 - width as i32).max(0);
        let y = at.1.min(self.screen.1 as i32 - height as i32).max(0);

        match self.menu.as_mut() {
            Some(menu) => {
                menu.page = page;
                menu.entries = entries;
                menu.hover = None;
                menu.overlay.resize(width, height);
                menu.overlay.move_to(x, y);
                menu.overlay.needs_redraw = true;
            }
            None => {
                let overlay = Overlay::new(
                    &self.compositor_state,
                    &self.layer_shell,
                    &self.qh,
                    "rpet-menu",
                    (x, y),
                    (width, height),
                    KeyboardInteractivity::None,
                );
                self.menu = Some(Menu {
                    overlay,
                    page,
                    entries,
                    hover: None,
                });
            }
        }
        debug!("Menu page {:?} opened", page);
    }

    fn close_menu(&mut self) {
        if self.menu.take().is_some() {
            debug!("Menu closed");
        }
    }

    /// Handle menu item selection
    fn activate_menu_item(&mut self, index: usize) {
        let Some(menu) = self.menu.as_ref() else {
            return;
        };
        let Some(entry) = menu.entries.get(index).cloned() else {
            return;
        };
        let position = menu.overlay.position;

        info!("Menu {:?}: {} selected", menu.page, entry.label);
        match entry.action {
            MenuAction::Open(page) => self.open_menu(page, position),
            action => {
                self.close_menu();
                self.pet.apply_menu_action(&action, Instant::now());
            }
        }
    }

    fn update_screen_size(&mut self) {
        let (width, height) = get_display_dimensions(&self.output_state);
        if (width, height) != self.screen {
            info!("Display dimensions: {}x{}", width, height);
            self.screen = (width, height);
            self.pet.set_screen_width(width);
        }
    }

    fn quit(&mut self) {
        self.pet.quit();
        self.apply_commands();
    }
}

// Implement required traits for smithay-client-toolkit

impl CompositorHandler for PetShell {
    fn scale_factor_changed(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _new_factor: i32,
    ) {
        debug!("Scale factor changed");
    }

    fn transform_changed(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _new_transform: wl_output::Transform,
    ) {
        debug!("Transform changed");
    }

    fn frame(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _time: u32,
    ) {
        self.redraw();
    }

    fn surface_enter(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _output: &wl_output::WlOutput,
    ) {
    }

    fn surface_leave(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _output: &wl_output::WlOutput,
    ) {
    }
}

impl OutputHandler for PetShell {
    fn output_state(&mut self) -> &mut OutputState {
        &mut self.output_state
    }

    fn new_output(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _output: wl_output::WlOutput,
    ) {
        debug!("New output detected");
        self.update_screen_size();
    }

    fn update_output(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _output: wl_output::WlOutput,
    ) {
        debug!("Output updated");
        self.update_screen_size();
    }

    fn output_destroyed(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _output: wl_output::WlOutput,
    ) {
        debug!("Output destroyed");
    }
}

impl LayerShellHandler for PetShell {
    fn closed(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, layer: &LayerSurface) {
        let surface = layer.wl_surface();
        if self.window.owns(surface) {
            info!("Layer surface closed");
            self.quit();
            self.should_exit = true;
        } else if self.bubble.as_ref().is_some_and(|b| b.overlay.owns(surface)) {
            self.bubble = None;
        } else if self.menu.as_ref().is_some_and(|m| m.overlay.owns(surface)) {
            self.menu = None;
        }
    }

    fn configure(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        layer: &LayerSurface,
        configure: LayerSurfaceConfigure,
        _serial: u32,
    ) {
        let surface = layer.wl_surface();
        if self.window.owns(surface) {
            self.window.configure(&configure);
        } else if let Some(bubble) = self.bubble.as_mut().filter(|b| b.overlay.owns(surface)) {
            bubble.overlay.configure(&configure);
        } else if let Some(menu) = self.menu.as_mut().filter(|m| m.overlay.owns(surface)) {
            menu.overlay.configure(&configure);
        }

        // Draw initial frame
        self.redraw();
    }
}

impl SeatHandler for PetShell {
    fn seat_state(&mut self) -> &mut SeatState {
        &mut self.seat_state
    }

    fn new_seat(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _seat: wl_seat::WlSeat) {
        debug!("New seat");
    }

    fn new_capability(
        &mut self,
        _conn: &Connection,
        qh: &QueueHandle<Self>,
        seat: wl_seat::WlSeat,
        capability: Capability,
    ) {
        debug!("New capability: {:?}", capability);

        if capability == Capability::Keyboard {
            if let Err(e) = self.seat_state.get_keyboard(qh, &seat, None) {
                error!("Failed to get keyboard: {}", e);
            }
        }
        if capability == Capability::Pointer {
            if let Err(e) = self.seat_state.get_pointer(qh, &seat) {
                error!("Failed to get pointer: {}", e);
            }
        }
    }

    fn remove_capability(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _seat: wl_seat::WlSeat,
        _capability: Capability,
    ) {
        debug!("Capability removed");
    }

    fn remove_seat(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _seat: wl_seat::WlSeat) {
        debug!("Seat removed");
    }
}

impl KeyboardHandler for PetShell {
    fn enter(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _keyboard: &wl_keyboard::WlKeyboard,
        _surface: &wl_surface::WlSurface,
        _serial: u32,
        _raw: &[u32],
        _keysyms: &[Keysym],
    ) {
        debug!("Keyboard entered surface");
    }

    fn leave(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _keyboard: &wl_keyboard::WlKeyboard,
        _surface: &wl_surface::WlSurface,
        _serial: u32,
    ) {
        debug!("Keyboard left surface");
    }

    fn press_key(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _keyboard: &wl_keyboard::WlKeyboard,
        _serial: u32,
        event: KeyEvent,
    ) {
        debug!("Key pressed: {:?}", event.keysym);

        // Escape closes an open menu first
        if event.keysym == Keysym::Escape && self.menu.is_some() {
            self.close_menu();
        } else if event.keysym == Keysym::Escape || event.keysym == Keysym::q {
            info!("Exit key pressed");
            self.quit();
        }
    }

    fn release_key(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _keyboard: &wl_keyboard::WlKeyboard,
        _serial: u32,
        _event: KeyEvent,
    ) {
    }

    fn update_modifiers(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _keyboard: &wl_keyboard::WlKeyboard,
        _serial: u32,
        _modifiers: Modifiers,
        _layout: u32,
    ) {
    }
}

impl PointerHandler for PetShell {
    fn pointer_frame(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _pointer: &wl_pointer::WlPointer,
        events: &[PointerEvent],
    ) {
        for event in events {
            let now = Instant::now();
            let on_pet = self.window.owns(&event.surface);
            let on_menu = self
                .menu
                .as_ref()
                .is_some_and(|m| m.overlay.owns(&event.surface));

            match event.kind {
                PointerEventKind::Enter { .. } => {
                    debug!("Pointer entered");
                }
                PointerEventKind::Leave { .. } => {
                    debug!("Pointer left");
                    if on_pet {
                        self.pet.pointer_cancel();
                    } else if let Some(menu) = self.menu.as_mut().filter(|_| on_menu) {
                        menu.hover = None;
                        menu.overlay.needs_redraw = true;
                    }
                }
                PointerEventKind::Motion { .. } => {
                    if on_pet {
                        let (x, y) = self.to_screen(event.position);
                        self.pet.pointer_motion(x, y, now);
                    } else if let Some(menu) = self.menu.as_mut().filter(|_| on_menu) {
                        // Update menu hover state
                        let hover = render::menu_item_at(event.position.1, menu.entries.len());
                        if hover != menu.hover {
                            menu.hover = hover;
                            menu.overlay.needs_redraw = true;
                        }
                    }
                }
                PointerEventKind::Press { button, .. } => {
                    debug!("Pointer button pressed: {}", button);

                    if on_menu {
                        let count = self.menu.as_ref().map_or(0, |m| m.entries.len());
                        if button == BTN_LEFT {
                            if let Some(index) = render::menu_item_at(event.position.1, count) {
                                self.activate_menu_item(index);
                            }
                        }
                    } else if on_pet {
                        let (x, y) = self.to_screen(event.position);
                        if button == BTN_LEFT {
                            // Close menu if clicking outside
                            self.close_menu();
                            self.pet.pointer_press(x, y, now);
                        } else if button == BTN_RIGHT {
                            self.open_menu(MenuPage::Main, (x, y));
                        }
                    }
                }
                PointerEventKind::Release { button, .. } => {
                    if button == BTN_LEFT && on_pet {
                        self.pet.pointer_release(now);
                    }
                }
                PointerEventKind::Axis { vertical, .. } => {
                    // Scroll wheel to adjust volume
                    if on_pet && vertical.absolute != 0.0 {
                        let delta = if vertical.absolute > 0.0 {
                            -VOLUME_STEP
                        } else {
                            VOLUME_STEP
                        };
                        self.pet.adjust_volume(delta);
                    }
                }
            }
        }

        self.apply_commands();
    }
}

impl ShmHandler for PetShell {
    fn shm_state(&mut self) -> &mut Shm {
        &mut self.shm
    }
}

impl ProvidesRegistryState for PetShell {
    fn registry(&mut self) -> &mut RegistryState {
        &mut self.registry_state
    }

    registry_handlers![OutputState, SeatState];
}

// Delegate macros
delegate_compositor!(PetShell);
delegate_output!(PetShell);
delegate_layer!(PetShell);
delegate_seat!(PetShell);
delegate_keyboard!(PetShell);
delegate_pointer!(PetShell);
delegate_shm!(PetShell);
delegate_registry!(PetShell);

/// Run the pet until it quits or the compositor closes its surface
pub fn run(pet: Pet) -> Result<()> {
    info!("Connecting to Wayland display");

    // Connect to Wayland display
    let conn = Connection::connect_to_env().context("Failed to connect to Wayland display")?;

    // Initialize registry and event queue
    let (globals, mut event_queue) =
        registry_queue_init(&conn).context("Failed to initialize registry")?;
    let qh = event_queue.handle();

    // Initialize required globals
    let compositor_state =
        CompositorState::bind(&globals, &qh).context("Failed to bind compositor")?;
    let layer_shell = LayerShell::bind(&globals, &qh).context("Failed to bind layer shell")?;
    let shm = Shm::bind(&globals, &qh).context("Failed to bind shm")?;

    // Create the pet surface at its saved position
    let window = Overlay::new(
        &compositor_state,
        &layer_shell,
        &qh,
        "rpet",
        pet.position(),
        pet.size(),
        KeyboardInteractivity::OnDemand,
    );

    info!("Loading fonts");
    let text = TextRenderer::new();

    let mut app = PetShell {
        registry_state: RegistryState::new(&globals),
        seat_state: SeatState::new(&globals, &qh),
        output_state: OutputState::new(&globals, &qh),
        shm,
        layer_shell,
        compositor_state,
        qh: qh.clone(),
        pet,
        window,
        frame: None,
        bubble: None,
        menu: None,
        text,
        screen: (0, 0),
        should_exit: false,
    };

    // Dispatch once to get output info
    event_queue.roundtrip(&mut app)?;
    app.update_screen_size();

    app.pet.start(Instant::now());
    app.apply_commands();

    let mut event_loop: EventLoop<PetShell> =
        EventLoop::try_new().context("Failed to create event loop")?;
    WaylandSource::new(conn, event_queue)
        .insert(event_loop.handle())
        .map_err(|e| anyhow!("Failed to insert Wayland source: {}", e.error))?;

    info!("Starting event loop");
    info!("Controls: Drag to move, Click to play, Right-click for menu, Scroll to adjust volume");

    // Sleep until the next pet timer or Wayland event
    while !app.should_exit {
        let timeout = app
            .pet
            .next_deadline()
            .map(|deadline| deadline.saturating_duration_since(Instant::now()));
        event_loop
            .dispatch(timeout, &mut app)
            .context("Event loop dispatch failed")?;

        app.pet.run_due_timers(Instant::now());
        app.apply_commands();
    }

    info!("Exiting application");
    Ok(())
}

/// Get display dimensions from the output state
fn get_display_dimensions(output_state: &OutputState) -> (u32, u32) {
    for output in output_state.outputs() {
        if let Some(info) = output_state.info(&output) {
            if let Some(size) = info.logical_size {
                return (size.0 as u32, size.1 as u32);
            }
            if let Some(mode) = info.modes.iter().find(|m| m.current) {
                return (mode.dimensions.0 as u32, mode.dimensions.1 as u32);
            }
            if let Some(mode) = info.modes.first() {
                return (mode.dimensions.0 as u32, mode.dimensions.1 as u32);
            }
        }
    }
    (1920, 1080)
}
