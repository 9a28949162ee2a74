//! Sectors Component
//!
//! Owns the basemap binding, the overlay pipeline and the four controllers
//! and runs them on one cooperative event loop. Inputs are basemap events,
//! host commands, store feeds, the teardown signal and the two debounce
//! deadlines. Everything the component wants from the store goes out as
//! [`MapAction`]s on the action bus.

use sectormap_core::{
    ActionBus, AreaGeometry, Error, LatLngBounds, MapAction, Result, StoreError, StoreFeeds,
    Technology, ThreadSafe,
};
use sectormap_overlay::{OverlayPipeline, RenderBackend, Scene, SceneInput};
use sectormap_settings::{MapConfig, ViewportPersistence};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use crate::basemap::Basemap;
use crate::commands::MapCommand;
use crate::draw_tool::{add_layer_action, DrawMode, DrawTool};
use crate::events::{DrawEvent, MapEvent};
use crate::popup::PopupController;
use crate::viewport_sync::ViewportSync;

/// Capacity of the host command channel.
const COMMAND_CHANNEL_CAPACITY: usize = 32;

#[derive(Debug)]
struct ComponentState {
    /// True until the overlay has drawn once; the scene feeds are only
    /// read after that.
    first_draw: bool,
    technologies: Vec<Technology>,
}

/// The map-side orchestrator.
pub struct SectorsComponent<M: Basemap, B: RenderBackend> {
    config: MapConfig,
    map: M,
    pipeline: OverlayPipeline<B>,
    viewport_sync: ViewportSync,
    draw_tool: DrawTool,
    popup: PopupController,
    bus: Arc<ActionBus>,
    feeds: StoreFeeds,
    state: ComponentState,
}

impl<M: Basemap, B: RenderBackend> SectorsComponent<M, B> {
    /// Wires a component. Nothing happens until [`SectorsComponent::init`]
    /// or [`SectorsComponent::run`].
    pub fn new(
        config: MapConfig,
        map: M,
        backend: B,
        persistence: ViewportPersistence,
        feeds: StoreFeeds,
        bus: Arc<ActionBus>,
    ) -> Self {
        let interaction = &config.interaction;
        let persistence = persistence.with_max_zoom(config.tiles.max_zoom);
        let viewport_sync = ViewportSync::new(persistence, interaction.min_query_zoom);
        let draw_tool = DrawTool::new(interaction.draw_debounce());
        let popup = PopupController::new(
            config.popup.clone(),
            interaction.popup_noise_m,
            interaction.hover_debounce(),
        );
        let pipeline = OverlayPipeline::new(config.overlay.clone(), backend);
        let technologies = feeds.technologies_snapshot();

        Self {
            config,
            map,
            pipeline,
            viewport_sync,
            draw_tool,
            popup,
            bus,
            feeds,
            state: ComponentState {
                first_draw: true,
                technologies,
            },
        }
    }

    /// Shared overlay scene.
    pub fn scene(&self) -> ThreadSafe<Scene> {
        self.pipeline.scene()
    }

    /// Current draw mode.
    pub fn draw_mode(&self) -> DrawMode {
        self.draw_tool.mode()
    }

    /// Basemap binding.
    pub fn map(&self) -> &M {
        &self.map
    }

    /// Overlay pipeline.
    pub fn pipeline(&self) -> &OverlayPipeline<B> {
        &self.pipeline
    }

    /// Restores the view, selects the tile source, builds the overlay and
    /// sends the initial query. Overlay failures are fatal.
    pub fn init(&mut self) -> Result<()> {
        self.viewport_sync.restore(&mut self.map);
        self.state.technologies = self.feeds.technologies.borrow_and_update().clone();
        self.apply_tile_source();

        self.pipeline.initialize(&self.map.viewport())?;
        self.on_overlay_ready()?;

        let viewport = self.map.viewport();
        if let Some(action) = self
            .viewport_sync
            .initial_query(&viewport, &self.state.technologies)
        {
            self.dispatch(action);
        }
        Ok(())
    }

    /// Runs until shutdown, then tears down.
    ///
    /// A store feed closing underneath the component ends the loop with
    /// [`StoreError::FeedClosed`] after teardown.
    pub async fn run(
        mut self,
        mut events: mpsc::UnboundedReceiver<MapEvent>,
        mut commands: mpsc::Receiver<MapCommand>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        let result = match self.init() {
            Ok(()) => {
                self.event_loop(&mut events, &mut commands, &mut shutdown)
                    .await
            }
            Err(e) => Err(e),
        };
        self.teardown();
        result
    }

    /// Spawns [`SectorsComponent::run`] on the current runtime.
    pub fn spawn(self, events: mpsc::UnboundedReceiver<MapEvent>) -> ComponentHandle
    where
        M: 'static,
        B: 'static,
    {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(events, command_rx, shutdown_rx));
        ComponentHandle {
            commands: command_tx,
            shutdown: shutdown_tx,
            task,
        }
    }

    async fn event_loop(
        &mut self,
        events: &mut mpsc::UnboundedReceiver<MapEvent>,
        commands: &mut mpsc::Receiver<MapCommand>,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<()> {
        let mut commands_open = true;

        loop {
            let subscribed = !self.state.first_draw;
            let draw_deadline = self.draw_tool.idle_deadline();
            let hover_deadline = self.popup.hover_deadline();

            tokio::select! {
                _ = shutdown.changed() => {
                    tracing::debug!("Sectors component shutdown requested");
                    return Ok(());
                }
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event, Instant::now())?,
                    None => {
                        tracing::debug!("Map event source closed");
                        return Ok(());
                    }
                },
                command = commands.recv(), if commands_open => match command {
                    Some(command) => self.handle_command(command),
                    None => commands_open = false,
                },
                changed = self.feeds.sectors.changed(), if subscribed => {
                    feed_alive(changed, "sectors")?;
                    self.redraw_scene();
                }
                changed = self.feeds.selected.changed(), if subscribed => {
                    feed_alive(changed, "selected")?;
                    self.redraw_scene();
                }
                changed = self.feeds.searched.changed(), if subscribed => {
                    feed_alive(changed, "searched")?;
                    self.redraw_scene();
                }
                changed = self.feeds.technologies.changed() => {
                    feed_alive(changed, "technologies")?;
                    self.on_technologies_changed();
                }
                changed = self.feeds.offline_mode.changed() => {
                    feed_alive(changed, "offline_mode")?;
                    self.apply_tile_source();
                }
                changed = self.feeds.sector_info.changed() => {
                    feed_alive(changed, "sector_info")?;
                    self.on_sector_info();
                }
                _ = sleep_until(draw_deadline.unwrap_or_else(Instant::now)), if draw_deadline.is_some() => {
                    if self.draw_tool.poll(Instant::now()) {
                        tracing::debug!("Draw mode idle");
                    }
                }
                _ = sleep_until(hover_deadline.unwrap_or_else(Instant::now)), if hover_deadline.is_some() => {
                    self.fire_hover(Instant::now());
                }
            }
        }
    }

    /// Handles one basemap event. Only a failed overlay rebuild is an error.
    pub fn handle_event(&mut self, event: MapEvent, now: Instant) -> Result<()> {
        tracing::trace!("Map event: {}", event.name());
        match event {
            MapEvent::MoveEnd => {
                let viewport = self.map.viewport();
                self.sync_overlay_viewport();
                if let Some(action) = self
                    .viewport_sync
                    .on_move_settled(&viewport, &self.state.technologies)
                {
                    self.dispatch(action);
                }
            }
            MapEvent::ZoomEnd => {
                let viewport = self.map.viewport();
                self.sync_overlay_viewport();
                if let Some(action) = self
                    .viewport_sync
                    .on_zoom_settled(&viewport, &self.state.technologies)
                {
                    self.dispatch(action);
                }
            }
            MapEvent::Click(point) => {
                if let Some(action) = self.popup.on_click(
                    point,
                    self.draw_tool.is_drawing(),
                    &self.state.technologies,
                ) {
                    self.dispatch(action);
                }
            }
            MapEvent::PointerMove(point) => self.popup.on_pointer_move(point, now),
            MapEvent::Draw(draw) => self.handle_draw(draw, now),
            MapEvent::Resized { width, height } => {
                self.map.set_size(width, height);
                self.pipeline.initialize(&self.map.viewport())?;
                self.on_overlay_ready()?;
            }
        }
        Ok(())
    }

    /// Handles one host command.
    pub fn handle_command(&mut self, command: MapCommand) {
        tracing::debug!("Map command: {}", command.name());
        let fit_max_zoom = self.config.interaction.fit_max_zoom;
        match command {
            MapCommand::DrawAreas(areas) => self.draw_areas(areas),
            MapCommand::RemoveAreas(ids) => {
                for id in ids {
                    if !self.map.remove_area_layer(id) {
                        tracing::debug!("Area layer {} not on the map", id);
                    }
                }
            }
            MapCommand::FitSector(position) => {
                let zoom = self.config.interaction.focus_zoom;
                self.map.set_view(position, zoom);
            }
            MapCommand::FitSearchedSectors(sectors) => {
                match LatLngBounds::from_points(sectors.iter().map(|s| s.position())) {
                    Some(bounds) => self.map.fit_bounds(&bounds, fit_max_zoom),
                    None => tracing::debug!("No searched sectors to fit"),
                }
            }
            MapCommand::FitBounds(bounds) => self.map.fit_bounds(&bounds, fit_max_zoom),
        }
    }

    fn handle_draw(&mut self, event: DrawEvent, now: Instant) {
        match event {
            DrawEvent::Started(interaction) => self.draw_tool.start(interaction),
            DrawEvent::Stopped(interaction) => self.draw_tool.stop(interaction, now),
            DrawEvent::Created { id, geometry } => {
                match self.draw_tool.created(id, &geometry, &self.state.technologies) {
                    Ok((id, geometry, action)) => {
                        self.map.add_area_layer(id, &geometry);
                        self.dispatch(action);
                    }
                    Err(e) => tracing::warn!("Drawn {} ignored: {}", geometry.kind(), e),
                }
            }
            DrawEvent::Edited(layers) => {
                match self.draw_tool.edited(&layers, &self.state.technologies) {
                    Ok((normalized, actions)) => {
                        for (id, geometry) in &normalized {
                            self.map.add_area_layer(*id, geometry);
                        }
                        actions.into_iter().for_each(|a| self.dispatch(a));
                    }
                    Err(e) => tracing::warn!("Edit of {} layers ignored: {}", layers.len(), e),
                }
            }
            DrawEvent::Deleted(ids) => {
                for id in &ids {
                    self.map.remove_area_layer(*id);
                }
                if let Some(action) = self.draw_tool.deleted(&ids) {
                    self.dispatch(action);
                }
            }
        }
    }

    fn draw_areas(&mut self, areas: Vec<AreaGeometry>) {
        let mut bounds: Option<LatLngBounds> = None;
        for area in areas {
            let geometry = match area.normalized() {
                Ok(geometry) => geometry,
                Err(e) => {
                    tracing::warn!("Saved {} area skipped: {}", area.kind(), e);
                    continue;
                }
            };
            let id = self.draw_tool.allocate_id();
            self.map.add_area_layer(id, &geometry);
            self.dispatch(add_layer_action(id, &geometry, &self.state.technologies));

            if let Some(area_bounds) = geometry.bounds() {
                bounds = Some(match bounds {
                    Some(b) => b.union(&area_bounds),
                    None => area_bounds,
                });
            }
        }

        if let Some(bounds) = bounds {
            self.map
                .fit_bounds(&bounds, self.config.interaction.fit_max_zoom);
        }
    }

    /// First-draw guard: the scene feeds are subscribed once, however
    /// often the overlay context is rebuilt.
    fn on_overlay_ready(&mut self) -> Result<()> {
        if self.state.first_draw {
            self.state.first_draw = false;
            tracing::debug!("Overlay ready, subscribing to scene feeds");
            let input = self.scene_input();
            self.pipeline.redraw(input)?;
        }
        Ok(())
    }

    fn scene_input(&mut self) -> SceneInput {
        SceneInput::new(
            self.feeds.sectors.borrow_and_update().clone(),
            self.feeds.selected.borrow_and_update().clone(),
            self.feeds.searched.borrow_and_update().clone(),
        )
    }

    fn redraw_scene(&mut self) {
        let input = self.scene_input();
        if let Err(e) = self.pipeline.redraw(input) {
            tracing::error!("Overlay redraw failed: {}", e);
        }
    }

    fn sync_overlay_viewport(&mut self) {
        let viewport = self.map.viewport();
        if let Err(e) = self.pipeline.set_viewport(&viewport) {
            tracing::warn!("Overlay viewport update failed: {}", e);
        }
    }

    fn on_technologies_changed(&mut self) {
        self.state.technologies = self.feeds.technologies.borrow_and_update().clone();
        tracing::debug!("Technologies changed: {:?}", self.state.technologies);
        let viewport = self.map.viewport();
        if let Some(action) = self
            .viewport_sync
            .on_technologies_changed(&viewport, &self.state.technologies)
        {
            self.dispatch(action);
        }
    }

    fn apply_tile_source(&mut self) {
        let offline = *self.feeds.offline_mode.borrow_and_update();
        let url = self.config.tiles.url_for(offline).to_string();
        tracing::info!(
            "Using {} tiles: {}",
            if offline { "offline" } else { "online" },
            url
        );
        self.map.set_tile_url(&url);
    }

    fn on_sector_info(&mut self) {
        let info = self.feeds.sector_info.borrow_and_update().clone();
        if let Some(info) = info {
            self.popup.on_sector_info(&mut self.map, &info);
        }
    }

    fn fire_hover(&mut self, now: Instant) {
        if let Some(action) = self.popup.fire_hover(
            &mut self.map,
            self.draw_tool.is_drawing(),
            &self.state.technologies,
            now,
        ) {
            self.dispatch(action);
        }
    }

    /// Closes the popup, stops the overlay and clears the selection.
    fn teardown(&mut self) {
        self.popup.cancel_hover();
        self.popup.close(&mut self.map);
        self.pipeline.shutdown();
        self.dispatch(MapAction::RemoveAllSelected);
        tracing::info!("Sectors component torn down");
    }

    fn dispatch(&self, action: MapAction) {
        if let Err(e) = self.bus.dispatch(action) {
            tracing::debug!("Action not delivered: {}", e);
        }
    }
}

fn feed_alive(
    changed: std::result::Result<(), watch::error::RecvError>,
    feed: &str,
) -> Result<()> {
    changed.map_err(|_| {
        tracing::error!("Store feed '{}' closed", feed);
        Error::from(StoreError::FeedClosed {
            feed: feed.to_string(),
        })
    })
}

/// Handle to a spawned component.
#[derive(Debug)]
pub struct ComponentHandle {
    commands: mpsc::Sender<MapCommand>,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<Result<()>>,
}

impl ComponentHandle {
    /// Sends a command to the component.
    pub async fn send(&self, command: MapCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| Error::other("sectors component has stopped"))
    }

    /// True once the component task has ended.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Signals teardown and waits for the component to finish.
    pub async fn shutdown(self) -> Result<()> {
        let _ = self.shutdown.send(true);
        self.join().await
    }

    /// Waits for the component to finish on its own.
    pub async fn join(self) -> Result<()> {
        self.task
            .await
            .map_err(|e| Error::other(format!("sectors component task failed: {}", e)))?
    }
}
