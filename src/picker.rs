//! The font picker controller
//!
//! Binds the catalog, the search box and the visible font list together and commits the user
//! choice (a catalog font or an uploaded file) into the style document.
use crate::{
    catalog::{CatalogEntry, CatalogSource},
    config::Config,
    error::FontPickerError,
    font::{DisplayFont, FontDescriptor},
    media::MediaService,
    sfnt::FontParser,
    styles::StyleService,
    transport::Transport,
    utils,
    view::{UploadProgress, ViewManager},
};
use scopeguard::ScopeGuard;
use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    time::Duration,
};
use tokio::{
    sync::{
        broadcast::{self, error::RecvError},
        watch,
    },
    task::JoinHandle,
};
use tracing::{debug, error, info, trace, warn};

/// Capacity of the event channel handed out by [`FontPicker::subscribe`].
pub const EVENTS_CAPACITY: usize = 64;

/// Category under which upload progress is reported.
pub const PROGRESS_CATEGORY: &str = "Styles";

/// Whether the catalog is available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogState {
    NotLoaded,
    Loading,
    /// Loaded, with this many font families.
    Loaded(usize),
    /// The last attempt failed; loading may be retried.
    Failed(String),
}

/// Notifications published to the host UI.
#[derive(Debug, Clone, PartialEq)]
pub enum PickerEvent {
    CatalogLoaded { fonts: usize },
    CatalogFailed { message: String },
    /// The visible list has been emptied by a search pattern change.
    FontsCleared,
    PageLoaded { appended: usize, total: usize },
    /// A font has been written to the style document.
    FontCommitted(FontDescriptor),
}

/// The collaborators the picker drives.
#[derive(Clone)]
pub struct Services {
    pub transport: Arc<dyn Transport>,
    pub styles: Arc<dyn StyleService>,
    pub media: Arc<dyn MediaService>,
    pub view: Arc<dyn ViewManager>,
    pub parser: Arc<dyn FontParser>,
}

type SelectCallback = Box<dyn Fn(&FontDescriptor) + Send + Sync>;

/// Mutable picker state. The lock is never held across an await point.
struct PickerState {
    catalog_state: CatalogState,
    catalog: Vec<Arc<CatalogEntry>>,
    pattern: String,
    visible: Vec<DisplayFont>,
    /// The debounced reload scheduled by the last pattern change.
    pending_load: Option<JoinHandle<()>>,
    /// Bumped on every pattern change; a scheduled load only runs if it is still current.
    generation: u64,
}

struct Shared {
    source: Option<CatalogSource>,
    services: Services,
    page_size: usize,
    search_debounce: Duration,
    selected: Option<watch::Sender<Option<FontDescriptor>>>,
    on_select: Option<SelectCallback>,
    events: broadcast::Sender<PickerEvent>,
    state: Mutex<PickerState>,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, PickerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, event: PickerEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    /// Appends the next page of matching fonts
    ///
    /// When `generation` is given, the load is skipped if the pattern changed since it was
    /// scheduled.
    fn load_page(&self, generation: Option<u64>) -> usize {
        let mut state = self.state();
        if let Some(generation) = generation {
            if generation != state.generation {
                trace!("skipping superseded page load #{generation}");
                return 0;
            }
            state.pending_load = None;
        } else if let Some(pending) = state.pending_load.take() {
            // An explicit load replaces the scheduled reload
            pending.abort();
            state.generation = state.generation.wrapping_add(1);
            trace!("scheduled reload superseded by an explicit page load");
        }
        if !matches!(state.catalog_state, CatalogState::Loaded(_)) {
            trace!("catalog not loaded, no page to load");
            return 0;
        }

        let pattern = state.pattern.to_lowercase();
        let offset = state.visible.len();
        let page: Vec<DisplayFont> = state
            .catalog
            .iter()
            .filter(|entry| entry.family.to_lowercase().contains(&pattern))
            .skip(offset)
            .take(self.page_size)
            .cloned()
            .map(DisplayFont::new)
            .collect();
        let appended = page.len();
        state.visible.extend(page);
        let total = state.visible.len();
        drop(state);

        trace!("page at {offset} for {pattern:?}: {appended} fonts appended");
        self.publish(PickerEvent::PageLoaded { appended, total });
        appended
    }

    fn notify_committed(&self, descriptor: &FontDescriptor) {
        if let Some(selected) = &self.selected {
            selected.send_replace(Some(descriptor.clone()));
        }
        if let Some(on_select) = &self.on_select {
            on_select(descriptor);
        }
        self.publish(PickerEvent::FontCommitted(descriptor.clone()));
    }
}

/// Builder for [`FontPicker`].
pub struct FontPickerBuilder {
    source: Option<CatalogSource>,
    services: Services,
    page_size: usize,
    search_debounce: Duration,
    selected: Option<watch::Sender<Option<FontDescriptor>>>,
    on_select: Option<SelectCallback>,
}

impl FontPickerBuilder {
    /// Sets where the catalog is fetched from; without it the catalog cannot be loaded
    pub fn catalog_source(mut self, source: CatalogSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Takes page size and search debounce from the configuration
    pub fn configure(self, config: &Config) -> Self {
        self.page_size(config.page_size)
            .search_debounce(config.search_debounce())
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn search_debounce(mut self, search_debounce: Duration) -> Self {
        self.search_debounce = search_debounce;
        self
    }

    /// Binds the "currently selected font" cell, updated on every commit
    pub fn selected_font(mut self, selected: watch::Sender<Option<FontDescriptor>>) -> Self {
        self.selected = Some(selected);
        self
    }

    /// Sets the callback invoked once per successful commit
    pub fn on_select<F>(mut self, on_select: F) -> Self
    where
        F: Fn(&FontDescriptor) + Send + Sync + 'static,
    {
        self.on_select = Some(Box::new(on_select));
        self
    }

    pub fn build(self) -> FontPicker {
        let (events, _) = broadcast::channel(EVENTS_CAPACITY);
        FontPicker {
            shared: Arc::new(Shared {
                source: self.source,
                services: self.services,
                page_size: self.page_size,
                search_debounce: self.search_debounce,
                selected: self.selected,
                on_select: self.on_select,
                events,
                state: Mutex::new(PickerState {
                    catalog_state: CatalogState::NotLoaded,
                    catalog: Vec::new(),
                    pattern: String::new(),
                    visible: Vec::new(),
                    pending_load: None,
                    generation: 0,
                }),
            }),
        }
    }
}

/// Font picker controller.
///
/// Must be used from within a tokio runtime: search pattern changes spawn the debounced reload.
pub struct FontPicker {
    shared: Arc<Shared>,
}

impl FontPicker {
    pub fn builder(services: Services) -> FontPickerBuilder {
        let defaults = Config::default();
        FontPickerBuilder {
            source: None,
            services,
            page_size: defaults.page_size,
            search_debounce: defaults.search_debounce(),
            selected: None,
            on_select: None,
        }
    }

    /// Subscribes to picker notifications
    pub fn subscribe(&self) -> broadcast::Receiver<PickerEvent> {
        self.shared.events.subscribe()
    }

    pub fn catalog_state(&self) -> CatalogState {
        self.shared.state().catalog_state.clone()
    }

    pub fn search_pattern(&self) -> String {
        self.shared.state().pattern.clone()
    }

    /// Returns the fonts loaded so far for the current pattern, in catalog order
    pub fn visible_fonts(&self) -> Vec<DisplayFont> {
        self.shared.state().visible.clone()
    }

    /// Fetches the catalog and loads the first page
    ///
    /// Does nothing if the catalog is loaded or being loaded. After a failure the state is
    /// [`CatalogState::Failed`] and the call may be repeated.
    pub async fn load_catalog(&self) -> Result<(), FontPickerError> {
        {
            let mut state = self.shared.state();
            if matches!(
                state.catalog_state,
                CatalogState::Loading | CatalogState::Loaded(_)
            ) {
                debug!("catalog already {:?}", state.catalog_state);
                return Ok(());
            }
            state.catalog_state = CatalogState::Loading;
        }
        // Back to NotLoaded if this future is dropped mid-flight
        let _loading = scopeguard::guard(self.shared.clone(), |shared| {
            let mut state = shared.state();
            if state.catalog_state == CatalogState::Loading {
                state.catalog_state = CatalogState::NotLoaded;
            }
        });

        let fetched = match &self.shared.source {
            Some(source) => source.fetch(self.shared.services.transport.as_ref()).await,
            None => Err(FontPickerError::MissingApiKey),
        };
        let catalog = match fetched {
            Ok(v) => v,
            Err(e) => {
                let message = e.to_string();
                error!("failed to load the font catalog: {message}");
                self.shared.state().catalog_state = CatalogState::Failed(message.clone());
                self.shared.publish(PickerEvent::CatalogFailed { message });
                return Err(e);
            }
        };

        let fonts = catalog.len();
        {
            let mut state = self.shared.state();
            state.catalog = catalog;
            state.catalog_state = CatalogState::Loaded(fonts);
        }
        info!("font catalog loaded: {fonts} families");
        self.shared.publish(PickerEvent::CatalogLoaded { fonts });
        self.shared.load_page(None);
        Ok(())
    }

    /// Updates the search pattern
    ///
    /// Once the catalog is loaded, the visible list is emptied at once and reloaded after the
    /// search debounce interval. Only the last change within the interval triggers a reload.
    pub fn set_search_pattern(&self, pattern: impl Into<String>) {
        self.update_pattern(pattern.into());
    }

    /// Updates the search pattern and waits until the first page for it is visible
    ///
    /// Returns at once if the pattern is unchanged or the catalog is not loaded.
    pub async fn search(&self, pattern: impl Into<String>) {
        let mut events = self.subscribe();
        if !self.update_pattern(pattern.into()) {
            return;
        }
        loop {
            match events.recv().await {
                Ok(PickerEvent::PageLoaded { .. }) => return,
                Ok(_) | Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => return,
            }
        }
    }

    /// Stores the pattern, returning whether a reload has been scheduled
    fn update_pattern(&self, pattern: String) -> bool {
        let mut state = self.shared.state();
        if state.pattern == pattern {
            return false;
        }
        state.pattern = pattern;
        if !matches!(state.catalog_state, CatalogState::Loaded(_)) {
            trace!("search pattern stored, catalog not loaded yet");
            return false;
        }

        state.visible.clear();
        if let Some(pending) = state.pending_load.take() {
            pending.abort();
        }
        state.generation = state.generation.wrapping_add(1);
        let generation = state.generation;
        let shared: Weak<Shared> = Arc::downgrade(&self.shared);
        let search_debounce = self.shared.search_debounce;
        state.pending_load = Some(tokio::spawn(async move {
            tokio::time::sleep(search_debounce).await;
            if let Some(shared) = shared.upgrade() {
                shared.load_page(Some(generation));
            }
        }));
        drop(state);

        self.shared.publish(PickerEvent::FontsCleared);
        true
    }

    /// Appends the next page of fonts matching the current pattern, returning how many were
    /// appended
    ///
    /// Returns 0 before the catalog is loaded and once all matches are visible. A reload still
    /// pending from a search pattern change is canceled, this call loads its page instead.
    pub fn load_next_page(&self) -> usize {
        self.shared.load_page(None)
    }

    /// Registers a catalog font in the style document
    pub async fn select_font(&self, font: &DisplayFont) -> Result<FontDescriptor, FontPickerError> {
        self.commit(font.to_descriptor()).await
    }

    /// Asks the user for a font file, stores it as a media asset and registers it in the style
    /// document
    ///
    /// Returns `None` if the user picked nothing. If the registration fails after the asset has
    /// been uploaded, the asset is not removed.
    pub async fn upload_font(&self) -> Result<Option<FontDescriptor>, FontPickerError> {
        let services = &self.shared.services;
        let files = services.view.open_upload_dialog().await;
        if files.len() > 1 {
            debug!("{} files picked, only the first one is used", files.len());
        }
        let Some(file) = files.into_iter().next() else {
            debug!("upload canceled");
            return Ok(None);
        };

        let content = tokio::fs::read(&file.path).await?;
        let mut descriptor = services.parser.parse(&content)?;
        if descriptor.variants.is_empty() {
            return Err(FontPickerError::NoFontVariants(descriptor.family));
        }
        descriptor.set_identifier(&utils::new_identifier());
        let content_type = utils::content_type_for(&file.name);

        let (progress_tx, progress_rx) = watch::channel(UploadProgress::InProgress);
        services.view.notify_progress(
            progress_rx,
            PROGRESS_CATEGORY,
            &format!("Uploading {}...", file.name),
        );
        let media = match services
            .media
            .create_media(&file.name, &content, content_type)
            .await
        {
            Ok(v) => {
                progress_tx.send_replace(UploadProgress::Completed);
                v
            }
            Err(e) => {
                progress_tx.send_replace(UploadProgress::Failed(e.to_string()));
                return Err(e);
            }
        };
        debug!("{:?} uploaded as {}", file.name, media.key);

        if let Some(variant) = descriptor.variants.first_mut() {
            variant.source_key = Some(media.key.clone());
        }
        let orphan = scopeguard::guard(media.key, |key| {
            warn!("media asset {key} is left orphaned: the font could not be registered")
        });
        let descriptor = self.commit(descriptor).await?;
        ScopeGuard::into_inner(orphan);
        Ok(Some(descriptor))
    }

    /// Writes the descriptor into a freshly read style document and notifies the observers
    async fn commit(&self, descriptor: FontDescriptor) -> Result<FontDescriptor, FontPickerError> {
        let styles_service = &self.shared.services.styles;
        let mut styles = styles_service.get_styles().await?;
        if styles.set_font(descriptor.clone()).is_some() {
            debug!("replacing font {}", descriptor.key);
        }
        styles_service.update_styles(&styles).await?;
        info!("font {:?} registered as {}", descriptor.family, descriptor.key);
        self.shared.notify_committed(&descriptor);
        Ok(descriptor)
    }
}

impl Drop for FontPicker {
    fn drop(&mut self) {
        if let Some(pending) = self.shared.state().pending_load.take() {
            pending.abort();
        }
    }
}
