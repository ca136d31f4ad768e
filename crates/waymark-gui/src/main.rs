use iced::widget::{
    button, checkbox, column, container, image, responsive, row, scrollable, stack, text, Column,
};
use iced::{Element, Length, Task, Theme};
use std::path::PathBuf;
use waymark_core::{
    clean, linkify, CategoryFilter, Dataset, FragmentStore, Place, Span, Subscription, Viewport,
};

mod map;
mod style;
use map::{MapView, PhotoLoader, TileManager};

fn main() -> iced::Result {
    let _ = simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );

    iced::application("Waymark", App::update, App::view)
        .theme(|_| Theme::Dark)
        .run_with(App::new)
}

#[derive(Debug, Clone)]
enum Message {
    DatasetLoaded(Result<Dataset, String>),

    // Selection
    SelectPlace(String),
    ClearSelection,

    // Filters
    ToggleCategory(String),

    // Map & links
    MapZoom {
        new_center: (f64, f64),
        new_zoom: f64,
    },
    OpenLink(String),
}

struct Launch {
    data_path: PathBuf,
    start_fragment: Option<String>,
}

/// Args: an optional dataset path and an optional start location. The
/// location may be a raw fragment (`#old-mill` or `old-mill` won't do —
/// bare ids are indistinguishable from paths, so they need the `#`) or
/// a full URL whose fragment is extracted.
fn parse_args() -> Launch {
    let mut launch = Launch {
        data_path: PathBuf::from("data/map.json"),
        start_fragment: None,
    };

    for arg in std::env::args().skip(1) {
        if let Ok(url) = url::Url::parse(&arg) {
            if let Some(fragment) = url.fragment() {
                launch.start_fragment = Some(fragment.to_string());
                continue;
            }
        }
        if arg.starts_with('#') {
            launch.start_fragment = Some(clean(&arg).to_string());
        } else {
            launch.data_path = PathBuf::from(arg);
        }
    }

    launch
}

fn load_dataset(path: PathBuf) -> Result<Dataset, String> {
    Dataset::load(&path).map_err(|e| e.to_string())
}

struct App {
    dataset: Dataset,
    filters: CategoryFilter,
    fragment: FragmentStore,
    _fragment_log: Subscription,
    status: String,
    // Assets
    tile_manager: TileManager,
    photos: PhotoLoader,
    // Map state
    map_zoom: f64,
    map_center: (f64, f64), // (lat, lon)
    map_initialized: bool,
}

impl App {
    fn new() -> (Self, Task<Message>) {
        let launch = parse_args();

        let fragment = match &launch.start_fragment {
            Some(raw) => FragmentStore::with_fragment(raw),
            None => FragmentStore::new(),
        };
        let _fragment_log = fragment.subscribe(|value| log::info!("fragment -> \"#{}\"", value));

        let viewport = Viewport::world();
        let app = Self {
            dataset: Dataset::default(),
            filters: CategoryFilter::default(),
            fragment,
            _fragment_log,
            status: "Loading...".to_string(),
            tile_manager: TileManager::new(),
            photos: PhotoLoader::new(),
            map_zoom: viewport.zoom,
            map_center: viewport.center,
            map_initialized: false,
        };

        let path = launch.data_path.clone();
        (
            app,
            Task::perform(async move { load_dataset(path) }, Message::DatasetLoaded),
        )
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::DatasetLoaded(result) => {
                match result {
                    Ok(dataset) => {
                        self.filters = CategoryFilter::all(&dataset);
                        self.dataset = dataset;
                        self.status = format!("{} places", self.dataset.len());

                        // A deep link may already be in the store; frame it
                        // now that we know where it is.
                        if let Some(place) = self.dataset.place(&self.fragment.read()) {
                            let viewport = Viewport::for_place(place);
                            self.map_center = viewport.center;
                            self.map_zoom = viewport.zoom;
                            self.map_initialized = true;
                        }
                    }
                    Err(e) => self.status = format!("Dataset error: {}", e),
                }
                Task::none()
            }
            Message::SelectPlace(id) => {
                self.fragment.write(Some(&id));
                if let Some(place) = self.dataset.place(&id) {
                    let viewport = Viewport::for_place(place);
                    self.map_center = viewport.center;
                    self.map_zoom = viewport.zoom;
                    self.map_initialized = true;
                    self.status = place.name.clone();
                }
                Task::none()
            }
            Message::ClearSelection => {
                self.fragment.write(None);
                let viewport = Viewport::world();
                self.map_center = viewport.center;
                self.map_zoom = viewport.zoom;
                // Back to the width-fitted world view.
                self.map_initialized = false;
                self.status = format!("{} places", self.dataset.len());
                Task::none()
            }
            Message::ToggleCategory(id) => {
                self.filters.toggle(&id);
                Task::none()
            }
            Message::MapZoom {
                new_center,
                new_zoom,
            } => {
                self.map_center = new_center;
                self.map_zoom = new_zoom;
                self.map_initialized = true;
                Task::none()
            }
            Message::OpenLink(url) => {
                if let Err(e) = open::that(&url) {
                    log::warn!("Failed to open {}: {}", url, e);
                }
                Task::none()
            }
        }
    }

    fn view(&self) -> Element<'_, Message> {
        let selected = self.dataset.place(&self.fragment.read());

        let panel: Element<'_, Message> = match selected {
            Some(place) => self.view_detail(place),
            None => self.view_filters(),
        };

        container(
            row![
                self.view_map(),
                container(panel)
                    .style(style::container_card)
                    .padding(15)
                    .width(Length::Fixed(320.0))
                    .height(Length::Fill)
            ]
            .spacing(20),
        )
        .padding(20)
        .width(Length::Fill)
        .height(Length::Fill)
        .style(style::container_main_content)
        .into()
    }

    fn view_map(&self) -> Element<'_, Message> {
        let map_container = container(responsive(move |size| {
            let fit_zoom = (size.width as f64 / map::TILE_SIZE).log2();
            let zoom = if !self.map_initialized {
                fit_zoom
            } else {
                self.map_zoom.max(fit_zoom)
            };

            let selected_id = self.fragment.read();
            let mut places = self.filters.filtered(&self.dataset);
            // The selected place stays visible even when its category
            // is filtered off.
            if let Some(place) = self.dataset.place(&selected_id) {
                if !places.iter().any(|p| p.id == place.id) {
                    places.push(place);
                }
            }

            let map_view = MapView {
                places,
                selected: Some(selected_id).filter(|id| !id.is_empty()),
                tile_manager: &self.tile_manager,
                zoom,
                center: self.map_center,
            };

            map_view.into()
        }))
        .width(Length::Fill)
        .height(Length::Fill)
        .style(style::container_card)
        .padding(1)
        .clip(true);

        let attribution = container(
            container(
                text("© OpenStreetMap contributors")
                    .size(10)
                    .color(style::palette::TEXT_SECONDARY),
            )
            .padding([2, 6])
            .style(style::container_attribution),
        )
        .width(Length::Fill)
        .height(Length::Fill)
        .align_x(iced::alignment::Horizontal::Right)
        .align_y(iced::alignment::Vertical::Bottom)
        .padding(8);

        stack![map_container, attribution].into()
    }

    fn view_filters(&self) -> Element<'_, Message> {
        let mut list = Column::new().spacing(8);
        for (id, category) in self.dataset.categories_sorted() {
            let owned = id.to_string();
            list = list.push(
                checkbox(
                    format!("{} ({})", category.name, category.count),
                    self.filters.is_active(id),
                )
                .on_toggle(move |_| Message::ToggleCategory(owned.clone()))
                .size(16)
                .text_size(13),
            );
        }

        column![
            text("Categories").size(18),
            text(&self.status)
                .size(10)
                .color(style::palette::TEXT_SECONDARY),
            scrollable(list).height(Length::Fill),
        ]
        .spacing(12)
        .into()
    }

    fn view_detail<'a>(&'a self, place: &'a Place) -> Element<'a, Message> {
        let mut body = Column::new().spacing(10);

        if let Some(description) = &place.description {
            for span in linkify(description) {
                body = body.push(match span {
                    Span::Text(content) => Element::from(
                        text(content).size(13).color(style::palette::TEXT_PRIMARY),
                    ),
                    Span::Link(url) => Element::from(
                        button(text(url.clone()).size(13))
                            .on_press(Message::OpenLink(url))
                            .style(style::button_link)
                            .padding(0),
                    ),
                });
            }
        }

        for url in &place.img {
            if let Some(handle) = self.photos.get(url) {
                body = body.push(image(handle).width(Length::Fill));
            } else {
                self.photos.request(url);
                body = body.push(
                    container(
                        text("Loading photo...")
                            .size(11)
                            .color(style::palette::TEXT_SECONDARY),
                    )
                    .padding(20)
                    .width(Length::Fill)
                    .style(style::container_attribution),
                );
            }
        }

        column![
            button(text("< Back").size(12))
                .on_press(Message::ClearSelection)
                .style(style::button_secondary)
                .padding([6, 12]),
            text(&place.name).size(22),
            scrollable(body).height(Length::Fill),
            text(format!("Link: #{}", place.id))
                .size(10)
                .color(style::palette::TEXT_SECONDARY),
        ]
        .spacing(12)
        .into()
    }
}
