//! Search / result state machine.
//!
//! The controller owns the view state, sequences query resolution, the
//! provider call and persistence, and describes the screen to a [`Renderer`].
//! It runs on a single task: overlapping searches are not cancelled, and
//! whichever response is finished last is what stays on screen.

use std::{future::Future, sync::Arc, time::Duration};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};

use crate::{
    WeatherError, WeatherProvider,
    config::Theme,
    geolocation::{GeoOptions, GeolocationError, Geolocator},
    model::{LastQuery, NormalizedWeather},
    query,
    render::{self, ChartId, RenderCommand, Renderer, View},
    store::LastQueryStore,
    timer::{TimerEvent, TimerKind, Timers},
};

/// Searches answered faster than this never show the spinner.
pub const SPINNER_DELAY: Duration = Duration::from_millis(200);
/// Length of the fade before the search form comes back.
pub const BACK_TRANSITION_DELAY: Duration = Duration::from_millis(500);

const SEARCH_LABEL: &str = "Search";
const SEARCHING_LABEL: &str = "Searching…";
const LOCATE_LABEL: &str = "Use my location";
const LOCATING_LABEL: &str = "Locating…";
const MY_LOCATION_LABEL: &str = "My location";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    /// Search form visible, possibly with an error banner.
    Search,
    /// A lookup is in flight.
    Searching,
    /// Forecast view visible.
    Result,
}

/// Everything the screen currently shows, as last told to the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewModel {
    pub view: View,
    pub input: String,
    pub error: Option<String>,
    pub input_invalid: bool,
    pub busy: bool,
    pub spinner_visible: bool,
    pub faded: bool,
    pub locate_enabled: bool,
    pub last_chip: Option<String>,
    pub charts: Vec<ChartId>,
}

impl Default for ViewModel {
    fn default() -> Self {
        Self {
            view: View::Search,
            input: String::new(),
            error: None,
            input_invalid: false,
            busy: false,
            spinner_visible: false,
            faded: false,
            locate_enabled: true,
            last_chip: None,
            charts: Vec::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum LocateError {
    #[error("Geolocation is not supported on this device.")]
    Unsupported,
    #[error("{}", .0.user_message())]
    Position(GeolocationError),
    #[error(transparent)]
    Lookup(#[from] WeatherError),
}

pub struct ViewController<R: Renderer> {
    provider: Arc<dyn WeatherProvider>,
    store: Box<dyn LastQueryStore>,
    locator: Option<Arc<dyn Geolocator>>,
    geo_options: GeoOptions,
    renderer: R,
    theme: Theme,
    state: ViewState,
    view: ViewModel,
    last: Option<LastQuery>,
    timers: Timers,
    timer_rx: UnboundedReceiver<TimerEvent>,
}

impl<R: Renderer> ViewController<R> {
    /// Load the remembered query and paint the initial search screen.
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        store: Box<dyn LastQueryStore>,
        renderer: R,
        theme: Theme,
    ) -> Self {
        let (timers, timer_rx) = Timers::new();
        let last = store.load();

        let mut controller = Self {
            provider,
            store,
            locator: None,
            geo_options: GeoOptions::default(),
            renderer,
            theme,
            state: ViewState::Search,
            view: ViewModel::default(),
            last,
            timers,
            timer_rx,
        };

        controller.configure_charts();
        controller.emit(RenderCommand::ShowView(View::Search));
        controller.paint_last_chip();
        controller
    }

    pub fn with_locator(mut self, locator: Arc<dyn Geolocator>) -> Self {
        self.locator = Some(locator);
        self
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn view(&self) -> &ViewModel {
        &self.view
    }

    pub fn last_query(&self) -> Option<&LastQuery> {
        self.last.as_ref()
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// The user edited the search field.
    pub fn type_input(&mut self, text: &str) {
        self.fill_input(text);
        self.hide_error();
    }

    /// Resolve the query and run one lookup to completion.
    pub async fn submit(&mut self, override_query: Option<&str>) -> Result<(), WeatherError> {
        let q = self.begin_search(override_query)?;

        let provider = Arc::clone(&self.provider);
        let outcome = self.drive(async move { provider.fetch_weather(&q).await }).await;

        self.finish_search(outcome)
    }

    /// First half of [`submit`](Self::submit): validate, enter `Searching` and
    /// return the query to send. Validation failures stay on the search form.
    pub fn begin_search(&mut self, override_query: Option<&str>) -> Result<String, WeatherError> {
        let q = match query::resolve(&self.view.input, override_query, self.last.as_ref()) {
            Ok(q) => q,
            Err(e) => {
                debug!(reason = %e, "Search rejected before lookup");
                self.supersede_back();
                self.show_error(e.message());
                return Err(e);
            }
        };

        self.timers.cancel(TimerKind::BackTransition);
        self.hide_error();
        self.set_loading(true);
        self.set_faded(true);
        self.state = ViewState::Searching;
        info!(query = %q, "Searching");

        Ok(q)
    }

    /// Second half of [`submit`](Self::submit): apply a provider outcome.
    pub fn finish_search(
        &mut self,
        outcome: Result<NormalizedWeather, WeatherError>,
    ) -> Result<(), WeatherError> {
        let result = match outcome {
            Ok(weather) => {
                self.render(&weather);
                self.state = ViewState::Result;
                let q = query::format_coordinates(weather.lat, weather.lon);
                self.remember(weather.title.clone(), q);
                Ok(())
            }
            Err(err) => {
                warn!(kind = %err.kind(), error = %err, "Lookup failed");
                self.state = ViewState::Search;
                self.show_view(View::Search);
                self.set_faded(false);
                self.set_input_invalid(true);
                self.show_error(err.kind().user_message());
                Err(err)
            }
        };

        self.set_loading(false);
        result
    }

    /// Re-run the remembered query from its chip. No-op without one.
    pub async fn select_last(&mut self) -> Result<(), WeatherError> {
        let Some(last) = self.last.clone() else {
            return Ok(());
        };
        self.fill_input(&last.label);
        self.submit(Some(&last.q)).await
    }

    /// Look up the device position and search for it.
    pub async fn use_location(&mut self) -> Result<(), LocateError> {
        self.supersede_back();

        let Some(locator) = self.locator.clone() else {
            let err = LocateError::Unsupported;
            self.show_error(&err.to_string());
            return Err(err);
        };

        self.set_locate_button(false, LOCATING_LABEL);
        let options = self.geo_options;
        let position = self.drive(async move { locator.current_position(&options).await }).await;
        self.set_locate_button(true, LOCATE_LABEL);

        match position {
            Ok(coords) => {
                debug!(lat = coords.latitude, lon = coords.longitude, "Position acquired");
                self.fill_input(MY_LOCATION_LABEL);
                Ok(self.submit(Some(&coords.to_query())).await?)
            }
            Err(e) => {
                warn!(error = %e, "Geolocation failed");
                self.show_error(e.user_message());
                Err(LocateError::Position(e))
            }
        }
    }

    /// Leave the forecast view. The swap happens after
    /// [`BACK_TRANSITION_DELAY`] unless another search supersedes it.
    pub fn back(&mut self) {
        if self.state != ViewState::Result {
            debug!(state = ?self.state, "Ignoring back outside the result view");
            return;
        }
        self.set_faded(true);
        self.timers.schedule(TimerKind::BackTransition, BACK_TRANSITION_DELAY);
    }

    /// Apply a fired deferred action. Superseded actions are ignored.
    pub fn on_timer(&mut self, event: TimerEvent) {
        if !self.timers.claim(event) {
            debug!(kind = ?event.kind, "Dropping stale timer");
            return;
        }

        match event.kind {
            TimerKind::Spinner => {
                if self.state == ViewState::Searching {
                    self.view.spinner_visible = true;
                    self.emit(RenderCommand::SetSpinner(true));
                }
            }
            TimerKind::BackTransition => self.leave_forecast(),
        }
    }

    fn leave_forecast(&mut self) {
        self.state = ViewState::Search;
        self.show_view(View::Search);
        self.fill_input("");
        self.hide_error();
        self.set_faded(false);
        info!("Back to search");
    }

    /// A pending back transition is finished now, so that it cannot clear
    /// a banner shown after it.
    fn supersede_back(&mut self) {
        if self.timers.is_pending(TimerKind::BackTransition) {
            self.timers.cancel(TimerKind::BackTransition);
            self.leave_forecast();
        }
    }

    /// Wait until every pending deferred action has fired.
    pub async fn settle(&mut self) {
        while self.timers.any_pending() {
            match self.timer_rx.recv().await {
                Some(event) => self.on_timer(event),
                None => break,
            }
        }
    }

    /// Await `fut` while still servicing timers.
    async fn drive<T>(&mut self, fut: impl Future<Output = T>) -> T {
        tokio::pin!(fut);
        loop {
            tokio::select! {
                out = &mut fut => return out,
                Some(event) = self.timer_rx.recv() => self.on_timer(event),
            }
        }
    }

    fn render(&mut self, weather: &NormalizedWeather) {
        self.show_view(View::Forecast);
        self.set_faded(false);

        let icon = render::icon_command(weather);
        self.emit(icon);
        for cmd in render::field_commands(weather) {
            self.emit(cmd);
        }

        for id in std::mem::take(&mut self.view.charts) {
            self.emit(RenderCommand::DestroyChart(id));
        }
        if let Some((temperature, uv)) = render::charts_from(&weather.hourly, &self.theme) {
            self.view.charts = vec![temperature.id, uv.id];
            self.emit(RenderCommand::DrawChart(temperature));
            self.emit(RenderCommand::DrawChart(uv));
        }
    }

    fn remember(&mut self, label: String, q: String) {
        if label.is_empty() || q.is_empty() {
            return;
        }
        let last = LastQuery { label, q: query::normalize(&q) };
        self.store.save(&last);
        self.last = Some(last);
        self.paint_last_chip();
    }

    fn configure_charts(&mut self) {
        let font = Some(self.theme.font.trim().to_string()).filter(|f| !f.is_empty());
        let text_color = self.theme.text.trim().to_string();
        self.emit(RenderCommand::ConfigureCharts { text_color, font });
    }

    fn paint_last_chip(&mut self) {
        let chip = self
            .last
            .as_ref()
            .filter(|l| !l.label.is_empty() && !l.q.is_empty())
            .map(|l| l.label.clone());
        self.view.last_chip = chip.clone();
        self.emit(RenderCommand::SetLastChip(chip));
    }

    fn set_loading(&mut self, on: bool) {
        self.view.busy = on;
        let label = if on { SEARCHING_LABEL } else { SEARCH_LABEL };
        self.emit(RenderCommand::SetBusy { busy: on, label: label.to_string() });

        if on {
            self.timers.schedule(TimerKind::Spinner, SPINNER_DELAY);
        } else {
            self.timers.cancel(TimerKind::Spinner);
            self.view.spinner_visible = false;
            self.emit(RenderCommand::SetSpinner(false));
        }
    }

    fn show_view(&mut self, view: View) {
        if self.view.view != view {
            self.view.view = view;
            self.emit(RenderCommand::ShowView(view));
        }
    }

    fn show_error(&mut self, message: &str) {
        self.view.error = Some(message.to_string());
        self.emit(RenderCommand::ShowError(message.to_string()));
    }

    fn hide_error(&mut self) {
        self.view.error = None;
        self.emit(RenderCommand::HideError);
        self.set_input_invalid(false);
    }

    fn fill_input(&mut self, text: &str) {
        self.view.input = text.to_string();
        self.emit(RenderCommand::SetInput(text.to_string()));
    }

    fn set_input_invalid(&mut self, invalid: bool) {
        self.view.input_invalid = invalid;
        self.emit(RenderCommand::SetInputInvalid(invalid));
    }

    fn set_faded(&mut self, faded: bool) {
        self.view.faded = faded;
        self.emit(RenderCommand::SetFaded(faded));
    }

    fn set_locate_button(&mut self, enabled: bool, label: &str) {
        self.view.locate_enabled = enabled;
        self.emit(RenderCommand::SetLocateButton { enabled, label: label.to_string() });
    }

    fn emit(&mut self, command: RenderCommand) {
        self.renderer.apply(command);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ErrorKind,
        geolocation::Coordinates,
        model::{AirQuality, Astro, CurrentConditions, DaySummary, HourlyPoint},
        store::MemoryStore,
    };
    use async_trait::async_trait;
    use std::{collections::VecDeque, sync::Mutex};

    #[derive(Debug, Default)]
    struct FakeProvider {
        calls: Mutex<Vec<String>>,
        responses: Mutex<VecDeque<Result<NormalizedWeather, WeatherError>>>,
        delay: Duration,
    }

    impl FakeProvider {
        fn with(responses: Vec<Result<NormalizedWeather, WeatherError>>) -> Arc<Self> {
            Arc::new(Self { responses: Mutex::new(responses.into()), ..Default::default() })
        }

        fn slow(delay: Duration) -> Arc<Self> {
            Arc::new(Self { delay, ..Default::default() })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl WeatherProvider for FakeProvider {
        async fn fetch_weather(&self, query: &str) -> Result<NormalizedWeather, WeatherError> {
            self.calls.lock().unwrap().push(query.to_string());
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let next = self.responses.lock().unwrap().pop_front();
            next.unwrap_or_else(|| Ok(paris_weather()))
        }
    }

    struct FakeLocator(Result<Coordinates, GeolocationError>);

    #[async_trait]
    impl Geolocator for FakeLocator {
        async fn current_position(
            &self,
            options: &GeoOptions,
        ) -> Result<Coordinates, GeolocationError> {
            assert!(options.high_accuracy);
            self.0
        }
    }

    #[derive(Debug, Default)]
    struct Recorder(Vec<RenderCommand>);

    impl Renderer for Recorder {
        fn apply(&mut self, command: RenderCommand) {
            self.0.push(command);
        }
    }

    fn paris_weather() -> NormalizedWeather {
        NormalizedWeather {
            title: "Paris, France".into(),
            timezone_id: "Europe/Paris".into(),
            lat: 48.8567,
            lon: 2.2951,
            current: CurrentConditions {
                temp: 18.0,
                feels_like: 17.2,
                uv: 4.0,
                condition_text: "Partly cloudy".into(),
                icon_url: "https://cdn.weatherapi.com/weather/64x64/day/116.png".into(),
            },
            day: DaySummary { max: Some(22.0), min: Some(12.0), uv: Some(5.0) },
            astro: Astro::default(),
            aqi: AirQuality { us_epa_index: Some(2) },
            hourly: (0..24)
                .map(|h| HourlyPoint {
                    time: format!("2024-06-01 {h:02}:00"),
                    hhmm: format!("{h:02}:00"),
                    temp: 12.0 + h as f64 / 2.0,
                    feels_like: 11.0 + h as f64 / 2.0,
                    uv: 0.0,
                })
                .collect(),
        }
    }

    fn oslo_weather() -> NormalizedWeather {
        NormalizedWeather {
            title: "Oslo, Norway".into(),
            lat: 59.9133,
            lon: 10.7389,
            hourly: Vec::new(),
            ..paris_weather()
        }
    }

    fn controller(
        provider: Arc<FakeProvider>,
        store: MemoryStore,
    ) -> ViewController<Recorder> {
        ViewController::new(provider, Box::new(store), Recorder::default(), Theme::default())
    }

    fn paris_last() -> LastQuery {
        LastQuery { label: "Paris, France".into(), q: "48.857,2.295".into() }
    }

    fn count(rec: &Recorder, pred: impl Fn(&RenderCommand) -> bool) -> usize {
        rec.0.iter().filter(|c| pred(c)).count()
    }

    #[tokio::test]
    async fn startup_paints_chip_and_chart_defaults() {
        let c = controller(FakeProvider::with(vec![]), MemoryStore::with_value(paris_last()));

        assert_eq!(c.view().last_chip.as_deref(), Some("Paris, France"));
        assert_eq!(
            c.renderer().0.first(),
            Some(&RenderCommand::ConfigureCharts { text_color: "#e7eefc".into(), font: None })
        );
    }

    #[tokio::test]
    async fn successful_search_remembers_response_location() {
        let provider = FakeProvider::with(vec![]);
        let store = MemoryStore::default();
        let mut c = controller(provider.clone(), store.clone());

        c.type_input("Paris");
        c.submit(None).await.unwrap();

        assert_eq!(provider.calls(), vec!["Paris"]);
        assert_eq!(c.state(), ViewState::Result);
        assert_eq!(c.view().view, View::Forecast);
        assert_eq!(store.load(), Some(paris_last()));
        assert_eq!(c.last_query(), Some(&paris_last()));
        assert_eq!(c.view().last_chip.as_deref(), Some("Paris, France"));
        assert!(!c.view().busy);
        assert_eq!(c.view().charts, vec![ChartId::Temperature, ChartId::Uv]);
    }

    #[tokio::test]
    async fn my_location_without_history_makes_no_request() {
        let provider = FakeProvider::with(vec![]);
        let mut c = controller(provider.clone(), MemoryStore::default());

        c.type_input("My Location");
        let err = c.submit(None).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(c.view().error.as_deref(), Some("No saved location yet."));
        assert!(provider.calls().is_empty());
        assert_eq!(c.state(), ViewState::Search);
    }

    #[tokio::test]
    async fn empty_input_is_rejected() {
        let provider = FakeProvider::with(vec![]);
        let mut c = controller(provider.clone(), MemoryStore::default());

        assert!(c.submit(None).await.is_err());
        assert_eq!(c.view().error.as_deref(), Some("Type a city name."));
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn typed_label_reuses_stored_query() {
        let provider = FakeProvider::with(vec![]);
        let mut c = controller(provider.clone(), MemoryStore::with_value(paris_last()));

        c.type_input("PARIS, france");
        c.submit(None).await.unwrap();

        assert_eq!(provider.calls(), vec!["48.857,2.295"]);
    }

    #[tokio::test]
    async fn failure_shows_kind_message_and_keeps_history() {
        let not_found = WeatherError::new(ErrorKind::NotFound, "No matching location found.");
        let provider = FakeProvider::with(vec![Err(not_found)]);
        let store = MemoryStore::default();
        let mut c = controller(provider, store.clone());

        c.type_input("Atlantis");
        let err = c.submit(None).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(c.state(), ViewState::Search);
        assert_eq!(c.view().error.as_deref(), Some(ErrorKind::NotFound.user_message()));
        assert!(c.view().input_invalid);
        assert!(!c.view().busy);
        assert_eq!(store.load(), None);

        c.type_input("Atlantis, GR");
        assert_eq!(c.view().error, None);
        assert!(!c.view().input_invalid);
    }

    #[tokio::test]
    async fn unmapped_kind_uses_generic_message() {
        let provider = FakeProvider::with(vec![Err(WeatherError::new(ErrorKind::Http(502), "HTTP 502"))]);
        let mut c = controller(provider, MemoryStore::default());

        c.type_input("Paris");
        let _ = c.submit(None).await;

        assert_eq!(c.view().error.as_deref(), Some("Something went wrong."));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_search_reveals_spinner() {
        let mut c = controller(FakeProvider::slow(Duration::from_secs(1)), MemoryStore::default());

        c.type_input("Paris");
        c.submit(None).await.unwrap();

        let rec = c.renderer();
        assert_eq!(count(rec, |cmd| *cmd == RenderCommand::SetSpinner(true)), 1);
        assert!(!c.view().spinner_visible);
    }

    #[tokio::test(start_paused = true)]
    async fn fast_search_never_flashes_spinner() {
        let mut c =
            controller(FakeProvider::slow(Duration::from_millis(50)), MemoryStore::default());

        c.type_input("Paris");
        c.submit(None).await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        c.settle().await;

        assert_eq!(count(c.renderer(), |cmd| *cmd == RenderCommand::SetSpinner(true)), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn back_returns_to_search_after_delay() {
        let mut c = controller(FakeProvider::with(vec![]), MemoryStore::default());
        c.type_input("Paris");
        c.submit(None).await.unwrap();

        c.back();
        assert_eq!(c.state(), ViewState::Result);
        assert!(c.view().faded);

        c.settle().await;
        assert_eq!(c.state(), ViewState::Search);
        assert_eq!(c.view().view, View::Search);
        assert_eq!(c.view().input, "");
        assert_eq!(c.view().error, None);
        assert!(!c.view().faded);
    }

    #[tokio::test(start_paused = true)]
    async fn new_search_cancels_pending_back() {
        let mut c = controller(FakeProvider::with(vec![]), MemoryStore::default());
        c.type_input("Paris");
        c.submit(None).await.unwrap();

        c.back();
        c.submit(Some("59.913,10.739")).await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        c.settle().await;

        assert_eq!(c.state(), ViewState::Result);
        assert_eq!(c.view().view, View::Forecast);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_locate_after_back_keeps_its_banner() {
        let mut c = controller(FakeProvider::with(vec![]), MemoryStore::default())
            .with_locator(Arc::new(FakeLocator(Err(GeolocationError::Timeout))));
        c.type_input("Paris");
        c.submit(None).await.unwrap();

        c.back();
        assert!(c.use_location().await.is_err());
        tokio::time::sleep(Duration::from_secs(1)).await;
        c.settle().await;

        assert_eq!(c.view().error.as_deref(), Some("Timed out. Try again."));
        assert_eq!(c.state(), ViewState::Search);
        assert_eq!(c.view().view, View::Search);
        assert!(!c.view().faded);
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_search_after_back_keeps_its_banner() {
        let provider = FakeProvider::with(vec![]);
        let mut c = controller(provider.clone(), MemoryStore::default());
        c.type_input("Paris");
        c.submit(None).await.unwrap();

        c.back();
        c.type_input("   ");
        assert!(c.submit(None).await.is_err());
        tokio::time::sleep(Duration::from_secs(1)).await;
        c.settle().await;

        assert_eq!(c.view().error.as_deref(), Some("Type a city name."));
        assert_eq!(c.state(), ViewState::Search);
        assert_eq!(provider.calls(), vec!["Paris"]);
    }

    #[tokio::test]
    async fn back_outside_result_is_ignored() {
        let mut c = controller(FakeProvider::with(vec![]), MemoryStore::default());
        c.back();
        c.settle().await;
        assert_eq!(c.state(), ViewState::Search);
        assert!(!c.view().faded);
    }

    #[tokio::test]
    async fn charts_are_torn_down_before_redraw() {
        let provider = FakeProvider::with(vec![Ok(paris_weather()), Ok(paris_weather())]);
        let mut c = controller(provider, MemoryStore::default());

        c.type_input("Paris");
        c.submit(None).await.unwrap();
        c.submit(None).await.unwrap();

        let rec = &c.renderer().0;
        let first_destroy = rec
            .iter()
            .position(|cmd| matches!(cmd, RenderCommand::DestroyChart(_)))
            .unwrap();
        let draws: Vec<usize> = rec
            .iter()
            .enumerate()
            .filter(|(_, cmd)| matches!(cmd, RenderCommand::DrawChart(_)))
            .map(|(i, _)| i)
            .collect();

        assert_eq!(draws.len(), 4);
        assert!(draws[1] < first_destroy && first_destroy < draws[2]);
        assert_eq!(count(c.renderer(), |cmd| matches!(cmd, RenderCommand::DestroyChart(_))), 2);
    }

    #[tokio::test]
    async fn empty_hourly_draws_no_chart() {
        let mut c = controller(FakeProvider::with(vec![Ok(oslo_weather())]), MemoryStore::default());

        c.type_input("Oslo");
        c.submit(None).await.unwrap();

        assert_eq!(count(c.renderer(), |cmd| matches!(cmd, RenderCommand::DrawChart(_))), 0);
        assert!(c.view().charts.is_empty());
    }

    #[tokio::test]
    async fn last_resolving_response_wins() {
        let mut c = controller(FakeProvider::with(vec![]), MemoryStore::default());

        c.type_input("Paris");
        let first = c.begin_search(None).unwrap();
        c.type_input("Oslo");
        let second = c.begin_search(None).unwrap();
        assert_eq!((first.as_str(), second.as_str()), ("Paris", "Oslo"));

        c.finish_search(Ok(oslo_weather())).unwrap();
        c.finish_search(Ok(paris_weather())).unwrap();

        assert_eq!(c.last_query(), Some(&paris_last()));
        let titles: Vec<_> = c
            .renderer()
            .0
            .iter()
            .filter_map(|cmd| match cmd {
                RenderCommand::SetText { field: render::Field::City, text } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(titles.last(), Some(&"Paris, France"));
    }

    #[tokio::test]
    async fn chip_submits_stored_query() {
        let provider = FakeProvider::with(vec![]);
        let mut c = controller(provider.clone(), MemoryStore::with_value(paris_last()));

        c.select_last().await.unwrap();

        assert_eq!(c.view().input, "Paris, France");
        assert_eq!(provider.calls(), vec!["48.857,2.295"]);
    }

    #[tokio::test]
    async fn geolocation_fix_is_submitted_as_override() {
        let provider = FakeProvider::with(vec![]);
        let locator =
            FakeLocator(Ok(Coordinates { latitude: 48.856_61, longitude: 2.352_22 }));
        let mut c = controller(provider.clone(), MemoryStore::default())
            .with_locator(Arc::new(locator));

        c.use_location().await.unwrap();

        assert_eq!(provider.calls(), vec!["48.857,2.352"]);
        assert_eq!(c.view().input, "My location");
        assert!(c.view().locate_enabled);
    }

    #[tokio::test]
    async fn geolocation_denied_restores_trigger() {
        let provider = FakeProvider::with(vec![]);
        let mut c = controller(provider.clone(), MemoryStore::default())
            .with_locator(Arc::new(FakeLocator(Err(GeolocationError::PermissionDenied))));

        let err = c.use_location().await.unwrap_err();

        assert!(matches!(err, LocateError::Position(GeolocationError::PermissionDenied)));
        assert_eq!(
            c.view().error.as_deref(),
            Some("Permission denied. Enable location access.")
        );
        assert!(c.view().locate_enabled);
        assert!(provider.calls().is_empty());

        let rec = &c.renderer().0;
        let disabled = rec.iter().position(|cmd| {
            *cmd == RenderCommand::SetLocateButton { enabled: false, label: LOCATING_LABEL.into() }
        });
        let restored = rec.iter().rposition(|cmd| {
            *cmd == RenderCommand::SetLocateButton { enabled: true, label: LOCATE_LABEL.into() }
        });
        assert!(disabled.unwrap() < restored.unwrap());
    }

    #[tokio::test]
    async fn geolocation_timeout_and_unavailable_messages() {
        for (err, msg) in [
            (GeolocationError::PositionUnavailable, "Position unavailable."),
            (GeolocationError::Timeout, "Timed out. Try again."),
        ] {
            let mut c = controller(FakeProvider::with(vec![]), MemoryStore::default())
                .with_locator(Arc::new(FakeLocator(Err(err))));
            let _ = c.use_location().await;
            assert_eq!(c.view().error.as_deref(), Some(msg));
        }
    }

    #[tokio::test]
    async fn missing_geolocation_is_reported() {
        let mut c = controller(FakeProvider::with(vec![]), MemoryStore::default());

        let err = c.use_location().await.unwrap_err();

        assert!(matches!(err, LocateError::Unsupported));
        assert_eq!(
            c.view().error.as_deref(),
            Some("Geolocation is not supported on this device.")
        );
    }
}
