use crate::data::market::{Bar, BarState, SymbolInfo, Timeframe};
use barlab_ta::series::Series;
use rust_decimal::Decimal;
use smol_str::SmolStr;

/// Handle to a user-created decimal series registered with the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SeriesId(usize);

/// Handle to a user-created condition (boolean) series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlagId(usize);

/// Per-bar environment holding the built-in OHLCV series plus every series
/// the strategy registers.
///
/// The event loop updates the context at the start of each bar and commits
/// or rolls back *all* registered series as one batch, so no partial state
/// ever crosses a bar boundary.
#[derive(Debug)]
pub struct BarContext {
    bar_index: i64,
    bar_state: BarState,
    symbol_info: SymbolInfo,
    timeframe: Timeframe,
    current_bar: Option<Bar>,
    max_bars_back: usize,

    pub open: Series<Decimal>,
    pub high: Series<Decimal>,
    pub low: Series<Decimal>,
    pub close: Series<Decimal>,
    pub volume: Series<Decimal>,
    /// Bar timestamps as epoch seconds.
    pub time: Series<i64>,

    user_series: Vec<Series<Decimal>>,
    flag_series: Vec<Series<bool>>,
}

impl BarContext {
    pub fn new(symbol_info: SymbolInfo, timeframe: Timeframe, max_bars_back: usize) -> Self {
        Self {
            bar_index: -1,
            bar_state: BarState::New,
            symbol_info,
            timeframe,
            current_bar: None,
            max_bars_back,
            open: Series::new("open", max_bars_back),
            high: Series::new("high", max_bars_back),
            low: Series::new("low", max_bars_back),
            close: Series::new("close", max_bars_back),
            volume: Series::new("volume", max_bars_back),
            time: Series::new("time", max_bars_back),
            user_series: Vec::new(),
            flag_series: Vec::new(),
        }
    }

    pub fn bar_index(&self) -> i64 {
        self.bar_index
    }

    pub fn bar_state(&self) -> BarState {
        self.bar_state
    }

    pub fn symbol_info(&self) -> &SymbolInfo {
        &self.symbol_info
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub fn current_bar(&self) -> Option<&Bar> {
        self.current_bar.as_ref()
    }

    /// Allocate and register a decimal series.
    pub fn create_series(&mut self, name: impl Into<SmolStr>) -> SeriesId {
        let id = SeriesId(self.user_series.len());
        self.user_series
            .push(Series::new(name, self.max_bars_back));
        id
    }

    /// Allocate and register a condition series.
    pub fn create_flag_series(&mut self, name: impl Into<SmolStr>) -> FlagId {
        let id = FlagId(self.flag_series.len());
        self.flag_series
            .push(Series::new(name, self.max_bars_back));
        id
    }

    pub fn series(&self, id: SeriesId) -> &Series<Decimal> {
        &self.user_series[id.0]
    }

    pub fn series_mut(&mut self, id: SeriesId) -> &mut Series<Decimal> {
        &mut self.user_series[id.0]
    }

    pub fn flag(&self, id: FlagId) -> &Series<bool> {
        &self.flag_series[id.0]
    }

    pub fn flag_mut(&mut self, id: FlagId) -> &mut Series<bool> {
        &mut self.flag_series[id.0]
    }

    /// Stage the bar's OHLCV into the built-in series. Called by the event
    /// loop at the start of each bar.
    pub fn update(&mut self, bar: Bar, bar_index: usize) {
        self.bar_index = bar_index as i64;
        self.bar_state = BarState::New;

        self.open.set_current(bar.open);
        self.high.set_current(bar.high);
        self.low.set_current(bar.low);
        self.close.set_current(bar.close);
        self.volume.set_current(bar.volume);
        self.time.set_current(bar.timestamp.timestamp());

        self.current_bar = Some(bar);
    }

    /// Commit every registered series and confirm the bar.
    pub fn commit_all(&mut self) {
        self.open.commit();
        self.high.commit();
        self.low.commit();
        self.close.commit();
        self.volume.commit();
        self.time.commit();
        for series in &mut self.user_series {
            series.commit();
        }
        for series in &mut self.flag_series {
            series.commit();
        }
        self.bar_state = BarState::Confirmed;
    }

    /// Discard every staged value. Called when the strategy fails on a bar.
    pub fn rollback_all(&mut self) {
        self.open.rollback();
        self.high.rollback();
        self.low.rollback();
        self.close.rollback();
        self.volume.rollback();
        self.time.rollback();
        for series in &mut self.user_series {
            series.rollback();
        }
        for series in &mut self.flag_series {
            series.rollback();
        }
    }
}
