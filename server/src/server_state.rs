use std::sync::Arc;

use travel_log_data_management::{route::GeoJsonRouteRenderer, DataManager};

use crate::{suggestions::SuggestionService, tracking::{ChannelSource, TrackerHandle}};

pub struct ServerState {
    pub data_manager: DataManager,
    pub tracker: TrackerHandle,
    // Device positions pushed over HTTP or the feed land here.
    pub source: ChannelSource,
    pub suggestions: Arc<dyn SuggestionService>,
    pub renderer: GeoJsonRouteRenderer,
}
