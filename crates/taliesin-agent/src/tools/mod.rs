//! Built-in tools.

pub mod market;
pub mod search;

pub use market::{
    HttpMarketData, IndicatorRequest, MarketDataApi, MarketDataConfig, MarketDataTool,
    MarketParams, MockMarketData,
};
pub use search::{
    HttpSearchIndex, MockSearchIndex, SearchIndex, SearchIndexConfig, SearchParams, SearchQuery,
    SearchSummaryTool, lucene_clause,
};
