//! Lookup commands: `search` and `regions`.

use std::io::Write;

use clap::Parser;
use log::debug;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use scoop_core::{GeoPoint, KeywordSearch, KeywordSearchRequest, KeywordSearchResult};
use scoop_data::geocoding::{KakaoKeywordSearch, RegionCodeClient, RegionCodeClientConfig};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_KAKAO_KEY, ARG_LATITUDE, ARG_LONGITUDE, ARG_PATTERN, ARG_QUERY, ARG_RADIUS, CliError,
    require, runtime, write_json,
};

pub(crate) const ENV_SEARCH_QUERY: &str = "SCOOP_CMDS_SEARCH_QUERY";
pub(crate) const ENV_SEARCH_LATITUDE: &str = "SCOOP_CMDS_SEARCH_LATITUDE";
pub(crate) const ENV_SEARCH_LONGITUDE: &str = "SCOOP_CMDS_SEARCH_LONGITUDE";
pub(crate) const ENV_SEARCH_KAKAO_KEY: &str = "SCOOP_CMDS_SEARCH_KAKAO_KEY";
pub(crate) const ENV_REGIONS_PATTERN: &str = "SCOOP_CMDS_REGIONS_PATTERN";

/// Kakao accepts radii up to 20 km.
const MAX_SEARCH_RADIUS_M: u32 = 20_000;
const DEFAULT_SEARCH_RADIUS_M: u32 = 1_000;

/// CLI arguments for the `search` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Search places by keyword around a coordinate using the \
                 Kakao Local API. The REST API key can come from a flag, a \
                 configuration file or the environment. No local review \
                 storage is opened.",
    about = "Search places by keyword around a coordinate"
)]
#[ortho_config(prefix = "SCOOP")]
pub(crate) struct SearchArgs {
    /// Search keyword.
    #[arg(value_name = "query")]
    #[serde(default)]
    pub(crate) query: Option<String>,
    /// Latitude of the search centre in degrees.
    #[arg(long = ARG_LATITUDE, value_name = "deg", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) latitude: Option<f64>,
    /// Longitude of the search centre in degrees.
    #[arg(long = ARG_LONGITUDE, value_name = "deg", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) longitude: Option<f64>,
    /// Search radius in metres (defaults to 1000, at most 20000).
    #[arg(long = ARG_RADIUS, value_name = "m")]
    #[serde(default)]
    pub(crate) radius: Option<u32>,
    /// Kakao REST API key.
    #[arg(long = ARG_KAKAO_KEY, value_name = "key")]
    #[serde(default)]
    pub(crate) kakao_key: Option<String>,
}

/// Resolved `search` configuration.
#[derive(Clone, PartialEq)]
pub(crate) struct SearchConfig {
    pub(crate) query: String,
    pub(crate) center: GeoPoint,
    pub(crate) radius: u32,
    pub(crate) kakao_key: String,
}

impl std::fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchConfig")
            .field("query", &self.query)
            .field("center", &self.center)
            .field("radius", &self.radius)
            .field("kakao_key", &"<redacted>")
            .finish()
    }
}

impl TryFrom<SearchArgs> for SearchConfig {
    type Error = CliError;

    fn try_from(args: SearchArgs) -> Result<Self, Self::Error> {
        let query = require(args.query, ARG_QUERY, ENV_SEARCH_QUERY)?;
        let latitude = require(args.latitude, ARG_LATITUDE, ENV_SEARCH_LATITUDE)?;
        let longitude = require(args.longitude, ARG_LONGITUDE, ENV_SEARCH_LONGITUDE)?;
        let kakao_key = require(args.kakao_key, ARG_KAKAO_KEY, ENV_SEARCH_KAKAO_KEY)?;
        Ok(Self {
            query,
            center: GeoPoint::new(latitude, longitude)?,
            radius: args
                .radius
                .unwrap_or(DEFAULT_SEARCH_RADIUS_M)
                .min(MAX_SEARCH_RADIUS_M),
            kakao_key,
        })
    }
}

/// CLI arguments for the `regions` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(about = "Look up administrative region codes by name pattern")]
#[ortho_config(prefix = "SCOOP")]
pub(crate) struct RegionsArgs {
    /// Region name pattern, `*` matching anything (for example `서울특별시 *`).
    #[arg(value_name = "pattern")]
    #[serde(default)]
    pub(crate) pattern: Option<String>,
}

pub(super) fn run_search(args: SearchArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let config = SearchConfig::try_from(merged)?;
    let client = KakaoKeywordSearch::new(config.kakao_key.as_str())?;
    let result = runtime()?.block_on(execute_search(&client, &config))?;
    write_json(writer, &result)
}

/// Run the keyword search against `search`, forwarding the centre as
/// decimal strings.
pub(super) async fn execute_search<S: KeywordSearch>(
    search: &S,
    config: &SearchConfig,
) -> Result<KeywordSearchResult, CliError> {
    let request =
        KeywordSearchRequest::around(config.query.as_str(), config.center, config.radius);
    debug!(
        "event=keyword_search query={} x={} y={} radius={}",
        request.query, request.longitude, request.latitude, request.radius
    );
    Ok(search.search(&request).await?)
}

pub(super) fn run_regions(args: RegionsArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let pattern = require(merged.pattern, ARG_PATTERN, ENV_REGIONS_PATTERN)?;
    let client = RegionCodeClient::with_config(RegionCodeClientConfig::default())?;
    let response = runtime()?.block_on(client.region_codes(&pattern))?;
    write_json(writer, &response)
}
