use anyhow::{Context, Result, anyhow};
use reqwest::blocking::Client;

use crate::config::FeedConfig;
use crate::participant::{Participant, parse_participants_json};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderModule {
    Results,
    StartList,
}

impl ProviderModule {
    pub fn as_param(self) -> &'static str {
        match self {
            ProviderModule::Results => "results_posms",
            ProviderModule::StartList => "results_startlist",
        }
    }
}

pub fn fetch_distance(
    client: &Client,
    config: &FeedConfig,
    module: ProviderModule,
    distance: &str,
) -> Result<Vec<Participant>> {
    let params = query_params(config, module, distance);
    log::debug!(
        "GET {} module={} distance={} stage={}",
        config.api_url,
        module.as_param(),
        distance,
        config.stage
    );
    let body = get_text(client, &config.api_url, &params)
        .with_context(|| format!("fetch {} for {distance}", module.as_param()))?;
    parse_participants_json(&body).with_context(|| format!("decode {distance}"))
}

pub fn fetch_podium_html(client: &Client, config: &FeedConfig) -> Result<String> {
    let params = vec![("module", "podium".to_string())];
    get_text(client, &config.api_url, &params).context("fetch podium page")
}

/// Query string for one distance. The token is included only when configured;
/// test mode pins the season year.
pub fn query_params(
    config: &FeedConfig,
    module: ProviderModule,
    distance: &str,
) -> Vec<(&'static str, String)> {
    let mut params = vec![("module", module.as_param().to_string())];
    if let Some(token) = config.auth_token.as_deref() {
        params.push(("auth_token", token.to_string()));
    }
    params.push(("distance", distance.to_string()));
    params.push(("posms", config.stage.clone()));
    if config.test_mode {
        params.push(("gads", config.test_year.clone()));
    }
    params
}

fn get_text(client: &Client, url: &str, params: &[(&str, String)]) -> Result<String> {
    let resp = client.get(url).query(params).send().context("request failed")?;
    let status = resp.status();
    let body = resp.text().context("failed reading body")?;
    if !status.is_success() {
        return Err(anyhow!("http {}: {}", status, truncate(&body, 200)));
    }
    Ok(body)
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
