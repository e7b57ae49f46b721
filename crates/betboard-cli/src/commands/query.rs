//! Entity lookups, printed as JSON

use anyhow::{bail, Context, Result};
use betboard::{bet_key, prelude::*};
use serde_json::json;

fn open(config: IndexerConfig) -> Result<BetBoard> {
    BetBoard::open_with_config(config).context("Failed to open database")
}

pub fn bet(config: IndexerConfig, id: &str) -> Result<()> {
    let bet_id: U256 = id
        .parse()
        .with_context(|| format!("Invalid bet id '{}'", id))?;
    let board = open(config)?;

    let Some(bet) = board.store().load_bet(&bet_key(bet_id))? else {
        bail!("Bet {} not found", id);
    };
    println!("{}", serde_json::to_string_pretty(&bet)?);
    Ok(())
}

pub fn fixture(config: IndexerConfig, key: &str) -> Result<()> {
    let board = open(config)?;
    let store = board.store();

    let Some(fixture) = store.load_fixture(key)? else {
        bail!("Fixture '{}' not found", key);
    };
    let bets = store.bets_for_fixture(key)?;
    let output = json!({ "fixture": fixture, "bets": bets });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

pub fn league(config: IndexerConfig, key: &str) -> Result<()> {
    let board = open(config)?;
    let store = board.store();

    let Some(league) = store.load_league(key)? else {
        bail!("League '{}' not found", key);
    };
    let fixtures = store.fixtures_for_league(key)?;
    let output = json!({ "league": league, "fixtures": fixtures });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
