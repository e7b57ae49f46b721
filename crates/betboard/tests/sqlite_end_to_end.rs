mod common;

use alloy_primitives::U256;
use betboard::{
    BetBoard, BetState, EntityStore, EventPosition, IndexerConfig, JsonLinesSource, StoreConfig,
    VecSource,
};
use common::*;
use std::io::Write;
use tempfile::TempDir;

fn open_board(dir: &TempDir) -> BetBoard {
    let config = IndexerConfig::default()
        .with_contract_address(board())
        .with_store(StoreConfig::new(dir.path().join("board.db")));
    BetBoard::open_with_config(config).unwrap()
}

fn season() -> Chain {
    let day_start = (GENESIS_TIME / DAY + 3) * DAY;
    let mut chain = Chain::new();
    chain.create(1, "Ajax v PSV", day_start + 3_600);
    chain.create(2, "Ajax v PSV", day_start + 7_200);
    chain.create_in(3, "Barcelona v Sevilla", day_start, "La Liga");
    chain.place(1);
    chain.place(2);
    chain.vote(2, creator(), 1);
    chain.dispute(1, 11);
    chain.evidence(1, backer(), "/ipfs/QmBacker");
    chain.meta_evidence(1, "/ipfs/QmMeta");
    chain.rule(11, 2);
    chain
}

#[test]
fn replay_projects_into_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let chain = season();
    let board_db = open_board(&dir);

    let mut processor = board_db
        .processor(chain.state.clone(), VecSource::new(chain.logs.clone()))
        .build()
        .unwrap();
    let stats = processor.drain().unwrap();
    assert_eq!(stats.applied, chain.logs.len());
    assert_eq!(stats.dead_lettered, 0);

    let store = board_db.store();
    let bet1 = store.load_bet("0x1").unwrap().unwrap();
    assert_eq!(bet1.state, BetState::Agreement);
    assert_eq!(bet1.outcome, Some(2));
    assert_eq!(bet1.dispute_id, Some(U256::from(11)));
    assert!(bet1.backer_provided_evidence);
    assert_eq!(bet1.evidence, vec!["/ipfs/QmBacker"]);
    assert_eq!(bet1.meta_evidence.as_deref(), Some("/ipfs/QmMeta"));

    let bet2 = store.load_bet("0x2").unwrap().unwrap();
    assert_eq!(bet2.state, BetState::Voting);
    assert!(bet2.creator_has_voted);
    assert_eq!(bet1.event, bet2.event);

    let members = store.bets_for_fixture(&bet1.event).unwrap();
    let ids: Vec<_> = members.iter().map(|b| b.id.as_str()).collect();
    assert_eq!(ids, vec!["0x1", "0x2"]);

    let fixtures = store.fixtures_for_league("NL|football|Eredivisie").unwrap();
    assert_eq!(fixtures.len(), 1);
    assert_eq!(store.fixtures_for_league("NL|football|La Liga").unwrap().len(), 1);

    assert_eq!(store.bets_for_account(backer()).unwrap().len(), 2);
    assert_eq!(store.bets_for_account(creator()).unwrap().len(), 3);

    let status = board_db.status().unwrap();
    assert_eq!(status.cursor, Some(EventPosition::new(chain.block(), 0, 0)));
    assert_eq!(status.counts.bets, 3);
    assert_eq!(status.counts.fixtures, 2);
    assert_eq!(status.counts.leagues, 2);
    assert_eq!(status.dead_letters, 0);
}

#[test]
fn restart_over_the_same_log_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let chain = season();

    let before = {
        let board_db = open_board(&dir);
        board_db
            .processor(chain.state.clone(), VecSource::new(chain.logs.clone()))
            .build()
            .unwrap()
            .drain()
            .unwrap();
        board_db.store().load_bet("0x1").unwrap().unwrap()
    };

    let board_db = open_board(&dir);
    let stats = board_db
        .processor(chain.state.clone(), VecSource::new(chain.logs.clone()))
        .build()
        .unwrap()
        .drain()
        .unwrap();

    assert_eq!(stats.applied, 0);
    assert_eq!(stats.skipped, chain.logs.len());
    assert_eq!(board_db.store().load_bet("0x1").unwrap().unwrap(), before);
}

#[test]
fn json_lines_file_drives_the_processor() {
    let dir = tempfile::tempdir().unwrap();
    let chain = season();
    let path = dir.path().join("logs.jsonl");
    let mut file = std::fs::File::create(&path).unwrap();
    for log in &chain.logs {
        writeln!(file, "{}", serde_json::to_string(log).unwrap()).unwrap();
    }
    file.flush().unwrap();

    let board_db = open_board(&dir);
    let stats = board_db
        .processor(chain.state.clone(), JsonLinesSource::open(&path).unwrap())
        .with_batch_size(3)
        .build()
        .unwrap()
        .drain()
        .unwrap();

    assert_eq!(stats.applied, chain.logs.len());
    assert_eq!(board_db.status().unwrap().counts.bets, 3);
}
