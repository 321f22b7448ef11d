//! End-to-end game flow through the public library API, on a paused clock.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use gridclash::config::TimingConfig;
use gridclash::game::{
    ConnectionId, Coord, GameEngine, GenerationParams, MoveRequest, SessionKey, SessionRegistry,
    SessionSnapshot, Team, Ticker,
};
use gridclash::protocol::ServerEvent;

fn corners_only(size: usize) -> GenerationParams {
    GenerationParams {
        size,
        spawn_ratio: 0.0,
        center_block_probability: 0.0,
        edge_midpoint_probability: 0.0,
    }
}

async fn next_end_move(rx: &mut broadcast::Receiver<ServerEvent>) -> SessionSnapshot {
    loop {
        if let ServerEvent::EndMove { state, .. } = rx.recv().await.unwrap() {
            return state;
        }
    }
}

fn owner(state: &SessionSnapshot, row: usize, col: usize) -> Option<Team> {
    state.board.get(Coord::new(row, col)).unwrap().owner
}

#[tokio::test(start_paused = true)]
async fn home_corner_capture_cascades_across_the_board() {
    let registry = Arc::new(SessionRegistry::new(corners_only(4)));
    let engine = GameEngine::new(Arc::clone(&registry), TimingConfig::default());
    let cancel = CancellationToken::new();
    let ticker = Ticker::spawn(Arc::clone(&registry), Duration::from_secs(1), cancel.clone());

    let key = SessionKey::from("apple");
    let red = ConnectionId(1);
    let blue = ConnectionId(2);
    let mut events = engine.join(&key, red, "ada".into(), Team::Red).await.events;
    engine.join(&key, blue, "bo".into(), Team::Blue).await;

    tokio::time::sleep(Duration::from_millis(3500)).await;

    // Blue takes yellow's home corner and inherits everything yellow held.
    engine
        .submit_move(
            &key,
            blue,
            MoveRequest {
                from: Coord::new(0, 3),
                to: Coord::new(3, 3),
                troops: 50,
                team: Team::Blue,
            },
        )
        .await
        .unwrap();
    let state = next_end_move(&mut events).await;
    assert_eq!(owner(&state, 3, 3), Some(Team::Blue));

    // Red then takes blue's home corner; blue's holdings pass to red.
    engine
        .submit_move(
            &key,
            red,
            MoveRequest {
                from: Coord::new(0, 0),
                to: Coord::new(0, 3),
                troops: 100,
                team: Team::Red,
            },
        )
        .await
        .unwrap();
    let state = next_end_move(&mut events).await;
    assert_eq!(owner(&state, 0, 0), Some(Team::Red));
    assert_eq!(owner(&state, 0, 3), Some(Team::Red));
    assert_eq!(owner(&state, 3, 3), Some(Team::Red));
    assert_eq!(owner(&state, 3, 0), Some(Team::Green));
    assert_eq!(state.moves.len(), 2);

    // Captured corners keep generating for their new owner.
    let before = state.board.get(Coord::new(3, 3)).unwrap().troops;
    tokio::time::sleep(Duration::from_secs(2)).await;
    let session = registry.lookup(&key).unwrap();
    let after = session.snapshot().await.board.get(Coord::new(3, 3)).unwrap().troops;
    assert!(after >= before + 1, "before={before} after={after}");

    cancel.cancel();
    ticker.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn pause_freezes_generation_and_landing() {
    let registry = Arc::new(SessionRegistry::new(corners_only(4)));
    let engine = GameEngine::new(Arc::clone(&registry), TimingConfig::default());
    let cancel = CancellationToken::new();
    let ticker = Ticker::spawn(Arc::clone(&registry), Duration::from_secs(1), cancel.clone());

    let key = SessionKey::from("banana");
    let joined = engine
        .join(&key, ConnectionId(1), "ada".into(), Team::Green)
        .await;
    let mut events = joined.events;

    engine
        .submit_move(
            &key,
            ConnectionId(1),
            MoveRequest {
                from: Coord::new(3, 0),
                to: Coord::new(3, 3),
                troops: 1,
                team: Team::Green,
            },
        )
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(engine.toggle_pause(&key).await, Some(true));

    let frozen = joined.session.snapshot().await;
    tokio::time::sleep(Duration::from_secs(20)).await;
    let still = joined.session.snapshot().await;
    assert_eq!(frozen.board, still.board);
    assert!(still.moves.is_empty());

    assert_eq!(engine.toggle_pause(&key).await, Some(false));
    let state = next_end_move(&mut events).await;
    assert_eq!(state.moves.len(), 1);

    cancel.cancel();
    ticker.await.unwrap();
}
