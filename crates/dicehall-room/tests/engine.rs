//! Engine tests driven through `EngineHandle`.
//!
//! Time is paused, so countdowns advance only when every task is idle
//! or when a test moves the clock. `room_count()` doubles as a barrier:
//! its reply comes back after every earlier command has been applied.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use dicehall_dice::{HouseLedger, ScriptedOutcomes};
use dicehall_protocol::Color::*;
use dicehall_protocol::{BetSelection, ClientEvent, Color, Outcome, RoomCode, ServerEvent};
use dicehall_room::{EngineHandle, RoomConfig, RoomState, spawn_engine};
use dicehall_transport::ConnectionId;
use tokio::sync::mpsc;
use tokio::time;

// =========================================================================
// Helpers
// =========================================================================

struct Client {
    conn: ConnectionId,
    rx: mpsc::UnboundedReceiver<ServerEvent>,
}

impl Client {
    async fn connect(engine: &EngineHandle, id: u64) -> Self {
        let conn = ConnectionId::new(id);
        let (tx, rx) = mpsc::unbounded_channel();
        engine.connect(conn, tx).await.unwrap();
        Self { conn, rx }
    }

    async fn send(&self, engine: &EngineHandle, event: ClientEvent) {
        engine.dispatch(self.conn, event).await.unwrap();
    }

    /// Waits for the first event `pick` accepts, skipping the rest.
    async fn expect<T>(&mut self, mut pick: impl FnMut(ServerEvent) -> Option<T>) -> T {
        let wait = async {
            loop {
                let event = self.rx.recv().await.expect("outbox closed");
                if let Some(found) = pick(event) {
                    return found;
                }
            }
        };
        time::timeout(Duration::from_secs(600), wait)
            .await
            .expect("expected event never arrived")
    }

    /// Everything delivered so far.
    fn drain(&mut self) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }
}

fn scripted(outcomes: Vec<Outcome>) -> (ScriptedOutcomes, Arc<AtomicUsize>) {
    let source = ScriptedOutcomes::new(outcomes);
    let rolls = source.roll_counter();
    (source, rolls)
}

fn engine_with(
    config: RoomConfig,
    outcome: Outcome,
) -> (EngineHandle, Arc<AtomicUsize>, Arc<HouseLedger>) {
    let (source, rolls) = scripted(vec![outcome]);
    let ledger = Arc::new(HouseLedger::new(10_000.0));
    let engine = spawn_engine(config, source, Arc::clone(&ledger));
    (engine, rolls, ledger)
}

fn engine() -> EngineHandle {
    engine_with(RoomConfig::default(), Outcome([Red, Blue, Pink])).0
}

fn short_window(secs: u32) -> RoomConfig {
    RoomConfig {
        betting_window_secs: secs,
        ..RoomConfig::default()
    }
}

async fn barrier(engine: &EngineHandle) -> usize {
    engine.room_count().await.unwrap()
}

async fn create(engine: &EngineHandle, host: &mut Client) -> RoomCode {
    host.send(engine, ClientEvent::CreateRoom).await;
    host.expect(|e| match e {
        ServerEvent::RoomCreated(code) => Some(code),
        _ => None,
    })
    .await
}

async fn join(engine: &EngineHandle, client: &mut Client, code: &RoomCode) {
    client.send(engine, ClientEvent::JoinRoom(code.clone())).await;
    client
        .expect(|e| matches!(e, ServerEvent::RoomJoined(_)).then_some(()))
        .await;
}

fn ready(code: &RoomCode, colors: &[Color], amount: f64) -> ClientEvent {
    ClientEvent::PlayerReady {
        code: code.clone(),
        bet: BetSelection::new(colors.to_vec(), amount),
    }
}

fn count<F: Fn(&ServerEvent) -> bool>(events: &[ServerEvent], f: F) -> usize {
    events.iter().filter(|e| f(e)).count()
}

// =========================================================================
// Membership
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_create_room_sends_code_then_update() {
    let engine = engine();
    let mut host = Client::connect(&engine, 1).await;
    let code = create(&engine, &mut host).await;

    let snapshot = host
        .expect(|e| match e {
            ServerEvent::RoomUpdate(s) => Some(s),
            _ => None,
        })
        .await;
    assert_eq!(snapshot.code, code);
    assert_eq!(snapshot.state, RoomState::Waiting);
    assert_eq!(snapshot.players.len(), 1);
    assert!(snapshot.players[0].is_host);
    assert_eq!(barrier(&engine).await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_join_room_unknown_code_join_error() {
    let engine = engine();
    let mut client = Client::connect(&engine, 1).await;
    client
        .send(&engine, ClientEvent::JoinRoom(RoomCode::from("999999")))
        .await;

    let reason = client
        .expect(|e| match e {
            ServerEvent::JoinError(reason) => Some(reason),
            _ => None,
        })
        .await;
    assert_eq!(reason, "Room not found");
    assert_eq!(barrier(&engine).await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_join_room_seventh_join_room_full() {
    let engine = engine();
    let mut host = Client::connect(&engine, 1).await;
    let code = create(&engine, &mut host).await;
    for id in 2..=6 {
        let mut c = Client::connect(&engine, id).await;
        join(&engine, &mut c, &code).await;
    }

    let mut seventh = Client::connect(&engine, 7).await;
    seventh.send(&engine, ClientEvent::JoinRoom(code.clone())).await;
    let reason = seventh
        .expect(|e| match e {
            ServerEvent::JoinError(reason) => Some(reason),
            _ => None,
        })
        .await;
    assert_eq!(reason, "Room is full");

    let snapshot = engine.snapshot(code).await.unwrap().unwrap();
    assert_eq!(snapshot.players.len(), 6);
    assert!(snapshot.players.iter().all(|p| p.id.0 != 7));
}

#[tokio::test(start_paused = true)]
async fn test_join_room_broadcasts_update_to_members_only() {
    let engine = engine();
    let mut host = Client::connect(&engine, 1).await;
    let mut outsider = Client::connect(&engine, 3).await;
    let code = create(&engine, &mut host).await;
    let _other_room = create(&engine, &mut outsider).await;
    barrier(&engine).await;
    host.drain();
    outsider.drain();

    let mut guest = Client::connect(&engine, 2).await;
    join(&engine, &mut guest, &code).await;
    barrier(&engine).await;

    let host_events = host.drain();
    assert_eq!(
        count(&host_events, |e| matches!(e, ServerEvent::RoomUpdate(s) if s.players.len() == 2)),
        1
    );
    assert!(outsider.drain().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_all_players_zero_rooms() {
    let engine = engine();
    let mut host = Client::connect(&engine, 1).await;
    let code = create(&engine, &mut host).await;
    let mut a = Client::connect(&engine, 2).await;
    let mut b = Client::connect(&engine, 3).await;
    join(&engine, &mut a, &code).await;
    join(&engine, &mut b, &code).await;
    assert_eq!(barrier(&engine).await, 1);

    engine.disconnect(host.conn).await.unwrap();
    let snapshot = engine.snapshot(code.clone()).await.unwrap().unwrap();
    assert_eq!(snapshot.players.len(), 2);
    assert!(snapshot.players[0].is_host, "next in line becomes host");

    engine.disconnect(a.conn).await.unwrap();
    engine.disconnect(b.conn).await.unwrap();
    assert_eq!(barrier(&engine).await, 0);
    assert_eq!(engine.snapshot(code).await.unwrap(), None);
}

#[tokio::test(start_paused = true)]
async fn test_create_room_while_in_room_leaves_old_room() {
    let engine = engine();
    let mut host = Client::connect(&engine, 1).await;
    let first = create(&engine, &mut host).await;
    let second = create(&engine, &mut host).await;

    assert_ne!(first, second);
    assert_eq!(barrier(&engine).await, 1);
    assert_eq!(engine.snapshot(first).await.unwrap(), None);
}

#[tokio::test(start_paused = true)]
async fn test_failed_join_keeps_current_membership() {
    let engine = engine();
    let mut host = Client::connect(&engine, 1).await;
    let code = create(&engine, &mut host).await;

    host.send(&engine, ClientEvent::JoinRoom(RoomCode::from("000001")))
        .await;
    host.expect(|e| matches!(e, ServerEvent::JoinError(_)).then_some(()))
        .await;

    let snapshot = engine.snapshot(code).await.unwrap().unwrap();
    assert_eq!(snapshot.players.len(), 1);
}

// =========================================================================
// Rounds
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_start_game_twice_one_broadcast_one_timer() {
    let engine = engine();
    let mut host = Client::connect(&engine, 1).await;
    let code = create(&engine, &mut host).await;

    host.send(&engine, ClientEvent::StartGame(code.clone())).await;
    host.send(&engine, ClientEvent::StartGame(code.clone())).await;
    barrier(&engine).await;
    let events = host.drain();
    assert_eq!(count(&events, |e| matches!(e, ServerEvent::GameStarted(_))), 1);

    time::sleep(Duration::from_millis(1_500)).await;
    barrier(&engine).await;
    let events = host.drain();
    assert_eq!(events, vec![ServerEvent::TimerUpdate(59)]);
}

#[tokio::test(start_paused = true)]
async fn test_start_game_by_non_member_ignored() {
    let engine = engine();
    let mut host = Client::connect(&engine, 1).await;
    let stranger = Client::connect(&engine, 2).await;
    let code = create(&engine, &mut host).await;

    stranger
        .send(&engine, ClientEvent::StartGame(code.clone()))
        .await;
    let snapshot = engine.snapshot(code).await.unwrap().unwrap();
    assert_eq!(snapshot.state, RoomState::Waiting);
}

#[tokio::test(start_paused = true)]
async fn test_any_member_may_start_game() {
    let engine = engine();
    let mut host = Client::connect(&engine, 1).await;
    let code = create(&engine, &mut host).await;
    let mut guest = Client::connect(&engine, 2).await;
    join(&engine, &mut guest, &code).await;

    guest.send(&engine, ClientEvent::StartGame(code.clone())).await;
    host.expect(|e| matches!(e, ServerEvent::GameStarted(_)).then_some(()))
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_countdown_expiry_rolls_and_excludes_unready() {
    let (engine, rolls, _) = engine_with(short_window(3), Outcome([Red, Blue, Pink]));
    let mut host = Client::connect(&engine, 1).await;
    let code = create(&engine, &mut host).await;
    let mut guest = Client::connect(&engine, 2).await;
    join(&engine, &mut guest, &code).await;

    host.send(&engine, ClientEvent::StartGame(code.clone())).await;
    host.send(&engine, ready(&code, &[Red], 100.0)).await;
    barrier(&engine).await;
    host.drain();

    let (outcome, results) = guest
        .expect(|e| match e {
            ServerEvent::DiceRolled { outcome, results, .. } => Some((outcome, results)),
            _ => None,
        })
        .await;
    assert_eq!(outcome, Outcome([Red, Blue, Pink]));
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].player.0, 1);
    assert!((results[0].net_winnings - 104.0).abs() < 1e-9);
    assert_eq!(rolls.load(Ordering::SeqCst), 1);

    let ticks: Vec<_> = host
        .drain()
        .into_iter()
        .filter_map(|e| match e {
            ServerEvent::TimerUpdate(n) => Some(n),
            _ => None,
        })
        .collect();
    assert_eq!(ticks, vec![2, 1, 0]);
}

#[tokio::test(start_paused = true)]
async fn test_all_ready_rolls_immediately_and_stops_timer() {
    let (engine, rolls, _) = engine_with(RoomConfig::default(), Outcome([Red, Red, Red]));
    let mut host = Client::connect(&engine, 1).await;
    let code = create(&engine, &mut host).await;
    let mut guest = Client::connect(&engine, 2).await;
    join(&engine, &mut guest, &code).await;

    host.send(&engine, ClientEvent::StartGame(code.clone())).await;
    host.send(&engine, ready(&code, &[Red], 10.0)).await;
    guest.send(&engine, ready(&code, &[Blue], 10.0)).await;

    let room = guest
        .expect(|e| match e {
            ServerEvent::DiceRolled { room, .. } => Some(room),
            _ => None,
        })
        .await;
    assert_eq!(room.state, RoomState::Results);
    assert_eq!(room.round, 1);

    // No more ticks once the round has rolled.
    time::sleep(Duration::from_secs(90)).await;
    barrier(&engine).await;
    assert!(
        guest
            .drain()
            .iter()
            .all(|e| !matches!(e, ServerEvent::TimerUpdate(_) | ServerEvent::DiceRolled { .. }))
    );
    assert_eq!(rolls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_ready_at_timer_expiry_rolls_exactly_once() {
    let (engine, rolls, _) = engine_with(short_window(1), Outcome([Green, Green, Orange]));
    let mut host = Client::connect(&engine, 1).await;
    let code = create(&engine, &mut host).await;
    let mut guest = Client::connect(&engine, 2).await;
    join(&engine, &mut guest, &code).await;

    host.send(&engine, ClientEvent::StartGame(code.clone())).await;
    host.send(&engine, ready(&code, &[Green], 10.0)).await;
    barrier(&engine).await;

    // The last bet and the final tick land together.
    time::advance(Duration::from_secs(1)).await;
    guest.send(&engine, ready(&code, &[Orange], 10.0)).await;
    barrier(&engine).await;
    time::sleep(Duration::from_secs(5)).await;
    barrier(&engine).await;

    assert_eq!(rolls.load(Ordering::SeqCst), 1);
    let events = host.drain();
    assert_eq!(
        count(&events, |e| matches!(e, ServerEvent::DiceRolled { .. })),
        1
    );
    let snapshot = engine.snapshot(code).await.unwrap().unwrap();
    assert_eq!(snapshot.round, 1);
}

#[tokio::test(start_paused = true)]
async fn test_timer_after_room_destroyed_is_dropped() {
    let (engine, rolls, _) = engine_with(short_window(2), Outcome([Red, Blue, Pink]));
    let mut host = Client::connect(&engine, 1).await;
    let code = create(&engine, &mut host).await;

    host.send(&engine, ClientEvent::StartGame(code.clone())).await;
    host.send(&engine, ClientEvent::LeaveRoom(code)).await;
    assert_eq!(barrier(&engine).await, 0);

    time::sleep(Duration::from_secs(10)).await;
    assert_eq!(barrier(&engine).await, 0);
    assert_eq!(rolls.load(Ordering::SeqCst), 0);

    // The engine keeps serving after the stale timer.
    let mut next = Client::connect(&engine, 2).await;
    create(&engine, &mut next).await;
    assert_eq!(barrier(&engine).await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_player_ready_outside_betting_ignored() {
    let engine = engine();
    let mut host = Client::connect(&engine, 1).await;
    let code = create(&engine, &mut host).await;

    host.send(&engine, ready(&code, &[Red], 10.0)).await;
    let snapshot = engine.snapshot(code).await.unwrap().unwrap();
    assert!(!snapshot.players[0].ready);
    assert!(snapshot.players[0].bet_data.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_invalid_bet_rejected_to_requester_only() {
    let engine = engine();
    let mut host = Client::connect(&engine, 1).await;
    let code = create(&engine, &mut host).await;
    let mut guest = Client::connect(&engine, 2).await;
    join(&engine, &mut guest, &code).await;
    host.send(&engine, ClientEvent::StartGame(code.clone())).await;
    barrier(&engine).await;
    host.drain();
    guest.drain();

    guest
        .send(&engine, ready(&code, &[Red, Blue, Pink, Green], 10.0))
        .await;
    barrier(&engine).await;

    let guest_events = guest.drain();
    assert_eq!(
        count(&guest_events, |e| matches!(e, ServerEvent::BetRejected(_))),
        1
    );
    assert!(
        host.drain()
            .iter()
            .all(|e| !matches!(e, ServerEvent::BetRejected(_)))
    );
    let snapshot = engine.snapshot(code).await.unwrap().unwrap();
    assert!(!snapshot.players[1].ready);
}

#[tokio::test(start_paused = true)]
async fn test_overflowing_bet_rejected_and_round_results_stay_finite() {
    let (engine, _, _) = engine_with(RoomConfig::default(), Outcome([Red, Green, Pink]));
    let mut host = Client::connect(&engine, 1).await;
    let code = create(&engine, &mut host).await;
    let mut guest = Client::connect(&engine, 2).await;
    join(&engine, &mut guest, &code).await;
    host.send(&engine, ClientEvent::StartGame(code.clone())).await;
    barrier(&engine).await;
    host.drain();
    guest.drain();

    guest.send(&engine, ready(&code, &[Red, Blue], 1e308)).await;
    barrier(&engine).await;
    assert_eq!(
        count(&guest.drain(), |e| matches!(e, ServerEvent::BetRejected(_))),
        1
    );

    // The guest never became ready, so the host alone decides the round.
    host.send(&engine, ready(&code, &[Red], 10.0)).await;
    let results = host
        .expect(|e| match e {
            ServerEvent::DiceRolled { results, .. } => Some(results),
            _ => None,
        })
        .await;
    assert_eq!(results.len(), 1);
    assert!(results[0].total_return.is_finite());
    assert!(results[0].net_winnings.is_finite());
}

#[tokio::test(start_paused = true)]
async fn test_leave_during_betting_rolls_when_rest_ready() {
    let (engine, rolls, _) = engine_with(RoomConfig::default(), Outcome([Red, Blue, Pink]));
    let mut host = Client::connect(&engine, 1).await;
    let code = create(&engine, &mut host).await;
    let mut guest = Client::connect(&engine, 2).await;
    join(&engine, &mut guest, &code).await;

    host.send(&engine, ClientEvent::StartGame(code.clone())).await;
    host.send(&engine, ready(&code, &[Red], 10.0)).await;
    guest.send(&engine, ClientEvent::LeaveRoom(code.clone())).await;

    host.expect(|e| matches!(e, ServerEvent::DiceRolled { .. }).then_some(()))
        .await;
    assert_eq!(rolls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_next_round_clears_previous_bets() {
    let (engine, _, _) = engine_with(short_window(2), Outcome([Red, Blue, Pink]));
    let mut host = Client::connect(&engine, 1).await;
    let code = create(&engine, &mut host).await;

    host.send(&engine, ClientEvent::StartGame(code.clone())).await;
    host.send(&engine, ready(&code, &[Red], 10.0)).await;
    host.expect(|e| matches!(e, ServerEvent::DiceRolled { .. }).then_some(()))
        .await;

    host.send(&engine, ClientEvent::StartGame(code.clone())).await;
    let started = host
        .expect(|e| match e {
            ServerEvent::GameStarted(s) => Some(s),
            _ => None,
        })
        .await;
    assert!(started.players.iter().all(|p| !p.ready && p.bet_data.is_none()));
    assert_eq!(started.time_left, 2);

    // Nobody bets, so the old bet is not settled again.
    let (round, results) = host
        .expect(|e| match e {
            ServerEvent::DiceRolled { room, results, .. } => Some((room.round, results)),
            _ => None,
        })
        .await;
    assert_eq!(round, 2);
    assert!(results.is_empty());
}

// =========================================================================
// Payouts
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_winning_bet_with_wallet_is_paid_to_that_player() {
    let (engine, _, ledger) = engine_with(RoomConfig::default(), Outcome([Red, Red, Red]));
    let mut host = Client::connect(&engine, 1).await;
    let code = create(&engine, &mut host).await;
    let mut guest = Client::connect(&engine, 2).await;
    join(&engine, &mut guest, &code).await;

    host.send(&engine, ClientEvent::StartGame(code.clone())).await;
    let mut bet = BetSelection::new(vec![Red], 100.0);
    bet.wallet = Some("host-wallet".to_owned());
    host.send(
        &engine,
        ClientEvent::PlayerReady {
            code: code.clone(),
            bet,
        },
    )
    .await;
    guest.send(&engine, ready(&code, &[Blue], 10.0)).await;

    let (round, reference, amount) = host
        .expect(|e| match e {
            ServerEvent::PayoutSettled {
                round,
                reference,
                amount,
            } => Some((round, reference, amount)),
            _ => None,
        })
        .await;
    assert_eq!(round, 1);
    assert_eq!(reference, "tx-000001");
    assert!((amount - 550.0).abs() < 1e-9);
    assert!((ledger.balance().await - 9_450.0).abs() < 1e-9);

    barrier(&engine).await;
    assert!(guest.drain().iter().all(|e| !matches!(
        e,
        ServerEvent::PayoutSettled { .. } | ServerEvent::PayoutFailed { .. }
    )));
}

#[tokio::test(start_paused = true)]
async fn test_payout_beyond_house_balance_reports_failure() {
    let (source, _) = scripted(vec![Outcome([Red, Red, Red])]);
    let ledger = Arc::new(HouseLedger::new(100.0));
    let engine = spawn_engine(RoomConfig::default(), source, Arc::clone(&ledger));
    let mut host = Client::connect(&engine, 1).await;
    let code = create(&engine, &mut host).await;

    host.send(&engine, ClientEvent::StartGame(code.clone())).await;
    let mut bet = BetSelection::new(vec![Red], 100.0);
    bet.wallet = Some("host-wallet".to_owned());
    host.send(&engine, ClientEvent::PlayerReady { code, bet }).await;

    let round = host
        .expect(|e| match e {
            ServerEvent::PayoutFailed { round, .. } => Some(round),
            _ => None,
        })
        .await;
    assert_eq!(round, 1);
    assert!(ledger.transfers().await.is_empty());
}
