//! End-to-end tests: bytes in through the dispatcher, queued results out of
//! the router.

use std::sync::Arc;

use tokio::sync::mpsc;

use warroom_protocol::{
    encode_client_action, BioWeaponsRequest, ClientAction, ControllerId, InvItemRef, Phase,
    PieceKind, PiecePlaceRequest, RedirectTag, ServerMessage, ShopConfirmRequest, Slice, TeamId,
};
use warroom_server::gateway::NewSession;
use warroom_server::resources::{capability, inv_item, piece, shop_item};
use warroom_server::{
    ConnectionContext, ConnectionRegistry, Dispatcher, Game, Gateway, InitialSeed, MemoryGateway,
    Outgoing, Router, SessionKey,
};

struct World {
    gateway: Arc<MemoryGateway>,
    dispatcher: Dispatcher,
    outbox: mpsc::UnboundedReceiver<Outgoing>,
    game: Game,
}

impl World {
    async fn new(phase: Phase, slice: Slice) -> Self {
        let gateway = Arc::new(MemoryGateway::default());
        let gw = gateway.as_ref();
        let game = Game::create(
            gw,
            NewSession {
                id: None,
                section: "M2C".into(),
                instructor: "Rivera".into(),
                admin_password_hash: "$2b$10$abc".into(),
            },
        )
        .await
        .unwrap();
        gw.seed_session(game.id(), &InitialSeed::default())
            .await
            .unwrap();
        let game = game.set_active(gw, true).await.unwrap();
        let game = game.set_phase(gw, phase).await.unwrap();
        let game = game.set_slice(gw, slice).await.unwrap();

        let (router, outbox) = Router::new(ConnectionRegistry::new());
        let shared: Arc<dyn Gateway> = gateway.clone();
        Self {
            gateway,
            dispatcher: Dispatcher::new(shared, router),
            outbox,
            game,
        }
    }

    fn gw(&self) -> &MemoryGateway {
        self.gateway.as_ref()
    }

    fn connect(&self, client_id: u64, team: TeamId, controller: u8) -> ConnectionContext {
        let ctx = ConnectionContext {
            client_id,
            session: self.game.id(),
            team,
            controller: ControllerId::new(controller).unwrap(),
        };
        self.dispatcher.router().registry().register(ctx);
        ctx
    }

    async fn send(&self, client_id: u64, action: &ClientAction) {
        let bytes = encode_client_action(action).unwrap();
        self.dispatcher.dispatch_bytes(client_id, &bytes).await;
    }

    fn drain(&mut self) -> Vec<Outgoing> {
        let mut out = Vec::new();
        while let Ok(next) = self.outbox.try_recv() {
            out.push(next);
        }
        out
    }

    async fn snapshot(&self, team: TeamId) -> String {
        let game = Game::load(self.gw(), &SessionKey::Id(self.game.id()))
            .await
            .unwrap();
        let state = game
            .initial_state(self.gw(), team, ControllerId::PRIMARY)
            .await
            .unwrap();
        serde_json::to_string(&state).unwrap()
    }
}

#[tokio::test]
async fn shop_confirm_reaches_only_the_origin() {
    let mut world = World::new(Phase::PURCHASE_CONFIRM, Slice::PLANNING).await;
    let origin = world.connect(1, TeamId::ZERO, 0);
    world.connect(2, TeamId::ZERO, 1);
    world.connect(3, TeamId::ONE, 0);

    // Start from an empty inventory so the result holds exactly the purchases.
    for item in inv_item::all(world.gw(), origin.session, TeamId::ZERO)
        .await
        .unwrap()
    {
        inv_item::delete(world.gw(), item.id).await.unwrap();
    }
    let mut bought = Vec::new();
    for kind in [PieceKind::Destroyer, PieceKind::AttackHelicopter, PieceKind::MarineInfantry] {
        bought.push(
            shop_item::insert(world.gw(), origin.session, TeamId::ZERO, kind)
                .await
                .unwrap()
                .kind,
        );
    }

    world
        .send(1, &ClientAction::ShopConfirmPurchase(ShopConfirmRequest {}))
        .await;

    let out = world.drain();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].client_id, 1);
    let value = serde_json::to_value(&out[0].message).unwrap();
    assert_eq!(value["type"], "SHOP_TRANSFER");
    assert_eq!(value["payload"]["invItems"].as_array().unwrap().len(), 3);

    let mut kinds: Vec<_> = inv_item::all(world.gw(), origin.session, TeamId::ZERO)
        .await
        .unwrap()
        .into_iter()
        .map(|item| item.kind)
        .collect();
    kinds.sort();
    bought.sort();
    assert_eq!(kinds, bought);
    assert!(shop_item::all(world.gw(), origin.session, TeamId::ZERO)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn piece_place_on_foreign_item_redirects_without_mutation() {
    let mut world = World::new(Phase::REINFORCEMENT_PLACEMENT, Slice::PLANNING).await;
    world.connect(1, TeamId::ONE, 0);
    let foreign = inv_item::all(world.gw(), world.game.id(), TeamId::ZERO)
        .await
        .unwrap()
        .remove(0);
    let before = world.snapshot(TeamId::ZERO).await;

    world
        .send(
            1,
            &ClientAction::PiecePlace(PiecePlaceRequest {
                inv_item_id: Some(foreign.id),
                selected_position: Some(8),
            }),
        )
        .await;

    let out = world.drain();
    assert_eq!(out.len(), 1);
    assert_eq!(
        out[0].message,
        ServerMessage::ServerRedirect(RedirectTag::BadRequest)
    );
    assert_eq!(world.snapshot(TeamId::ZERO).await, before);
}

#[tokio::test]
async fn piece_place_reaches_each_teammate_once() {
    let mut world = World::new(Phase::REINFORCEMENT_PLACEMENT, Slice::PLANNING).await;
    world.connect(1, TeamId::ZERO, 0);
    world.connect(2, TeamId::ZERO, 1);
    world.connect(3, TeamId::ZERO, 2);
    world.connect(4, TeamId::ONE, 0);
    let item = inv_item::all(world.gw(), world.game.id(), TeamId::ZERO)
        .await
        .unwrap()
        .remove(0);

    world
        .send(
            2,
            &ClientAction::PiecePlace(PiecePlaceRequest {
                inv_item_id: Some(item.id),
                selected_position: Some(8),
            }),
        )
        .await;

    let mut receivers: Vec<_> = world
        .drain()
        .into_iter()
        .inspect(|out| assert_eq!(out.message.tag(), "PIECE_PLACE"))
        .map(|out| out.client_id)
        .collect();
    receivers.sort_unstable();
    assert_eq!(receivers, vec![1, 2, 3]);

    // The other team does not see the hidden piece either.
    let board = piece::visible_board(world.gw(), world.game.id(), TeamId::ONE)
        .await
        .unwrap();
    assert!(!board.values().flatten().any(|p| p.team == TeamId::ZERO && !p.visible));
}

#[tokio::test]
async fn bio_weapon_arms_once_per_position() {
    let mut world = World::new(Phase::CAPABILITY_PLACEMENT, Slice::PLANNING).await;
    let origin = world.connect(1, TeamId::ZERO, 0);
    world.connect(2, TeamId::ZERO, 1);
    let first = inv_item::insert(world.gw(), origin.session, TeamId::ZERO, PieceKind::BiologicalWeapons)
        .await
        .unwrap();
    let second = inv_item::insert(world.gw(), origin.session, TeamId::ZERO, PieceKind::BiologicalWeapons)
        .await
        .unwrap();
    let confirm = |id| {
        ClientAction::BiologicalWeaponsConfirm(BioWeaponsRequest {
            selected_position_id: Some(5),
            inv_item: Some(InvItemRef { inv_item_id: id }),
        })
    };

    world.send(1, &confirm(first.id)).await;
    let out = world.drain();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].client_id, 1);
    assert_eq!(out[0].message.tag(), "BIO_WEAPON_SELECTED");
    assert!(inv_item::load(world.gw(), first.id).await.unwrap().is_none());

    world.send(1, &confirm(second.id)).await;
    let out = world.drain();
    assert_eq!(out.len(), 1);
    assert!(matches!(out[0].message, ServerMessage::UserFeedback(_)));
    assert!(inv_item::load(world.gw(), second.id).await.unwrap().is_some());
    assert_eq!(
        capability::for_team(world.gw(), origin.session, TeamId::ZERO)
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn rejected_actions_leave_state_unchanged() {
    let mut world = World::new(Phase::NEWS, Slice::PLANNING).await;
    world.connect(1, TeamId::ZERO, 0);
    let item = inv_item::all(world.gw(), world.game.id(), TeamId::ZERO)
        .await
        .unwrap()
        .remove(0);
    let before = (
        world.snapshot(TeamId::ZERO).await,
        world.snapshot(TeamId::ONE).await,
    );

    let actions = [
        ClientAction::PiecePlace(PiecePlaceRequest {
            inv_item_id: Some(item.id),
            selected_position: Some(3),
        }),
        ClientAction::ShopConfirmPurchase(ShopConfirmRequest {}),
        ClientAction::BiologicalWeaponsConfirm(BioWeaponsRequest {
            selected_position_id: Some(3),
            inv_item: Some(InvItemRef {
                inv_item_id: item.id,
            }),
        }),
        ClientAction::BiologicalWeaponsConfirm(BioWeaponsRequest::default()),
    ];
    for action in &actions {
        world.send(1, action).await;
    }

    let out = world.drain();
    assert_eq!(out.len(), actions.len());
    assert!(out
        .iter()
        .all(|o| matches!(o.message, ServerMessage::UserFeedback(_))));
    let after = (
        world.snapshot(TeamId::ZERO).await,
        world.snapshot(TeamId::ONE).await,
    );
    assert_eq!(before, after);
}

#[tokio::test]
async fn inactive_and_missing_sessions_redirect() {
    let mut world = World::new(Phase::PURCHASE_CONFIRM, Slice::PLANNING).await;
    world.connect(1, TeamId::ZERO, 0);
    world
        .game
        .set_active(world.gw(), false)
        .await
        .unwrap();

    world
        .send(1, &ClientAction::ShopConfirmPurchase(ShopConfirmRequest {}))
        .await;
    assert_eq!(
        world.drain()[0].message,
        ServerMessage::ServerRedirect(RedirectTag::GameInactive)
    );

    let game = Game::load(world.gw(), &SessionKey::Id(world.game.id()))
        .await
        .unwrap();
    game.delete(world.gw()).await.unwrap();
    world
        .send(1, &ClientAction::ShopConfirmPurchase(ShopConfirmRequest {}))
        .await;
    assert_eq!(
        world.drain()[0].message,
        ServerMessage::ServerRedirect(RedirectTag::GameDoesNotExist)
    );
}

#[tokio::test]
async fn storage_outage_is_generic_feedback() {
    let mut world = World::new(Phase::PURCHASE_CONFIRM, Slice::PLANNING).await;
    world.connect(1, TeamId::ZERO, 0);
    world.gw().set_offline(true);

    world
        .send(1, &ClientAction::ShopConfirmPurchase(ShopConfirmRequest {}))
        .await;
    let out = world.drain();
    assert_eq!(out.len(), 1);
    assert!(matches!(out[0].message, ServerMessage::UserFeedback(_)));
}

#[tokio::test]
async fn reset_then_resync_matches_fresh_session() {
    let world = World::new(Phase::REINFORCEMENT_PLACEMENT, Slice::PLANNING).await;
    let fresh = world.snapshot(TeamId::ONE).await;

    let item = inv_item::all(world.gw(), world.game.id(), TeamId::ONE)
        .await
        .unwrap()
        .remove(0);
    inv_item::place_on_board(world.gw(), item.id, warroom_protocol::PositionId(150))
        .await
        .unwrap();
    let bio = inv_item::insert(
        world.gw(),
        world.game.id(),
        TeamId::ONE,
        PieceKind::BiologicalWeapons,
    )
    .await
    .unwrap();
    capability::arm(
        world.gw(),
        world.game.id(),
        TeamId::ONE,
        warroom_protocol::Capability::BiologicalWeapons,
        warroom_protocol::PositionId(3),
        bio.id,
    )
    .await
    .unwrap();
    assert_ne!(world.snapshot(TeamId::ONE).await, fresh);

    let game = Game::load(world.gw(), &SessionKey::Id(world.game.id()))
        .await
        .unwrap();
    let game = game.reset(world.gw(), &InitialSeed::default()).await.unwrap();
    assert!(!game.is_active());

    // Piece ids are reassigned by the reseed, so compare shape rather than bytes.
    let state = game
        .initial_state(world.gw(), TeamId::ONE, ControllerId::PRIMARY)
        .await
        .unwrap();
    assert_eq!(state.visible_piece_count(), 6);
    assert_eq!(state.inv_items.len(), 1);
    assert!(state.gameboard_meta.capabilities.is_empty());
    assert!(state.gameboard_meta.news.active);
    assert_eq!(state.game_info.game_phase, Phase::NEWS);
}
