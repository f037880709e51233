//! Board pieces and the team-scoped board view.

use std::collections::HashMap;

use warroom_protocol::{GameboardPieces, Piece, PieceContents, PieceId, SessionId, TeamId};

use crate::gateway::{Gateway, GatewayError};

/// Board as seen by `viewer`: its own pieces plus the other team's visible
/// ones, grouped by position with contents rebuilt from container links.
///
/// A piece whose container is not part of the view is not shown on its own,
/// and a containment cycle never reaches the board.
pub async fn visible_board(
    gateway: &dyn Gateway,
    session: SessionId,
    viewer: TeamId,
) -> Result<GameboardPieces, GatewayError> {
    let pieces = gateway.list_pieces(session).await?;
    Ok(assemble(pieces, viewer))
}

fn assemble(pieces: Vec<Piece>, viewer: TeamId) -> GameboardPieces {
    let mut roots = Vec::new();
    let mut children: HashMap<PieceId, Vec<PieceId>> = HashMap::new();
    let mut pool: HashMap<PieceId, Piece> = HashMap::new();

    for mut piece in pieces {
        if piece.team != viewer && !piece.visible {
            continue;
        }
        piece.contents = PieceContents::default();
        match piece.container {
            Some(container) => children.entry(container).or_default().push(piece.id),
            None => roots.push(piece.id),
        }
        pool.insert(piece.id, piece);
    }
    for ids in children.values_mut() {
        ids.sort_unstable();
    }
    roots.sort_unstable();

    let mut board = GameboardPieces::new();
    for id in roots {
        if let Some(piece) = take_tree(id, &mut pool, &children) {
            board.entry(piece.position).or_default().push(piece);
        }
    }
    board
}

fn take_tree(
    id: PieceId,
    pool: &mut HashMap<PieceId, Piece>,
    children: &HashMap<PieceId, Vec<PieceId>>,
) -> Option<Piece> {
    let mut piece = pool.remove(&id)?;
    if let Some(ids) = children.get(&id) {
        for child in ids {
            if let Some(inner) = take_tree(*child, pool, children) {
                piece.contents.pieces.push(inner);
            }
        }
    }
    Some(piece)
}
