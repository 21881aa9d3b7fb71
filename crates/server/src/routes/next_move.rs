use axum::{Extension, Json};
use go_core::{ensure_turn, load_game_record, Color, CoreError, RowOrigin};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::config::{Config, STRENGTH_RANGE};
use crate::engine::{self, MovePlan};
use crate::error::AppError;

#[derive(Deserialize)]
pub struct NextMoveRequest {
    pub sgf: String,
    pub color: Option<String>,
    pub strength: Option<i32>,
}

#[derive(Serialize)]
pub struct NextMoveResponse {
    /// `= <vertex>`, `= pass` or `= resign`
    #[serde(rename = "move")]
    pub mv: String,
}

/// POST /next-move
/// Ask the configured engine for a move in the position given by `sgf`.
/// The record is fully validated before any engine process is started.
pub async fn next_move(
    Extension(config): Extension<Config>,
    Json(req): Json<NextMoveRequest>,
) -> Result<Json<NextMoveResponse>, AppError> {
    let color = match req.color.as_deref() {
        None => Color::Black,
        Some(c) => c.parse().map_err(AppError::BadRequest)?,
    };

    let strength = req.strength.unwrap_or(config.default_strength);
    if !STRENGTH_RANGE.contains(&strength) {
        return Err(AppError::BadRequest(format!(
            "Strength must be between {} and {}",
            STRENGTH_RANGE.start(),
            STRENGTH_RANGE.end()
        )));
    }

    let plan = build_plan(
        &req.sgf,
        color,
        strength,
        config.row_origin,
        config.backend.infers_turn(),
    )?;
    tracing::debug!(
        size = plan.size.get(),
        plays = plan.plays.len(),
        color = %color,
        strength,
        "Move requested"
    );

    let mut rng = StdRng::from_entropy();
    let mv = engine::choose_move(&config, &plan, &mut rng).await?;

    Ok(Json(NextMoveResponse {
        mv: format!("= {mv}"),
    }))
}

/// Load the record and render every move as a vertex.
///
/// With `fix_turn` the moves are reordered so the last one belongs to the
/// opponent of `color`, for engines that read the side to move from it.
pub fn build_plan(
    sgf: &str,
    color: Color,
    strength: i32,
    origin: RowOrigin,
    fix_turn: bool,
) -> Result<MovePlan, CoreError> {
    let record = load_game_record(sgf)?;
    let moves = if fix_turn {
        ensure_turn(record.moves, color)
    } else {
        record.moves
    };

    let plays = moves
        .iter()
        .map(|m| Ok((m.color, origin.move_vertex(m, record.size)?)))
        .collect::<Result<Vec<_>, CoreError>>()?;

    Ok(MovePlan {
        size: record.size,
        color,
        strength,
        plays,
    })
}
