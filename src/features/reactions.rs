// Lesson reaction toggle
// One reaction document per (lesson, user); swaps run in a transaction

use serde_json::json;
use tracing::warn;

use crate::api::firestore::{FirestoreClient, Write};
use crate::error::AppError;
use crate::models::engagement::{Reaction, ReactionType};
use crate::utils::config::paths;

/// State transition for one toggle request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionTransition {
    Create(ReactionType),
    /// Same type re-selected: toggle off
    Remove,
    /// Other type selected: overwrite in place
    Replace(ReactionType),
}

impl ReactionTransition {
    /// The reaction state after the transition commits
    pub fn resulting(&self) -> Option<ReactionType> {
        match self {
            ReactionTransition::Create(t) | ReactionTransition::Replace(t) => Some(*t),
            ReactionTransition::Remove => None,
        }
    }
}

/// Decide what one toggle does given the current reaction document
pub fn next_reaction(existing: Option<ReactionType>, requested: ReactionType) -> ReactionTransition {
    match existing {
        None => ReactionTransition::Create(requested),
        Some(current) if current == requested => ReactionTransition::Remove,
        Some(_) => ReactionTransition::Replace(requested),
    }
}

/// The single write a transition maps to
pub fn reaction_write(
    course_id: &str,
    lesson_id: &str,
    uid: &str,
    transition: &ReactionTransition,
) -> Write {
    let path = paths::reaction(course_id, lesson_id, uid);
    match transition.resulting() {
        Some(kind) => Write::set(
            path,
            json!({
                "userId": uid,
                "type": kind,
            }),
        ),
        None => Write::delete(path),
    }
}

/// Toggle the caller's reaction on a lesson. Read and write run in one
/// transaction so concurrent toggles from the same user serialize.
/// Returns the reaction state after the commit.
pub async fn toggle_reaction(
    store: &FirestoreClient,
    course_id: &str,
    lesson_id: &str,
    uid: &str,
    requested: ReactionType,
) -> Result<Option<ReactionType>, AppError> {
    let tx = store.begin_transaction().await?;

    let path = paths::reaction(course_id, lesson_id, uid);
    let doc = store.get_document_in_transaction(&tx, &path).await?;
    let existing = doc
        .and_then(|v| serde_json::from_value::<Reaction>(v).ok())
        .map(|r| r.kind);

    let transition = next_reaction(existing, requested);
    let write = reaction_write(course_id, lesson_id, uid, &transition);

    if let Err(err) = store.commit(Some(&tx), vec![write]).await {
        warn!("reaction toggle commit failed for {}: {}", path, err);
        return Err(err.into());
    }

    Ok(transition.resulting())
}

/// Like/dislike counts derived from the live reaction collection.
/// No cached counters exist for reactions, so drift is impossible.
pub async fn reaction_counts(
    store: &FirestoreClient,
    course_id: &str,
    lesson_id: &str,
) -> Result<(i64, i64), AppError> {
    let collection = format!("{}/reactions", paths::lesson(course_id, lesson_id));
    let docs = store.list_collection(&collection).await?;

    let mut likes = 0;
    let mut dislikes = 0;
    for (_, data) in docs {
        match serde_json::from_value::<Reaction>(data) {
            Ok(r) if r.kind == ReactionType::Like => likes += 1,
            Ok(_) => dislikes += 1,
            Err(_) => {}
        }
    }

    Ok((likes, dislikes))
}
