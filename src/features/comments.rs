// Lesson comments, like toggles and replies
// Every counter mutation commits in the same atomic unit as the child write

use serde_json::{json, Value};
use tracing::debug;

use crate::api::auth::Principal;
use crate::api::firestore::{FieldTransform, FirestoreClient, Write};
use crate::error::AppError;
use crate::models::engagement::{Comment, Reply};
use crate::utils::config::paths;
use crate::utils::ids::random_id;

/// Writes for one like toggle: the like document and the likeCount
/// increment land in the same commit, so the counter can never drift
/// from the live like documents.
pub fn like_toggle_writes(
    course_id: &str,
    lesson_id: &str,
    comment_id: &str,
    uid: &str,
    already_liked: bool,
) -> Vec<Write> {
    let like_path = paths::comment_like(course_id, lesson_id, comment_id, uid);
    let comment_path = paths::comment(course_id, lesson_id, comment_id);

    let delta = if already_liked { -1 } else { 1 };
    let counter = Write::set_with(
        comment_path,
        json!({}),
        vec![FieldTransform::Increment {
            field: "likeCount".to_string(),
            by: delta,
        }],
    );

    if already_liked {
        vec![Write::delete(like_path), counter]
    } else {
        vec![
            Write::set_with(
                like_path,
                json!({ "userId": uid }),
                vec![FieldTransform::ServerTimestamp {
                    field: "timestamp".to_string(),
                }],
            ),
            counter,
        ]
    }
}

/// Writes for appending one reply: reply document plus replyCount +1
pub fn reply_add_writes(
    course_id: &str,
    lesson_id: &str,
    comment_id: &str,
    reply_id: &str,
    fields: Value,
) -> Vec<Write> {
    vec![
        Write::set_with(
            paths::reply(course_id, lesson_id, comment_id, reply_id),
            fields,
            vec![FieldTransform::ServerTimestamp {
                field: "timestamp".to_string(),
            }],
        ),
        Write::set_with(
            paths::comment(course_id, lesson_id, comment_id),
            json!({}),
            vec![FieldTransform::Increment {
                field: "replyCount".to_string(),
                by: 1,
            }],
        ),
    ]
}

/// Writes for deleting one reply: reply document plus replyCount -1
pub fn reply_delete_writes(
    course_id: &str,
    lesson_id: &str,
    comment_id: &str,
    reply_id: &str,
) -> Vec<Write> {
    vec![
        Write::delete(paths::reply(course_id, lesson_id, comment_id, reply_id)),
        Write::set_with(
            paths::comment(course_id, lesson_id, comment_id),
            json!({}),
            vec![FieldTransform::Increment {
                field: "replyCount".to_string(),
                by: -1,
            }],
        ),
    ]
}

/// List comments for a lesson, pinned handling left to the caller,
/// newest first
pub async fn list_comments(
    store: &FirestoreClient,
    course_id: &str,
    lesson_id: &str,
) -> Result<Vec<(String, Comment)>, AppError> {
    let parent = paths::lesson(course_id, lesson_id);
    let docs = store
        .run_query(&parent, "comments", Some(("timestamp", "DESCENDING")), 200)
        .await?;

    let mut comments = Vec::with_capacity(docs.len());
    for (id, data) in docs {
        match serde_json::from_value::<Comment>(data) {
            Ok(c) => comments.push((id, c)),
            Err(err) => debug!("Skipping malformed comment {}: {}", id, err),
        }
    }
    Ok(comments)
}

/// Create a new top-level comment. Counters start at zero.
pub async fn add_comment(
    store: &FirestoreClient,
    course_id: &str,
    lesson_id: &str,
    author: &Principal,
    text: &str,
) -> Result<String, AppError> {
    let comment_id = random_id();
    let write = Write::set_with(
        paths::comment(course_id, lesson_id, &comment_id),
        json!({
            "userId": author.uid,
            "userName": author.display_name,
            "text": text,
            "isPinned": false,
            "likeCount": 0,
            "replyCount": 0,
        }),
        vec![FieldTransform::ServerTimestamp {
            field: "timestamp".to_string(),
        }],
    );
    store.commit(None, vec![write]).await?;
    Ok(comment_id)
}

/// Toggle the caller's like on a comment. The like-document read and the
/// paired writes run in one transaction because the direction depends on
/// the read. Returns whether the comment is liked after the commit.
pub async fn toggle_comment_like(
    store: &FirestoreClient,
    course_id: &str,
    lesson_id: &str,
    comment_id: &str,
    uid: &str,
) -> Result<bool, AppError> {
    let tx = store.begin_transaction().await?;

    let like_path = paths::comment_like(course_id, lesson_id, comment_id, uid);
    let already_liked = store
        .get_document_in_transaction(&tx, &like_path)
        .await?
        .is_some();

    let writes = like_toggle_writes(course_id, lesson_id, comment_id, uid, already_liked);
    store.commit(Some(&tx), writes).await?;

    Ok(!already_liked)
}

/// Append a reply. Direction is known a priori, so a batch suffices.
pub async fn add_reply(
    store: &FirestoreClient,
    course_id: &str,
    lesson_id: &str,
    comment_id: &str,
    author: &Principal,
    text: &str,
) -> Result<String, AppError> {
    let reply_id = random_id();
    let fields = json!({
        "userId": author.uid,
        "userName": author.display_name,
        "text": text,
    });
    let writes = reply_add_writes(course_id, lesson_id, comment_id, &reply_id, fields);
    store.commit(None, writes).await?;
    Ok(reply_id)
}

/// Delete a reply. Only the reply author or an admin may delete.
pub async fn delete_reply(
    store: &FirestoreClient,
    course_id: &str,
    lesson_id: &str,
    comment_id: &str,
    reply_id: &str,
    requester_uid: &str,
    requester_is_admin: bool,
) -> Result<(), AppError> {
    let reply_path = paths::reply(course_id, lesson_id, comment_id, reply_id);
    let doc = store
        .get_document(&reply_path)
        .await?
        .ok_or(AppError::NotFound("reply"))?;
    let reply: Reply =
        serde_json::from_value(doc).map_err(|e| AppError::Store(anyhow::anyhow!(e)))?;

    if reply.user_id != requester_uid && !requester_is_admin {
        return Err(AppError::PermissionDenied);
    }

    let writes = reply_delete_writes(course_id, lesson_id, comment_id, reply_id);
    store.commit(None, writes).await?;
    Ok(())
}

/// List replies for a comment, oldest first
pub async fn list_replies(
    store: &FirestoreClient,
    course_id: &str,
    lesson_id: &str,
    comment_id: &str,
) -> Result<Vec<(String, Reply)>, AppError> {
    let parent = paths::comment(course_id, lesson_id, comment_id);
    let docs = store
        .run_query(&parent, "replies", Some(("timestamp", "ASCENDING")), 200)
        .await?;

    let mut replies = Vec::with_capacity(docs.len());
    for (id, data) in docs {
        match serde_json::from_value::<Reply>(data) {
            Ok(r) => replies.push((id, r)),
            Err(err) => debug!("Skipping malformed reply {}: {}", id, err),
        }
    }
    Ok(replies)
}

/// Pin or unpin a comment (admin surface)
pub async fn set_comment_pinned(
    store: &FirestoreClient,
    course_id: &str,
    lesson_id: &str,
    comment_id: &str,
    pinned: bool,
) -> Result<(), AppError> {
    let path = paths::comment(course_id, lesson_id, comment_id);
    store
        .set_document(&path, &json!({ "isPinned": pinned }))
        .await?;
    Ok(())
}

/// Delete a comment thread root. Author or admin only.
pub async fn delete_comment(
    store: &FirestoreClient,
    course_id: &str,
    lesson_id: &str,
    comment_id: &str,
    requester_uid: &str,
    requester_is_admin: bool,
) -> Result<(), AppError> {
    let path = paths::comment(course_id, lesson_id, comment_id);
    let doc = store
        .get_document(&path)
        .await?
        .ok_or(AppError::NotFound("comment"))?;
    let comment: Comment =
        serde_json::from_value(doc).map_err(|e| AppError::Store(anyhow::anyhow!(e)))?;

    if comment.user_id != requester_uid && !requester_is_admin {
        return Err(AppError::PermissionDenied);
    }

    store.delete_document(&path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::testutil::{apply, docs_under, MemStore};

    fn seed_comment(store: &mut MemStore, comment_id: &str) {
        store.insert(
            paths::comment("c1", "l1", comment_id),
            json!({
                "userId": "author",
                "text": "great lesson",
                "isPinned": false,
                "likeCount": 0,
                "replyCount": 0,
            }),
        );
    }

    fn like_count(store: &MemStore, comment_id: &str) -> i64 {
        store[&paths::comment("c1", "l1", comment_id)]["likeCount"]
            .as_i64()
            .unwrap()
    }

    fn reply_count(store: &MemStore, comment_id: &str) -> i64 {
        store[&paths::comment("c1", "l1", comment_id)]["replyCount"]
            .as_i64()
            .unwrap()
    }

    #[test]
    fn test_like_toggle_keeps_counter_equal_to_documents() {
        let mut store = MemStore::new();
        seed_comment(&mut store, "m1");

        apply(&mut store, &like_toggle_writes("c1", "l1", "m1", "u1", false));
        apply(&mut store, &like_toggle_writes("c1", "l1", "m1", "u2", false));
        assert_eq!(like_count(&store, "m1"), 2);
        assert_eq!(
            docs_under(&store, "courses/c1/lessons/l1/comments/m1/likes/").len(),
            2
        );

        // u1 unlikes
        apply(&mut store, &like_toggle_writes("c1", "l1", "m1", "u1", true));
        assert_eq!(like_count(&store, "m1"), 1);
        assert_eq!(
            docs_under(&store, "courses/c1/lessons/l1/comments/m1/likes/").len(),
            1
        );
    }

    #[test]
    fn test_reply_counter_tracks_adds_and_deletes() {
        let mut store = MemStore::new();
        seed_comment(&mut store, "m1");

        // N = 3 adds
        for i in 0..3 {
            let id = format!("r{}", i);
            apply(
                &mut store,
                &reply_add_writes("c1", "l1", "m1", &id, json!({ "userId": "u1", "text": "x" })),
            );
        }
        // M = 1 delete
        apply(&mut store, &reply_delete_writes("c1", "l1", "m1", "r0"));

        // replyCount == N - M == live reply documents
        assert_eq!(reply_count(&store, "m1"), 2);
        assert_eq!(
            docs_under(&store, "courses/c1/lessons/l1/comments/m1/replies/").len(),
            2
        );
    }

    #[test]
    fn test_child_write_and_counter_share_one_plan() {
        // Both mutations must be inside a single atomic plan
        let writes = reply_add_writes("c1", "l1", "m1", "r1", json!({ "userId": "u1" }));
        assert_eq!(writes.len(), 2);

        let writes = like_toggle_writes("c1", "l1", "m1", "u1", true);
        assert_eq!(writes.len(), 2);
    }
}
